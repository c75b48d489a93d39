use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Issue通知メールの内容（`POST issue/{key}/notify`）
///
/// 何も設定しなければ空のオブジェクトとして送信され、JIRAのデフォルト通知になる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "textBody")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    #[serde(rename = "htmlBody")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NotificationRecipients>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecipients {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voters: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<AccountRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(rename = "accountId")]
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub name: String,
}

impl NotificationDetails {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn to_reporter(mut self) -> Self {
        self.recipients().reporter = Some(true);
        self
    }

    pub fn to_assignee(mut self) -> Self {
        self.recipients().assignee = Some(true);
        self
    }

    pub fn to_watchers(mut self) -> Self {
        self.recipients().watchers = Some(true);
        self
    }

    pub fn to_voters(mut self) -> Self {
        self.recipients().voters = Some(true);
        self
    }

    pub fn to_user(mut self, account_id: impl Into<String>) -> Self {
        self.recipients().users.push(AccountRef {
            account_id: account_id.into(),
        });
        self
    }

    pub fn to_group(mut self, name: impl Into<String>) -> Self {
        self.recipients().groups.push(GroupRef { name: name.into() });
        self
    }

    fn recipients(&mut self) -> &mut NotificationRecipients {
        self.to.get_or_insert_with(NotificationRecipients::default)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
