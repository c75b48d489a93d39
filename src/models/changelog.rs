use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use url::Url;

use super::{IssueKey, User};
use crate::collection::Page;
use crate::datetime;
use crate::error::{Error, Result};

/// Issueの変更履歴1件（複数フィールドの変更をまとめたもの）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changelog {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(with = "datetime::jira_datetime")]
    pub created: DateTime<FixedOffset>,
    #[serde(default)]
    pub items: Vec<ChangelogItem>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<IssueKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogItem {
    pub field: String,
    #[serde(rename = "fieldtype")]
    pub field_type: String,
    #[serde(rename = "fieldId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "fromString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(rename = "toString")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_string: Option<String>,
}

impl Changelog {
    pub fn from_value(mut value: Value, issue_key: &IssueKey) -> Result<Self> {
        datetime::normalise_value(&mut value)?;
        let mut changelog: Changelog = serde_json::from_value(value)?;
        changelog.issue_key = Some(issue_key.clone());
        Ok(changelog)
    }

    /// 指定フィールドの変更を含むかどうか
    pub fn touches(&self, field: &str) -> bool {
        self.items.iter().any(|item| item.field == field)
    }
}

/// 1つのIssueに属する変更履歴のページ
///
/// 所属Issueはレスポンスの `self` URLから取り出す。
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogCollection {
    issue_key: IssueKey,
    page: Page<Changelog>,
}

impl ChangelogCollection {
    pub fn from_result(result: Value) -> Result<Self> {
        let self_url = result
            .get("self")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedFormat("Missing \"self\" in changelog response".to_string())
            })?;
        let issue_key = issue_key_from_self(self_url)?;

        let page = Page::from_result(result, "values", |item| {
            Changelog::from_value(item, &issue_key)
        })?;

        Ok(Self { issue_key, page })
    }

    pub fn issue_key(&self) -> &IssueKey {
        &self.issue_key
    }

    pub fn page(&self) -> &Page<Changelog> {
        &self.page
    }

    pub fn into_page(self) -> Page<Changelog> {
        self.page
    }
}

impl Deref for ChangelogCollection {
    type Target = Page<Changelog>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

// "self": "https://your-domain.atlassian.net/rest/api/3/issue/TT-1/changelog?startAt=2&maxResults=2"
fn issue_key_from_self(self_url: &str) -> Result<IssueKey> {
    let unexpected = || Error::UnexpectedFormat(format!("Unable to get IssueKey from {}", self_url));

    let url = Url::parse(self_url).map_err(|_| unexpected())?;
    let mut segments: Vec<&str> = url.path_segments().ok_or_else(unexpected)?.collect();

    if segments.pop() != Some("changelog") {
        return Err(unexpected());
    }
    let key = segments.pop().ok_or_else(unexpected)?;

    IssueKey::parse(key).map_err(|_| unexpected())
}
