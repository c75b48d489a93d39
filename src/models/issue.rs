use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::{IssueKey, IssueType, Priority, Status, User};
use crate::datetime;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: IssueKey,
    #[serde(rename = "self")]
    pub self_url: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>, // 文字列またはADF形式のオブジェクト
    #[serde(rename = "issuetype")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, with = "datetime::jira_datetime_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "datetime::jira_datetime_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<FixedOffset>>,
    #[serde(rename = "resolutiondate")]
    #[serde(default, with = "datetime::jira_datetime_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    // カスタムフィールドは動的に追加
    #[serde(flatten)]
    pub custom_fields: HashMap<String, Value>,
}

impl Issue {
    /// APIレスポンスからIssueを生成（日時フィールドは正規化してから読み込む）
    pub fn from_value(mut value: Value) -> Result<Self> {
        datetime::normalise_issue(&mut value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn summary(&self) -> Option<&str> {
        self.fields.summary.as_deref()
    }

    pub fn status_name(&self) -> Option<&str> {
        self.fields.status.as_ref().map(|status| status.name.as_str())
    }

    pub fn custom_field(&self, field_id: &str) -> Option<&Value> {
        self.fields.custom_fields.get(field_id)
    }
}
