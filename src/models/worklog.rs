use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::User;
use crate::datetime::{self, format_for_wire};
use crate::error::{Error, Result};

/// Issueへの作業記録
///
/// 送信前にクライアント側で作成するか、APIレスポンスから復元する。
/// 値オブジェクトなので変更は `with_*` で新しいインスタンスを作る。
#[derive(Debug, Clone, PartialEq)]
pub struct Worklog {
    issue_identifier: String,
    id: Option<String>,
    author: Option<User>,
    comment: Option<String>,
    started: DateTime<FixedOffset>,
    time_spent_seconds: u64,
    created: Option<DateTime<FixedOffset>>,
    updated: Option<DateTime<FixedOffset>>,
}

/// 作業ログコメントの送信形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFormat {
    PlainText,
    /// Atlassian Document Format
    Adf,
}

impl CommentFormat {
    /// REST API v3以降はADFのみ受け付ける
    pub fn for_api_version(api_version: u8) -> Self {
        if api_version >= 3 {
            CommentFormat::Adf
        } else {
            CommentFormat::PlainText
        }
    }
}

#[derive(Deserialize)]
struct WorklogRecord {
    id: Option<String>,
    #[serde(rename = "issueId")]
    issue_id: Option<String>,
    author: Option<User>,
    comment: Option<Value>,
    #[serde(with = "datetime::jira_datetime")]
    started: DateTime<FixedOffset>,
    #[serde(rename = "timeSpentSeconds")]
    time_spent_seconds: u64,
    #[serde(default, with = "datetime::jira_datetime_option")]
    created: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "datetime::jira_datetime_option")]
    updated: Option<DateTime<FixedOffset>>,
}

impl Worklog {
    pub fn new(
        issue_identifier: impl Into<String>,
        started: DateTime<FixedOffset>,
        time_spent_seconds: u64,
    ) -> Self {
        Self {
            issue_identifier: issue_identifier.into(),
            id: None,
            author: None,
            comment: None,
            started,
            time_spent_seconds,
            created: None,
            updated: None,
        }
    }

    /// APIレスポンスから作業ログを復元
    pub fn from_value(value: Value, issue_identifier: impl Into<String>) -> Result<Self> {
        let record = Self::record(value)?;
        Ok(Self::from_record(record, issue_identifier.into()))
    }

    /// レスポンス内の `issueId` を識別子として作業ログを復元（`worklog/list` 用）
    pub fn from_listing(value: Value) -> Result<Self> {
        let record = Self::record(value)?;
        let issue_id = record
            .issue_id
            .clone()
            .ok_or_else(|| Error::UnexpectedFormat("Worklog record without issueId".to_string()))?;
        Ok(Self::from_record(record, issue_id))
    }

    fn record(mut value: Value) -> Result<WorklogRecord> {
        datetime::normalise_value(&mut value)?;
        Ok(serde_json::from_value(value)?)
    }

    fn from_record(record: WorklogRecord, issue_identifier: String) -> Self {
        Self {
            issue_identifier,
            id: record.id,
            author: record.author,
            comment: record.comment.as_ref().and_then(comment_text),
            started: record.started,
            time_spent_seconds: record.time_spent_seconds,
            created: record.created,
            updated: record.updated,
        }
    }

    /// 作成・更新リクエストのボディ
    ///
    /// コメントは `format` に従い、プレーンテキスト（v2）またはADFドキュメント（v3）で送信する。
    pub fn to_request_body(&self, format: CommentFormat) -> Value {
        let mut body = Map::new();
        if let Some(comment) = &self.comment {
            let comment = match format {
                CommentFormat::PlainText => Value::String(comment.clone()),
                CommentFormat::Adf => adf_document(comment),
            };
            body.insert("comment".to_string(), comment);
        }
        body.insert(
            "started".to_string(),
            Value::String(format_for_wire(&self.started)),
        );
        body.insert(
            "timeSpentSeconds".to_string(),
            Value::from(self.time_spent_seconds),
        );
        Value::Object(body)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_started(mut self, started: DateTime<FixedOffset>) -> Self {
        self.started = started;
        self
    }

    pub fn with_time_spent_seconds(mut self, seconds: u64) -> Self {
        self.time_spent_seconds = seconds;
        self
    }

    pub fn issue_identifier(&self) -> &str {
        &self.issue_identifier
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn author(&self) -> Option<&User> {
        self.author.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn started(&self) -> DateTime<FixedOffset> {
        self.started
    }

    pub fn time_spent_seconds(&self) -> u64 {
        self.time_spent_seconds
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        self.created
    }

    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        self.updated
    }
}

/// コメントは文字列（v2）またはADFドキュメント（v3）
fn comment_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(_) => Some(adf_text(value)),
        _ => None,
    }
}

/// 1行を1段落とするADFドキュメント
fn adf_document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .split('\n')
        .map(|line| {
            let content = if line.is_empty() {
                Vec::new()
            } else {
                vec![json!({ "type": "text", "text": line })]
            };
            json!({ "type": "paragraph", "content": content })
        })
        .collect();

    json!({ "type": "doc", "version": 1, "content": paragraphs })
}

fn adf_text(node: &Value) -> String {
    let node_type = node.get("type").and_then(Value::as_str);
    if node_type == Some("hardBreak") {
        return "\n".to_string();
    }
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return text.to_string();
    }

    let Some(children) = node.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    let separator = if node_type == Some("doc") { "\n" } else { "" };

    children
        .iter()
        .map(adf_text)
        .collect::<Vec<_>>()
        .join(separator)
}
