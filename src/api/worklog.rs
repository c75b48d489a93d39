use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::issue_path;
use crate::collection::Page;
use crate::error::{Error, Result};
use crate::models::{CommentFormat, Worklog};
use crate::transport::Transport;

/// 残り見積もりはJIRA側で自動調整する
const ADJUST_ESTIMATE: (&str, &str) = ("adjustEstimate", "auto");

#[derive(Clone)]
pub struct WorklogApi {
    transport: Arc<dyn Transport>,
}

impl WorklogApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn comment_format(&self) -> CommentFormat {
        CommentFormat::for_api_version(self.transport.api_version())
    }

    /// 作業ログを登録し、サーバーが採番した作業ログを返す
    #[instrument(skip(self, worklog), fields(issue = %worklog.issue_identifier()))]
    pub async fn create(&self, worklog: &Worklog) -> Result<Worklog> {
        let body = worklog.to_request_body(self.comment_format());
        let result = self
            .transport
            .post(
                &format!("{}/worklog", issue_path(worklog.issue_identifier())),
                Some(&body),
                &adjust_estimate(),
            )
            .await?;

        let created = Worklog::from_value(result, worklog.issue_identifier())?;
        debug!(id = created.id(), "Worklog created");
        Ok(created)
    }

    #[instrument(skip(self, worklog), fields(issue = %worklog.issue_identifier()))]
    pub async fn update(&self, worklog: &Worklog) -> Result<Worklog> {
        let body = worklog.to_request_body(self.comment_format());
        let result = self
            .transport
            .put(&worklog_path(worklog)?, Some(&body), &adjust_estimate())
            .await?;

        Worklog::from_value(result, worklog.issue_identifier())
    }

    #[instrument(skip(self, worklog), fields(issue = %worklog.issue_identifier()))]
    pub async fn delete(&self, worklog: &Worklog) -> Result<()> {
        self.transport
            .delete(&worklog_path(worklog)?, &adjust_estimate())
            .await
    }

    /// Issueの作業ログ一覧（1ページ分）
    #[instrument(skip(self))]
    pub async fn list_for_issue(
        &self,
        issue_identifier: &str,
        start_at: u64,
        max_results: u64,
    ) -> Result<Page<Worklog>> {
        let query = [
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        let result = self
            .transport
            .get(&format!("{}/worklog", issue_path(issue_identifier)), &query)
            .await?;

        Page::from_result(result, "worklogs", |item| {
            Worklog::from_value(item, issue_identifier)
        })
    }

    /// 作業ログIDを指定して複数件取得する（Issueをまたいでもよい）
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn retrieve_many(&self, ids: &[u64]) -> Result<Vec<Worklog>> {
        let body = json!({ "ids": ids });
        let result = self
            .transport
            .post(
                "worklog/list",
                Some(&body),
                &[("expand", "properties".to_string())],
            )
            .await?;

        match result {
            Value::Array(items) => items.into_iter().map(Worklog::from_listing).collect(),
            other => Err(Error::UnexpectedFormat(format!(
                "Expected a worklog array, got {}",
                other
            ))),
        }
    }
}

fn adjust_estimate() -> [(&'static str, String); 1] {
    [(ADJUST_ESTIMATE.0, ADJUST_ESTIMATE.1.to_string())]
}

fn worklog_path(worklog: &Worklog) -> Result<String> {
    let id = worklog.id().ok_or_else(|| {
        Error::InvalidInput(format!(
            "Worklog on {} has no id",
            worklog.issue_identifier()
        ))
    })?;

    Ok(format!(
        "{}/worklog/{}",
        issue_path(worklog.issue_identifier()),
        urlencoding::encode(id)
    ))
}
