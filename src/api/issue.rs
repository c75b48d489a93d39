use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{flag, issue_path};
use crate::error::{Error, Result};
use crate::models::{ChangelogCollection, CreateMeta, EditMeta, Issue, IssueKey, NotificationDetails};
use crate::transport::Transport;
use crate::update_data::UpdateData;

/// Issue単位の操作
#[derive(Clone)]
pub struct IssueApi {
    transport: Arc<dyn Transport>,
}

impl IssueApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn retrieve(&self, key: &IssueKey) -> Result<Issue> {
        let result = self.transport.get(&issue_path(key.as_str()), &[]).await?;
        let issue = Issue::from_value(result)?;
        debug!("Fetched issue: {}", issue.key);
        Ok(issue)
    }

    /// 複数Issueを並行取得する（1件でも失敗したら全体が失敗）
    #[instrument(skip(self, keys), fields(count = keys.len()))]
    pub async fn retrieve_many(&self, keys: &[IssueKey]) -> Result<Vec<Issue>> {
        let paths: Vec<String> = keys.iter().map(|key| issue_path(key.as_str())).collect();
        let results = self.transport.multi_get(&paths).await?;

        // 重複したキーは同じ応答を共有する
        paths
            .iter()
            .map(|path| {
                let result = results.get(path).cloned().ok_or_else(|| {
                    Error::UnexpectedFormat(format!("No response for {}", path))
                })?;
                Issue::from_value(result)
            })
            .collect()
    }

    /// 更新を送信し、更新後のIssueを取得し直す
    ///
    /// `notify_users` がオフの場合は `notifyUsers=false` を付けて送信する。
    #[instrument(skip(self, data), fields(issue_key = %key))]
    pub async fn update(&self, key: &IssueKey, data: &UpdateData) -> Result<Issue> {
        let body = data.render();
        let query: Vec<(&str, String)> = if data.notify_users() {
            Vec::new()
        } else {
            vec![("notifyUsers", flag(false))]
        };

        self.transport
            .put(&issue_path(key.as_str()), Some(&body), &query)
            .await?;
        debug!("Issue updated, fetching current state");

        self.retrieve(key).await
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn remove(&self, key: &IssueKey) -> Result<()> {
        self.transport.delete(&issue_path(key.as_str()), &[]).await
    }

    /// サブタスクごと削除
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn remove_with_subtasks(&self, key: &IssueKey) -> Result<()> {
        self.transport
            .delete(&issue_path(key.as_str()), &[("deleteSubtasks", flag(true))])
            .await
    }

    /// 担当者を設定する。`None` の場合は担当者を外す
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn assign(&self, key: &IssueKey, account_id: Option<&str>) -> Result<()> {
        let body = json!({ "accountId": account_id });
        self.transport
            .put(&format!("{}/assignee", issue_path(key.as_str())), Some(&body), &[])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn change_logs(
        &self,
        key: &IssueKey,
        start_at: u64,
        max_results: u64,
    ) -> Result<ChangelogCollection> {
        let query = [
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        let result = self
            .transport
            .get(&format!("{}/changelog", issue_path(key.as_str())), &query)
            .await?;

        let collection = ChangelogCollection::from_result(result)?;
        if collection.issue_key() != key {
            return Err(Error::UnexpectedFormat(format!(
                "Changelog belongs to {} instead of {}",
                collection.issue_key(),
                key
            )));
        }

        debug!(
            "Fetched {} changelogs (total: {})",
            collection.len(),
            collection.total()
        );
        Ok(collection)
    }

    #[instrument(skip(self, details), fields(issue_key = %key))]
    pub async fn notify(&self, key: &IssueKey, details: &NotificationDetails) -> Result<()> {
        let body = details.to_value()?;
        self.transport
            .post(&format!("{}/notify", issue_path(key.as_str())), Some(&body), &[])
            .await?;
        Ok(())
    }

    /// 作成用メタデータ。`with_fields` が真ならIssueタイプごとのフィールドも展開する
    #[instrument(skip(self))]
    pub async fn create_meta(&self, project_keys: &[&str], with_fields: bool) -> Result<CreateMeta> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if !project_keys.is_empty() {
            query.push(("projectKeys", project_keys.join(",")));
        }
        if with_fields {
            query.push(("expand", "projects.issuetypes.fields".to_string()));
        }

        let result = self.transport.get("issue/createmeta", &query).await?;
        CreateMeta::from_value(result)
    }

    /// 編集用メタデータ（フラグは真の場合のみ送信）
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn edit_meta(
        &self,
        key: &IssueKey,
        override_screen_security: bool,
        override_editable_flag: bool,
    ) -> Result<EditMeta> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if override_screen_security {
            query.push(("overrideScreenSecurity", flag(true)));
        }
        if override_editable_flag {
            query.push(("overrideEditableFlag", flag(true)));
        }

        let result: Value = self
            .transport
            .get(&format!("{}/editmeta", issue_path(key.as_str())), &query)
            .await?;
        EditMeta::from_value(result, key.clone())
    }
}
