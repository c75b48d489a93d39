use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{flag, issue_path};
use crate::error::{Error, Result};
use crate::models::{IssueKey, Transition};
use crate::transport::Transport;
use crate::update_data::UpdateData;

/// `GET issue/{key}/transitions` の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionQuery {
    pub transition_id: Option<String>,
    pub skip_remote_only_condition: bool,
    pub include_unavailable_transitions: bool,
    pub sort_by_ops_bar_and_status: bool,
}

impl TransitionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transition_id(mut self, transition_id: impl Into<String>) -> Self {
        self.transition_id = Some(transition_id.into());
        self
    }

    pub fn skip_remote_only_condition(mut self, skip: bool) -> Self {
        self.skip_remote_only_condition = skip;
        self
    }

    pub fn include_unavailable_transitions(mut self, include: bool) -> Self {
        self.include_unavailable_transitions = include;
        self
    }

    pub fn sort_by_ops_bar_and_status(mut self, sort: bool) -> Self {
        self.sort_by_ops_bar_and_status = sort;
        self
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("expand", "*all".to_string())];
        if let Some(id) = &self.transition_id {
            query.push(("transitionId", id.clone()));
        }
        query.push(("skipRemoteOnlyCondition", flag(self.skip_remote_only_condition)));
        query.push((
            "includeUnavailableTransitions",
            flag(self.include_unavailable_transitions),
        ));
        query.push(("sortByOpsBarAndStatus", flag(self.sort_by_ops_bar_and_status)));
        query
    }
}

#[derive(Clone)]
pub struct TransitionsApi {
    transport: Arc<dyn Transport>,
}

impl TransitionsApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, query), fields(issue_key = %key))]
    pub async fn list_for_issue(&self, key: &IssueKey, query: TransitionQuery) -> Result<Vec<Transition>> {
        let mut result = self
            .transport
            .get(
                &format!("{}/transitions", issue_path(key.as_str())),
                &query.to_query(),
            )
            .await?;

        let transitions = match result.get_mut("transitions").map(Value::take) {
            Some(Value::Array(transitions)) => transitions,
            _ => {
                return Err(Error::UnexpectedFormat(
                    "Missing \"transitions\" array in response".to_string(),
                ));
            }
        };

        let transitions = transitions
            .into_iter()
            .map(Transition::from_value)
            .collect::<Result<Vec<_>>>()?;
        debug!("Found {} transitions", transitions.len());
        Ok(transitions)
    }

    /// 遷移を実行する（`data` に遷移が設定されている必要がある）
    #[instrument(skip(self, data), fields(issue_key = %key))]
    pub async fn perform(&self, key: &IssueKey, data: &UpdateData) -> Result<()> {
        let transition_id = data.transition_id().ok_or_else(|| {
            Error::InvalidInput("Update data has no transition to perform".to_string())
        })?;
        debug!(transition_id, "Performing transition");

        let body = data.render();
        self.transport
            .post(
                &format!("{}/transitions", issue_path(key.as_str())),
                Some(&body),
                &[],
            )
            .await?;
        Ok(())
    }
}
