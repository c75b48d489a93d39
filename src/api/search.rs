use std::sync::Arc;
use tracing::{debug, instrument};

use crate::collection::Page;
use crate::error::Result;
use crate::models::{Issue, SearchParams};
use crate::transport::Transport;

#[derive(Clone)]
pub struct SearchApi {
    transport: Arc<dyn Transport>,
}

impl SearchApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// JQLでIssueを検索
    #[instrument(skip(self, params), fields(jql = %jql))]
    pub async fn search(&self, jql: &str, params: SearchParams) -> Result<Page<Issue>> {
        let body = params.to_body(jql)?;
        let result = self.transport.post("search", Some(&body), &[]).await?;

        let page = Page::from_result(result, "issues", Issue::from_value)?;
        debug!("Found {} issues (total: {})", page.len(), page.total());
        Ok(page)
    }
}
