pub mod issue;
pub mod search;
pub mod transitions;
pub mod worklog;

pub use issue::IssueApi;
pub use search::SearchApi;
pub use transitions::{TransitionQuery, TransitionsApi};
pub use worklog::WorklogApi;

use std::sync::Arc;

use crate::transport::Transport;

/// REST APIの入口
///
/// 各ファサードは呼び出しごとに生成され、同じトランスポートを共有する。
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
}

impl Api {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn issue(&self) -> IssueApi {
        IssueApi::new(Arc::clone(&self.transport))
    }

    pub fn transitions(&self) -> TransitionsApi {
        TransitionsApi::new(Arc::clone(&self.transport))
    }

    pub fn worklog(&self) -> WorklogApi {
        WorklogApi::new(Arc::clone(&self.transport))
    }

    pub fn search(&self) -> SearchApi {
        SearchApi::new(Arc::clone(&self.transport))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

/// `issue/{identifier}` 形式のパス（識別子はパーセントエンコードする）
pub(crate) fn issue_path(identifier: &str) -> String {
    format!("issue/{}", urlencoding::encode(identifier))
}

pub(crate) fn flag(value: bool) -> String {
    let flag = if value { "true" } else { "false" };
    flag.to_string()
}
