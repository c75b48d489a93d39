#![allow(dead_code)]

use jira_rest::{Api, Auth, JiraClient, JiraConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::MockServer;

pub const API_ROOT: &str = "/rest/api/3";

/// モックサーバーに向けたクライアントを作成する
pub fn mock_client(server: &MockServer) -> JiraClient {
    let config = JiraConfig::new(
        server.uri(),
        Auth::Basic {
            username: "test@example.com".to_string(),
            api_token: "test_token".to_string(),
        },
    )
    .unwrap();
    JiraClient::new(config).unwrap()
}

pub fn mock_api(server: &MockServer) -> Api {
    Api::new(Arc::new(mock_client(server)))
}

pub fn api_path(relative: &str) -> String {
    format!("{}/{}", API_ROOT, relative)
}

/// テスト用のIssueレスポンス
pub fn issue_json(key: &str, summary: &str) -> Value {
    json!({
        "id": "10002",
        "key": key,
        "self": format!("https://your-domain.atlassian.net/rest/api/3/issue/{}", key),
        "fields": {
            "summary": summary,
            "status": {
                "id": "3",
                "name": "In Progress",
                "statusCategory": {
                    "id": 4,
                    "key": "indeterminate",
                    "name": "In Progress",
                    "colorName": "yellow"
                }
            },
            "labels": ["backend"],
            "created": "2021-01-25T06:54:07.674+0000",
            "updated": "2021-01-26T09:00:00.000+0900",
            "customfield_10010": "Sprint 1"
        }
    })
}
