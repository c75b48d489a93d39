use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::IssueType;
use crate::error::Result;

/// 作成可能なプロジェクトとIssueタイプ（`GET issue/createmeta`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMeta {
    #[serde(default)]
    pub projects: Vec<CreateMetaProject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMetaProject {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(rename = "issuetypes")]
    #[serde(default)]
    pub issue_types: Vec<IssueType>,
}

impl CreateMeta {
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn project(&self, key: &str) -> Option<&CreateMetaProject> {
        self.projects.iter().find(|project| project.key == key)
    }
}

impl CreateMetaProject {
    pub fn issue_type(&self, name: &str) -> Option<&IssueType> {
        self.issue_types.iter().find(|issue_type| issue_type.name == name)
    }
}
