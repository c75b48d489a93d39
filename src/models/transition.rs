use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Status;
use crate::error::Result;

/// Issueのステータス遷移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    /// 遷移先ステータス
    pub to: Status,
    #[serde(rename = "hasScreen")]
    #[serde(default)]
    pub has_screen: bool,
    #[serde(rename = "isGlobal")]
    #[serde(default)]
    pub is_global: bool,
    #[serde(rename = "isInitial")]
    #[serde(default)]
    pub is_initial: bool,
    #[serde(rename = "isAvailable")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(rename = "isConditional")]
    #[serde(default)]
    pub is_conditional: bool,
    /// `expand=transitions.fields` 時の遷移画面フィールド
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

impl Transition {
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_status(&self) -> &Status {
        &self.to
    }
}
