use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::IssueKey;
use crate::error::{Error, Result};

/// 編集画面で更新可能なフィールドの一覧（`GET issue/{key}/editmeta`）
#[derive(Debug, Clone, PartialEq)]
pub struct EditMeta {
    issue_key: IssueKey,
    fields: Vec<FieldMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// `fields` マップのキー（フィールドID）
    #[serde(skip_deserializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<FieldSchema>,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(rename = "allowedValues")]
    #[serde(default)]
    pub allowed_values: Vec<Value>,
    #[serde(rename = "autoCompleteUrl")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete_url: Option<String>,
    #[serde(rename = "hasDefaultValue")]
    #[serde(default)]
    pub has_default_value: bool,
    #[serde(rename = "defaultValue")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    #[serde(rename = "customId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<u64>,
}

impl FieldMeta {
    /// 指定した更新操作（add/set/edit/remove）が許可されているか
    pub fn supports(&self, operation: &str) -> bool {
        self.operations.iter().any(|op| op == operation)
    }
}

impl EditMeta {
    pub fn from_value(value: Value, issue_key: IssueKey) -> Result<Self> {
        let fields = match value.get("fields") {
            Some(Value::Object(fields)) => fields
                .iter()
                .map(|(id, raw)| -> Result<FieldMeta> {
                    let mut field: FieldMeta = serde_json::from_value(raw.clone())?;
                    field.id = id.clone();
                    Ok(field)
                })
                .collect::<Result<Vec<_>>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(Error::UnexpectedFormat(format!(
                    "\"fields\" in edit metadata is not an object: {}",
                    other
                )));
            }
        };

        Ok(Self { issue_key, fields })
    }

    pub fn issue_key(&self) -> &IssueKey {
        &self.issue_key
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|field| field.id == id)
    }
}
