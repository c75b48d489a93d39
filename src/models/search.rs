use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchParams {
    #[serde(rename = "startAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u32>,

    #[serde(rename = "maxResults")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,

    #[serde(rename = "validateQuery")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_query: Option<bool>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(mut self, start_at: u32) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn expand(mut self, expand: Vec<String>) -> Self {
        self.expand = Some(expand);
        self
    }

    pub fn properties(mut self, properties: Vec<String>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn validate_query(mut self, validate: bool) -> Self {
        self.validate_query = Some(validate);
        self
    }

    /// `POST search` のリクエストボディ（未設定の項目は送信しない）
    pub fn to_body(&self, jql: &str) -> Result<Value> {
        let mut body = serde_json::to_value(self)?;
        body["jql"] = Value::String(jql.to_string());
        Ok(body)
    }
}
