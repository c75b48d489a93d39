use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Issueキー（例: `PROJ-123`）
///
/// プロジェクトキー（英大文字で始まり、英大文字・数字・`_` が続く）、`-`、数値IDで構成される。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidIssueKey(raw.to_string());

        let (project, number) = raw.rsplit_once('-').ok_or_else(invalid)?;

        let mut chars = project.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
        let valid_project = starts_with_letter
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        let valid_number = !number.is_empty()
            && number.chars().all(|c| c.is_ascii_digit())
            && number.parse::<u64>().is_ok();

        if valid_project && valid_number {
            Ok(Self(raw.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn project_key(&self) -> &str {
        self.0.rsplit_once('-').map(|(project, _)| project).unwrap_or(&self.0)
    }

    pub fn number(&self) -> u64 {
        self.0
            .rsplit_once('-')
            .and_then(|(_, number)| number.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IssueKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IssueKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
