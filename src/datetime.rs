use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, TimeZone, Timelike};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// JIRAへ送信する日時フォーマット（例: `2021-01-25T06:54:07.000+0000`）
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000%z";

const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// 正規化対象の日時キー
pub const DATE_FIELDS: [&str; 6] = [
    "created",
    "started",
    "updated",
    "createdAt",
    "startedAt",
    "updatedAt",
];

/// JIRAの日時文字列をパース
///
/// `+0000` / `-0500` / `+00:00` / `Z` のオフセットを受け付ける。
/// オフセットがない場合はエラー。秒未満は切り捨てる。
pub fn parse_date_time(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    let parsed = if trimmed.ends_with('Z') || trimmed.ends_with('z') {
        DateTime::parse_from_rfc3339(trimmed)
    } else {
        DateTime::parse_from_str(trimmed, PARSE_FORMAT)
    };

    let parsed = parsed.map_err(|e| Error::DateTimeParse {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    parsed.with_nanosecond(0).ok_or_else(|| Error::DateTimeParse {
        value: value.to_string(),
        message: "cannot truncate fractional seconds".to_string(),
    })
}

/// JIRA送信用にフォーマット
///
/// 0時ちょうどの場合は同日の12時に置き換える（JIRA側のタイムゾーン処理で翌日にずれるため）。
pub fn format_for_wire<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let fixed = dt.with_timezone(&dt.offset().fix());
    let fixed = if fixed.hour() == 0 && fixed.minute() == 0 && fixed.second() == 0 {
        fixed.with_hour(12).unwrap_or(fixed)
    } else {
        fixed
    };

    fixed.format(WIRE_FORMAT).to_string()
}

/// 正規化後の表現（RFC 3339、秒精度、コロン付きオフセット）
pub fn to_canonical<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&dt.offset().fix())
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn normalise_date(value: &str) -> Result<String> {
    parse_date_time(value).map(|dt| to_canonical(&dt))
}

/// 既知の日時キーの値を正規化表現に置き換える
pub fn normalise_date_fields(item: &mut Map<String, Value>) -> Result<()> {
    for field in DATE_FIELDS {
        match item.get_mut(field) {
            Some(Value::String(raw)) => {
                *raw = normalise_date(raw)?;
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(Error::DateTimeParse {
                    value: other.to_string(),
                    message: format!("\"{}\" is not a string", field),
                });
            }
        }
    }

    Ok(())
}

/// オブジェクトであれば日時キーを正規化する
pub fn normalise_value(item: &mut Value) -> Result<()> {
    match item.as_object_mut() {
        Some(map) => normalise_date_fields(map),
        None => Ok(()),
    }
}

fn normalise_each(items: Option<&mut Value>) -> Result<()> {
    if let Some(Value::Array(items)) = items {
        for item in items.iter_mut() {
            normalise_value(item)?;
        }
    }
    Ok(())
}

/// Issue表現全体（添付・コメント・作業ログ・親Issueを含む）の日時を正規化
pub fn normalise_issue(issue: &mut Value) -> Result<()> {
    let Some(fields) = issue.get_mut("fields").and_then(Value::as_object_mut) else {
        return Ok(());
    };

    normalise_each(fields.get_mut("attachment"))?;
    if let Some(comment) = fields.get_mut("comment") {
        normalise_each(comment.get_mut("comments"))?;
    }
    if let Some(worklog) = fields.get_mut("worklog") {
        normalise_each(worklog.get_mut("worklogs"))?;
    }
    if let Some(parent) = fields.get_mut("parent") {
        normalise_value(parent)?;
        if let Some(parent_fields) = parent.get_mut("fields") {
            normalise_value(parent_fields)?;
        }
    }

    normalise_date_fields(fields)
}

/// JIRA形式・正規化形式どちらの文字列も受け付けるserdeヘルパー
pub mod jira_datetime {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_canonical(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date_time(&raw).map_err(serde::de::Error::custom)
    }
}

pub mod jira_datetime_option {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&super::to_canonical(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_date_time(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
