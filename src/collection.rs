use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// ページング付きレスポンスの共通表現
///
/// メタデータ（`startAt` / `maxResults` / `total` / `isLast`）はサーバーの値をそのまま保持する。
/// 構築後は変更されない。
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    start_at: u64,
    max_results: u64,
    total: u64,
    is_last: bool,
    items: Vec<T>,
}

impl<T> Page<T> {
    /// レスポンスから `items_key` 配列の要素を `item` で変換してページを生成
    ///
    /// `isLast` を返さないリソース（作業ログ、検索）では `startAt + 件数 >= total` とみなす。
    pub fn from_result<F>(result: Value, items_key: &str, mut item: F) -> Result<Self>
    where
        F: FnMut(Value) -> Result<T>,
    {
        let mut object = match result {
            Value::Object(object) => object,
            other => {
                return Err(Error::UnexpectedFormat(format!(
                    "Expected a paginated object, got {}",
                    other
                )));
            }
        };

        let start_at = read_count(&object, "startAt")?;
        let max_results = read_count(&object, "maxResults")?;
        let total = read_count(&object, "total")?;

        let raw_items = match object.remove(items_key) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::UnexpectedFormat(format!(
                    "Missing \"{}\" array in paginated response",
                    items_key
                )));
            }
        };

        let items = raw_items
            .into_iter()
            .map(&mut item)
            .collect::<Result<Vec<T>>>()?;

        if items.len() as u64 > max_results {
            return Err(Error::UnexpectedFormat(format!(
                "Page holds {} items but maxResults is {}",
                items.len(),
                max_results
            )));
        }

        let is_last = match object.get("isLast") {
            Some(Value::Bool(is_last)) => *is_last,
            None | Some(Value::Null) => start_at.saturating_add(items.len() as u64) >= total,
            Some(other) => {
                return Err(Error::UnexpectedFormat(format!(
                    "\"isLast\" is not a boolean: {}",
                    other
                )));
            }
        };

        Ok(Self {
            start_at,
            max_results,
            total,
            is_last,
            items,
        })
    }

    pub fn start_at(&self) -> u64 {
        self.start_at
    }

    pub fn max_results(&self) -> u64 {
        self.max_results
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 次ページの `startAt`（最終ページなら `None`）
    pub fn next_start_at(&self) -> Option<u64> {
        if self.is_last {
            None
        } else {
            Some(self.start_at.saturating_add(self.items.len() as u64))
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn read_count(object: &Map<String, Value>, key: &str) -> Result<u64> {
    object.get(key).and_then(Value::as_u64).ok_or_else(|| {
        Error::UnexpectedFormat(format!(
            "Missing or invalid \"{}\" in paginated response",
            key
        ))
    })
}
