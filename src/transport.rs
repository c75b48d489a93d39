use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// ダウンロード進捗コールバック（受信済みバイト数, 総バイト数）
pub type ProgressFn = dyn Fn(u64, Option<u64>) + Send + Sync;

/// クエリパラメータ（キー, 値）のスライス
pub type Query<'a> = [(&'a str, String)];

/// REST APIへのHTTPアクセスを抽象化するトレイト
///
/// パスはAPIルート（`/rest/api/{version}/`）からの相対パスで指定する。
/// `http://` / `https://` で始まる絶対URLはそのまま使用される。
/// HTTPの失敗はすべて [`crate::Error::ApiError`] もしくは
/// [`crate::Error::RequestFailed`] として返される。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value>;

    /// ボディが`None`の場合はリクエストボディを送信しない
    async fn post(&self, path: &str, body: Option<&Value>, query: &Query<'_>) -> Result<Value>;

    async fn put(&self, path: &str, body: Option<&Value>, query: &Query<'_>) -> Result<Value>;

    async fn delete(&self, path: &str, query: &Query<'_>) -> Result<()>;

    /// 複数URLを並行取得する。1件でも失敗した場合はバッチ全体が失敗する
    async fn multi_get(&self, urls: &[String]) -> Result<HashMap<String, Value>>;

    async fn download(
        &self,
        url: &str,
        target: &Path,
        progress: Option<&ProgressFn>,
    ) -> Result<()>;

    async fn upload(&self, url: &str, source: &Path) -> Result<()>;

    /// リクエスト先のREST APIバージョン（`/rest/api/{version}/`）
    fn api_version(&self) -> u8;
}
