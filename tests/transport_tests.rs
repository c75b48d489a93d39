mod common;

use common::{api_path, mock_client};
use jira_rest::{Auth, Error, JiraClient, JiraConfig, ProgressFn, Transport};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("myself")))
        .and(header(
            "Authorization",
            "Basic dGVzdEBleGFtcGxlLmNvbTp0ZXN0X3Rva2Vu",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountId": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = mock_client(&server).get("myself", &[]).await.unwrap();

    assert_eq!(result["accountId"], "abc");
}

#[tokio::test]
async fn test_api_version_changes_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/2/serverInfo"))
        .and(header("Authorization", "Bearer personal-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "9.12.0"})))
        .mount(&server)
        .await;

    let config = JiraConfig::new(
        server.uri(),
        Auth::Bearer {
            token: "personal-token".to_string(),
        },
    )
    .unwrap()
    .with_api_version(2);
    let client = JiraClient::new(config).unwrap();

    let result = client.get("serverInfo", &[]).await.unwrap();

    assert_eq!(result["version"], "9.12.0");
}

#[tokio::test]
async fn test_post_returns_array_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("worklog/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}, {"id": "2"}])))
        .mount(&server)
        .await;

    let body = json!({"ids": [1, 2]});
    let result = mock_client(&server)
        .post("worklog/list", Some(&body), &[])
        .await
        .unwrap();

    assert_eq!(result.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_multi_get_returns_every_response() {
    // Given: 3つのリソースを返すモックサーバー
    let server = MockServer::start().await;
    for id in ["10000", "10001", "10002"] {
        Mock::given(method("GET"))
            .and(path(api_path(&format!("project/{}", id))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let urls: Vec<String> = ["10000", "10001", "10002"]
        .iter()
        .map(|id| format!("project/{}", id))
        .collect();

    // When: 並行取得
    let results = mock_client(&server).multi_get(&urls).await.unwrap();

    // Then: URLごとにレスポンスが得られる
    assert_eq!(results.len(), 3);
    for url in &urls {
        let id = url.trim_start_matches("project/");
        assert_eq!(results[url]["id"], id);
    }
}

#[tokio::test]
async fn test_multi_get_fails_whole_batch() {
    // Given: 1件だけ失敗するリソース
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("project/ok")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("project/broken")))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let urls = vec!["project/ok".to_string(), "project/broken".to_string()];

    // When: 並行取得
    let result = mock_client(&server).multi_get(&urls).await;

    // Then: 部分的な結果は返されず、失敗したURLが報告される
    match result {
        Err(Error::BatchFailed { failed }) => {
            assert_eq!(failed, vec!["project/broken".to_string()]);
        }
        other => panic!("Expected BatchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_streams_to_file_with_progress() {
    let server = MockServer::start().await;
    let contents = vec![b'x'; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/secure/attachment/10000/report.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(contents.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("report.txt");
    let reported: Arc<Mutex<Vec<(u64, Option<u64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let progress = move |downloaded: u64, total: Option<u64>| {
        sink.lock().unwrap().push((downloaded, total));
    };
    let progress: &ProgressFn = &progress;

    let url = format!("{}/secure/attachment/10000/report.txt", server.uri());
    mock_client(&server)
        .download(&url, &target, Some(progress))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), contents);
    let reported = reported.lock().unwrap();
    assert!(!reported.is_empty());
    assert_eq!(reported.last().map(|(downloaded, _)| *downloaded), Some(64 * 1024));
    assert!(reported.windows(2).all(|pair| pair[0].0 < pair[1].0));
}

#[tokio::test]
async fn test_download_failure_creates_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure/attachment/404/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("missing.txt");
    let url = format!("{}/secure/attachment/404/missing.txt", server.uri());

    let result = mock_client(&server).download(&url, &target, None).await;

    assert_eq!(result.unwrap_err().status(), Some(404));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_cut_off_midway_leaves_no_file() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Given: 100バイトと宣言しながら10バイトで接続を切るサーバー
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let config = JiraConfig::new(
        format!("http://{}", addr),
        Auth::Basic {
            username: "test@example.com".to_string(),
            api_token: "test_token".to_string(),
        },
    )
    .unwrap();
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("truncated.bin");
    let url = format!("http://{}/secure/attachment/1/truncated.bin", addr);

    // When: ダウンロード
    let result = JiraClient::new(config)
        .unwrap()
        .download(&url, &target, None)
        .await;

    // Then: 失敗し、書きかけのファイルは削除されている
    assert!(result.is_err());
    assert!(!target.exists());
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("issue/DEV-1/attachments")))
        .and(header("X-Atlassian-Token", "no-check"))
        .and(header_exists("Content-Type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("notes.txt");
    std::fs::write(&source, "release notes").unwrap();

    let result = mock_client(&server)
        .upload("issue/DEV-1/attachments", &source)
        .await;
    tokio_test::assert_ok!(result);

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("release notes"));
}
