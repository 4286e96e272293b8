//! Integration tests for the memo server client against a mock server.
//!
//! These verify request shapes (paths, bearer header, bodies) and the
//! normalization of the response variants servers send back.

use quickmemo_client::{ClientConfig, MemosClient};
use quickmemo_core::{Credentials, Error, FilePayload, MemoService, ResourceRef, Visibility};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> MemosClient {
    MemosClient::new(ClientConfig {
        timeout_seconds: 5,
        multipart_uploads: true,
        ..Default::default()
    })
    .expect("Failed to create client")
}

fn creds(server: &MockServer) -> Credentials {
    // Trailing slash as users usually paste it
    Credentials::new(format!("{}/", server.uri()), "test-token")
}

#[tokio::test]
async fn test_create_memo_sends_bearer_and_visibility() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memos"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({ "content": "hello\n", "visibility": "PROTECTED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "memos/abc",
            "content": "hello\n",
            "visibility": "PROTECTED"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let memo = client()
        .create_memo(&creds(&mock_server), "hello\n", Visibility::Protected)
        .await
        .expect("create should succeed");

    assert_eq!(memo.name, "memos/abc");
    assert_eq!(memo.visibility, Some(Visibility::Protected));
}

#[tokio::test]
async fn test_create_memo_legacy_id_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memos"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 42 } })),
        )
        .mount(&mock_server)
        .await;

    let memo = client()
        .create_memo(&creds(&mock_server), "x", Visibility::Public)
        .await
        .unwrap();

    assert_eq!(memo.name, "memos/42");
}

#[tokio::test]
async fn test_create_memo_without_identity_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "x" })))
        .mount(&mock_server)
        .await;

    let err = client()
        .create_memo(&creds(&mock_server), "x", Visibility::Public)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memos"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/resources"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let c = client();
    let creds = creds(&mock_server);

    let err = c.create_memo(&creds, "x", Visibility::Public).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "got {:?}", err);

    let file = FilePayload::new("a.png", "image/png", vec![1, 2, 3]);
    let err = c.upload_resource(&creds, &file).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let c = client();
    let creds = Credentials::new("http://127.0.0.1:9/", "tok");

    let err = c.create_memo(&creds, "x", Visibility::Public).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_upload_falls_back_to_base64() {
    let mock_server = MockServer::start().await;

    // Mounted first so it wins for the JSON body
    Mock::given(method("POST"))
        .and(path("/api/v1/resources"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "content": "AQID",
            "filename": "a.png",
            "type": "image/png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "name": "resources/9", "type": "image/png" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/resources"))
        .respond_with(ResponseTemplate::new(415))
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = FilePayload::new("a.png", "image/png", vec![1, 2, 3]);
    let resource = client()
        .upload_resource(&creds(&mock_server), &file)
        .await
        .unwrap();

    assert_eq!(resource.name, "resources/9");
    assert_eq!(resource.mime_type, "image/png");
}

#[tokio::test]
async fn test_upload_multipart_resource_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/resources"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resource": { "uid": "u-1", "type": "image/jpeg" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = FilePayload::new("b.jpg", "image/jpeg", vec![0xff, 0xd8]);
    let resource = client()
        .upload_resource(&creds(&mock_server), &file)
        .await
        .unwrap();

    assert_eq!(resource.uid, "u-1");
    assert!(resource.name.is_empty());
}

#[tokio::test]
async fn test_base64_only_config_skips_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/resources"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "resources/1" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let c = MemosClient::new(ClientConfig {
        timeout_seconds: 5,
        multipart_uploads: false,
        ..Default::default()
    })
    .unwrap();
    let file = FilePayload::new("a.txt", "text/plain", b"hi".to_vec());
    let resource = c.upload_resource(&creds(&mock_server), &file).await.unwrap();

    assert_eq!(resource.name, "resources/1");
}

#[tokio::test]
async fn test_link_sends_only_valid_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/memos/1/resources"))
        .and(body_json(json!({
            "resources": [{ "name": "resources/r1" }, { "name": "resources/u2" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resources = vec![
        ResourceRef::new("", "", ""),
        ResourceRef::new("r1", "", "image/png"),
        ResourceRef::new("", "u2", ""),
    ];
    let memo = client()
        .link_resources(&creds(&mock_server), "1", &resources)
        .await
        .unwrap();

    assert_eq!(memo.name, "memos/1");
}

#[tokio::test]
async fn test_link_with_nothing_valid_sends_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client()
        .link_resources(
            &creds(&mock_server),
            "memos/1",
            &[ResourceRef::new("", "", "image/png")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoValidResource));
}

#[tokio::test]
async fn test_auth_status_resolves_user_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/status"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "name": "users/1", "username": "me" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let user = client().auth_status(&creds(&mock_server)).await.unwrap();
    assert_eq!(user.user_id, "1");
    assert_eq!(user.name.as_deref(), Some("users/1"));
}

#[tokio::test]
async fn test_get_tags_variants() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/1/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tagCount": { "rust": 3, "notes": 1 }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/2/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "memoCount": 4 })))
        .mount(&mock_server)
        .await;

    let c = client();
    let creds = creds(&mock_server);

    let tags = c.get_tags(&creds, "1").await.unwrap();
    assert_eq!(tags.get("rust"), Some(&3));
    assert_eq!(tags.len(), 2);

    let tags = c.get_tags(&creds, "users/2").await.unwrap();
    assert!(tags.is_empty());
}

#[tokio::test]
async fn test_fetch_file_names_and_types() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/img/cat.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, 0x50]),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
        .mount(&mock_server)
        .await;

    let c = client();

    let file = c
        .fetch_file(&format!("{}/img/cat.png", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(file.filename, "cat.png");
    assert_eq!(file.mime_type, "image/png");
    assert_eq!(file.data, vec![0x89, 0x50]);

    let file = c
        .fetch_file(&format!("{}/render", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(file.filename, "image.jpg");
    assert_eq!(file.mime_type, "image/jpeg");
}

#[tokio::test]
async fn test_fetch_file_refuses_oversized_downloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0u8; 64]),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/small.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
        .mount(&mock_server)
        .await;

    let c = MemosClient::new(ClientConfig {
        max_download_bytes: 32,
        ..Default::default()
    })
    .unwrap();

    let err = c
        .fetch_file(&format!("{}/big.png", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);

    let file = c
        .fetch_file(&format!("{}/small.png", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(file.data.len(), 16);
}
