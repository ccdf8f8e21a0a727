//! Integration tests for the async client using wiremock to simulate the service.

use serde_json::{json, Value};
use std::time::Duration;
use ultracontext::{
    BatchUpdate, Client, CreateContext, Error, GetContext, GetRequest, GetResult, ListContexts,
    MessageRef, MessageUpdate, Metadata, DEFAULT_TIMEOUT,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

fn metadata(value: Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

fn mutation_body() -> Value {
    json!({"data": [{"id": "msg_1", "index": 0, "role": "user"}], "version": 2})
}

#[tokio::test]
async fn test_create_without_arguments_sends_no_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "ctx_1",
            "metadata": {},
            "created_at": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.create(CreateContext::new()).await.unwrap();

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.into_data().unwrap().id, "ctx_1");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_fork_sends_only_given_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts"))
        .and(body_json(json!({"from": "ctx_src", "version": 3, "metadata": {"k": "v"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "ctx_fork"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .create(
            CreateContext::fork("ctx_src")
                .version(3)
                .metadata(metadata(json!({"k": "v"}))),
        )
        .await
        .unwrap();

    assert_eq!(response.data.as_ref().unwrap().id, "ctx_fork");

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("at").is_none());
    assert!(sent.get("before").is_none());
}

#[tokio::test]
async fn test_list_sends_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "ctx_1", "metadata": {"team": "core"}}, {"id": "ctx_2"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.list(ListContexts::new().limit(5)).await.unwrap();

    let listed = response.into_data().unwrap();
    assert_eq!(listed.data.len(), 2);
    assert_eq!(listed.data[0].metadata.get("team"), Some(&json!("core")));
}

#[tokio::test]
async fn test_list_without_limit_has_no_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.list(ListContexts::new()).await.unwrap();
    client.list(ListContexts::new().limit(0)).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.url.query().is_none()));
}

#[tokio::test]
async fn test_get_sends_explicit_false_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts/ctx_1"))
        .and(query_param("history", "false"))
        .and(query_param("at", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "msg_1", "index": 0, "role": "user", "content": "hi"}],
            "version": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .get("ctx_1", GetContext::new().at(2).history(false))
        .await
        .unwrap();

    let context = response.into_data().unwrap();
    assert_eq!(context.version, Some(1));
    assert_eq!(context.data[0].field("content"), Some(&json!("hi")));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("at=2&history=false"));
}

#[tokio::test]
async fn test_fetch_tags_result_by_mode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "ctx_1"}]})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "version": 0})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let listed = client
        .fetch(GetRequest::new(None, GetContext::new(), ListContexts::new()))
        .await
        .unwrap();
    assert!(matches!(listed.data, Some(GetResult::List(ref list)) if list.data.len() == 1));

    let single = client
        .fetch(GetRequest::new(
            Some("ctx_1".to_string()),
            GetContext::new(),
            ListContexts::new(),
        ))
        .await
        .unwrap();
    assert!(matches!(single.data, Some(GetResult::Context(ref ctx)) if ctx.version == Some(0)));
}

#[tokio::test]
async fn test_append_single_message_is_sent_as_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!([{"role": "user"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_body()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let single = client.append("ctx_1", json!({"role": "user"})).await.unwrap();
    client.append("ctx_1", json!([{"role": "user"}])).await.unwrap();

    let appended = single.into_data().unwrap();
    assert_eq!(appended.version, Some(2));
    assert_eq!(appended.data[0].id.as_deref(), Some("msg_1"));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, requests[1].body);
}

#[tokio::test]
async fn test_single_update_without_metadata_is_flat() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!({"id": "m1", "text": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .update("ctx_1", MessageUpdate::id("m1").set("text", "hi"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_single_update_with_metadata_is_wrapped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!({
            "updates": [{"id": "m1", "text": "hi"}],
            "metadata": {"by": "x"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .update(
            "ctx_1",
            MessageUpdate::id("m1")
                .set("text", "hi")
                .metadata(metadata(json!({"by": "x"}))),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_batch_update_omits_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!({
            "updates": [{"index": 0, "text": "a"}, {"index": 1, "text": "b"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mutation_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .update(
            "ctx_1",
            BatchUpdate::new(vec![
                json!({"index": 0, "text": "a"}),
                json!({"index": 1, "text": "b"}),
            ]),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_no_content_yields_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!({"ids": ["m1"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let single = client.delete("ctx_1", "m1", None).await.unwrap();
    let listed = client.delete("ctx_1", vec!["m1"], None).await.unwrap();

    assert!(single.data.is_none());
    assert!(listed.data.is_none());
    assert!(single.is_empty());
}

#[tokio::test]
async fn test_delete_with_body_and_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/contexts/ctx_1"))
        .and(body_json(json!({"ids": ["m1", -1], "metadata": {"reason": "cleanup"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "version": 5})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .delete(
            "ctx_1",
            vec![MessageRef::from("m1"), MessageRef::from(-1)],
            Some(metadata(json!({"reason": "cleanup"}))),
        )
        .await
        .unwrap();

    assert_eq!(response.data.unwrap().version, Some(5));
}

#[tokio::test]
async fn test_http_error_keeps_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"not found"}"#))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get("missing", GetContext::new().version(2)).await;

    match result {
        Err(Error::HttpError {
            status,
            url,
            raw_response,
            ..
        }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(raw_response, r#"{"error":"not found"}"#);
            assert_eq!(url, format!("{}/contexts/missing", mock_server.uri()));
        }
        other => panic!("Expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_conflict_is_not_special_cased() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("version conflict"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .update("ctx_1", MessageUpdate::index(0).set("text", "x"))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
    assert_eq!(err.raw_response(), Some("version conflict"));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.create(CreateContext::new()).await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            serde_error,
            status,
        }) => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(raw_response, "invalid json");
            assert!(serde_error.contains("expected"));
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_headers_and_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .and(header("authorization", "Bearer uc_test"))
        .and(header("content-type", "application/json"))
        .and(header("x-team", "core"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key("uc_test")
        .base_url(mock_server.uri())
        .unwrap()
        .default_header("Content-Type", "text/plain")
        .unwrap()
        .default_header("X-Team", "core")
        .unwrap()
        .build()
        .unwrap();

    client.list(ListContexts::new()).await.unwrap();
}

#[tokio::test]
async fn test_base_url_path_prefix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(format!("{}/v1/", mock_server.uri()))
        .unwrap()
        .build()
        .unwrap();

    client.get("ctx_1", GetContext::new()).await.unwrap();
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = client.list(ListContexts::new()).await.unwrap_err();

    assert!(matches!(err, Error::Timeout), "got {:?}", err);
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    let client = Client::builder()
        .base_url("http://127.0.0.1:1")
        .unwrap()
        .build()
        .unwrap();

    let err = client.list(ListContexts::new()).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_response_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "ctx_1"}))
                .insert_header("x-request-id", "req-42"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.create(CreateContext::new()).await.unwrap();

    assert_eq!(response.header("x-request-id"), Some("req-42"));
    assert!(response.raw_body.contains("ctx_1"));
    assert_eq!(response.url, format!("{}/contexts", mock_server.uri()));
    assert!(!response.is_empty());
}

#[tokio::test]
async fn test_no_content_is_none_for_every_operation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contexts/ctx_1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let created = client.create(CreateContext::new()).await.unwrap();
    assert!(created.data.is_none());
    assert_eq!(created.status.as_u16(), 204);

    let updated = client
        .update("ctx_1", MessageUpdate::id("m1").set("text", "hi"))
        .await
        .unwrap();
    assert!(updated.data.is_none());

    let appended = client.append("ctx_1", json!({"role": "user"})).await.unwrap();
    assert!(appended.data.is_none());
    assert_eq!(appended.status.as_u16(), 200);
    assert!(appended.is_empty());

    let fetched = client.get("ctx_1", GetContext::new()).await.unwrap();
    assert!(fetched.into_data().is_none());

    let listed = client.list(ListContexts::new()).await.unwrap();
    assert!(listed.data.is_none());

    let tagged = client
        .fetch(GetRequest::new(None, GetContext::new(), ListContexts::new()))
        .await
        .unwrap();
    assert!(tagged.data.is_none());
}

#[tokio::test]
async fn test_zero_timeout_uses_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::ZERO)
        .build()
        .unwrap();

    assert_eq!(client.config().timeout(), DEFAULT_TIMEOUT);

    let response = client.list(ListContexts::new()).await.unwrap();
    assert!(response.into_data().unwrap().data.is_empty());
}
