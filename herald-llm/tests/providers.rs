mod common;

use herald_config::{GatewayConfig, LlmConfig};
use herald_llm::client_from_config;
use herald_llm::openai::OpenAiClient;
use herald_llm::traits::LlmClient;
use herald_llm::workers_ai::WorkersAiClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";

#[tokio::test]
async fn workers_ai_direct_returns_response_text() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/accounts/acct/ai/run/{MODEL}")))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"response": "We're live!"},
            "success": true,
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        WorkersAiClient::new(&server.uri(), "acct", "cf-token".into(), MODEL.into()).unwrap();
    let resp = client.generate("hello", Some("sys")).await.unwrap().unwrap();
    assert_eq!(resp.text, "We're live!");
    assert_eq!(resp.model.as_deref(), Some(MODEL));
}

#[tokio::test]
async fn workers_ai_null_response_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"response": null},
            "success": true
        })))
        .mount(&server)
        .await;

    let client = WorkersAiClient::new(&server.uri(), "acct", "t".into(), MODEL.into()).unwrap();
    assert!(client.generate("hello", None).await.unwrap().is_none());
}

#[tokio::test]
async fn workers_ai_unsuccessful_envelope_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": null,
            "success": false,
            "errors": [{"code": 5007, "message": "No such model"}]
        })))
        .mount(&server)
        .await;

    let client = WorkersAiClient::new(&server.uri(), "acct", "t".into(), MODEL.into()).unwrap();
    let err = client.generate("hello", None).await.unwrap_err();
    assert!(err.to_string().contains("No such model"), "got {err}");
}

#[tokio::test]
async fn workers_ai_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkersAiClient::new(&server.uri(), "acct", "t".into(), MODEL.into()).unwrap();
    assert!(client.generate("hello", None).await.is_err());
}

#[tokio::test]
async fn gateway_route_sends_cache_headers() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/acct/my-gw/workers-ai/{MODEL}")))
        .and(header("cf-aig-skip-cache", "true"))
        .and(header("cf-aig-cache-ttl", "3600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"response": "via gateway"},
            "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = LlmConfig::WorkersAi {
        account_id: "acct".into(),
        api_token: "t".into(),
        model: MODEL.into(),
        api_base: "http://unused.invalid/".into(),
        gateway: Some(GatewayConfig {
            id: "my-gw".into(),
            skip_cache: true,
            cache_ttl: Some(3600),
            base: server.uri(),
        }),
        max_tokens: Some(200),
        temperature: None,
    };
    let client = client_from_config(&cfg).unwrap();
    let resp = client.generate("hello", None).await.unwrap().unwrap();
    assert_eq!(resp.text, "via gateway");
}

#[tokio::test]
async fn openai_first_choice_wins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 64})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini-2024",
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ],
            "usage": {"total_tokens": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        &format!("{}/v1", server.uri()),
        "sk-test".into(),
        "gpt-4o-mini".into(),
    )
    .unwrap()
    .with_defaults(Some(64), None);

    let resp = client.generate("hi", None).await.unwrap().unwrap();
    assert_eq!(resp.text, "first");
    assert_eq!(resp.tokens_used, Some(12));
    assert_eq!(resp.model.as_deref(), Some("gpt-4o-mini-2024"));
}

#[tokio::test]
async fn openai_no_choices_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&server.uri(), "k".into(), "m".into()).unwrap();
    assert!(client.generate("hi", None).await.unwrap().is_none());
}
