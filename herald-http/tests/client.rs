use herald_http::{Auth, HttpClient, HttpError, RequestOpts};
use herald_http::Status as StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1", server.uri())).unwrap();
    let got: Value = client
        .get_json("items", RequestOpts::default())
        .await
        .unwrap();
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"title": "Unauthorized", "status": 401})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json::<_, Value>("2/tweets", Some("stale"), &json!({"text": "hi"}))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    match err {
        HttpError::Api { message, .. } => assert_eq!(message, "Unauthorized"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn form_post_with_basic_auth_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("v", "2"))
        // base64("id:secret")
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let got: Value = client
        .post_form_opts(
            "/oauth/token",
            &[("grant_type", "refresh_token"), ("refresh_token", "r")],
            RequestOpts {
                auth: Some(Auth::Basic {
                    username: "id",
                    password: "secret",
                }),
                query: Some(vec![("v", "2".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got["access_token"], "a");
}

#[tokio::test]
async fn exhausted_retries_surface_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(0);
    let err = client
        .get_json::<Value>("down", RequestOpts::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
}
