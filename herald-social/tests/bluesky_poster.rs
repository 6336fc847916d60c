use herald_common::Network;
use herald_social::Poster;
use herald_social::bluesky::BlueskyPoster;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .and(body_partial_json(json!({"identifier": "herald.bsky.social", "password": "app-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessJwt": "jwt",
            "refreshJwt": "rjwt",
            "did": "did:plc:herald",
            "handle": "herald.bsky.social"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn poster(server: &MockServer) -> BlueskyPoster {
    BlueskyPoster::new(
        &server.uri(),
        "herald.bsky.social".into(),
        "app-pass".into(),
        vec!["en".into()],
    )
    .unwrap()
}

#[tokio::test]
async fn creates_record_with_facets() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .and(query_param("handle", "friend.bsky.social"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"did": "did:plc:friend"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .and(query_param("handle", "ghost.example.com"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "InvalidRequest",
            "message": "Unable to resolve handle"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.createRecord"))
        .and(header("authorization", "Bearer jwt"))
        .and(body_partial_json(json!({
            "repo": "did:plc:herald",
            "collection": "app.bsky.feed.post",
            "record": {"$type": "app.bsky.feed.post", "langs": ["en"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "at://did:plc:herald/app.bsky.feed.post/3k",
            "cid": "bafy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = "Live with @friend.bsky.social and @ghost.example.com https://twitch.tv/herald #rust";
    let receipt = poster(&server).post(text).await.unwrap();
    assert_eq!(receipt.network, Network::Bluesky);
    assert_eq!(receipt.id, "at://did:plc:herald/app.bsky.feed.post/3k");

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.url.path().ends_with("createRecord"))
        .unwrap();
    let body: Value = serde_json::from_slice(&create.body).unwrap();
    let record = &body["record"];
    assert_eq!(record["text"], text);
    assert!(record["createdAt"].as_str().unwrap().contains('T'));

    let facets = record["facets"].as_array().unwrap();
    let features: Vec<&str> = facets
        .iter()
        .map(|f| f["features"][0]["$type"].as_str().unwrap())
        .collect();
    assert_eq!(
        features,
        vec![
            "app.bsky.richtext.facet#mention",
            "app.bsky.richtext.facet#link",
            "app.bsky.richtext.facet#tag",
        ]
    );
    assert_eq!(facets[0]["features"][0]["did"], "did:plc:friend");
    let start = facets[1]["index"]["byteStart"].as_u64().unwrap() as usize;
    let end = facets[1]["index"]["byteEnd"].as_u64().unwrap() as usize;
    assert_eq!(&text[start..end], "https://twitch.tv/herald");
}

#[tokio::test]
async fn failed_login_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "AuthenticationRequired",
            "message": "Invalid identifier or password"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.repo.createRecord"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = poster(&server).post("hi").await.unwrap_err();
    assert!(err.to_string().contains("Invalid identifier or password"), "got {err}");
}
