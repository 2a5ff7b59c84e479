mod common;

use std::fs;

use common::StubServer;
use nbpost::auth::StoredCredentials;
use nbpost::blogger::BloggerClient;
use nbpost::load_config::AuthSection;
use nbpost_core::contract::{BlogDirectory, LifecycleState, NewPost, Session, SessionProvider};
use nbpost_core::document::Document;
use nbpost_core::error::PublishError;
use nbpost_core::finder::find_by_title;
use nbpost_core::publish::{publish, PublishRequest};
use nbpost_core::PublishConfig;
use tempfile::tempdir;

fn client(server: &StubServer) -> BloggerClient {
    BloggerClient::new(
        reqwest::Client::new(),
        format!("{}/v3", server.base_url),
        Session::new("live-token"),
    )
}

#[tokio::test]
async fn unknown_blog_url_ends_as_blog_not_found() {
    let server = StubServer::start(vec![(404, r#"{"error": {"code": 404}}"#.to_string())]).await;
    let dir = tempdir().unwrap();
    let store = dir.path().join("credentials.json");
    fs::write(&store, r#"{"access_token": "live-token"}"#).unwrap();
    let auth = AuthSection {
        credentials: store,
        ..AuthSection::default()
    };

    let http = reqwest::Client::new();
    let sessions = StoredCredentials::new(http.clone(), &auth);
    let api_base = format!("{}/v3", server.base_url);
    let document = Document::from_bytes("report.html", b"<p>hi</p>".to_vec()).unwrap();
    let request = PublishRequest {
        blog_url: "http://example.com/blog".to_string(),
        ..PublishRequest::default()
    };

    let err = publish(&PublishConfig::default(), &document, &request, &sessions, |session| {
        BloggerClient::new(http, api_base, session)
    })
    .await
    .unwrap_err();

    assert!(matches!(err, PublishError::BlogNotFound { .. }), "got {err:?}");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method(), "GET");
    assert_eq!(
        requests[0].target(),
        "/v3/blogs/byurl?url=http%3A%2F%2Fexample.com%2Fblog"
    );
    assert!(requests[0].headers.contains("authorization: bearer live-token"));
}

#[tokio::test]
async fn listing_asks_for_state_without_bodies_then_follows_token() {
    let server = StubServer::start(vec![
        (
            200,
            r#"{"items": [{"id": "1", "title": "Other", "status": "DRAFT"}], "nextPageToken": "tok-2"}"#
                .to_string(),
        ),
        (
            200,
            r#"{"items": [{"id": "2", "title": "Notes", "status": "DRAFT", "labels": ["physics"]}]}"#
                .to_string(),
        ),
    ])
    .await;
    let directory = client(&server);

    let found = find_by_title(
        &directory,
        "b1",
        "Notes",
        &[LifecycleState::Draft],
        &PublishConfig::default(),
    )
    .await
    .unwrap()
    .expect("post on the second page");

    assert_eq!(found.id, "2");
    assert_eq!(found.state, LifecycleState::Draft);
    assert_eq!(found.labels, vec!["physics"]);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].target(),
        "/v3/blogs/b1/posts?status=draft&fetchBodies=false"
    );
    assert_eq!(
        requests[1].target(),
        "/v3/blogs/b1/posts?status=draft&fetchBodies=false&pageToken=tok-2"
    );
}

#[tokio::test]
async fn create_posts_a_draft() {
    let server = StubServer::start(vec![(
        200,
        r#"{"id": "99", "title": "Notes", "content": "<p>x</p>", "status": "DRAFT", "url": "http://example.com/blog/notes.html"}"#
            .to_string(),
    )])
    .await;
    let directory = client(&server);

    let post = directory
        .create_post(
            "b1",
            NewPost {
                title: "Notes".to_string(),
                content: "<p>x</p>".to_string(),
                labels: Some(vec!["physics".to_string()]),
            },
            true,
        )
        .await
        .unwrap();

    assert_eq!(post.id, "99");
    assert_eq!(post.state, LifecycleState::Draft);

    let requests = server.requests();
    assert_eq!(requests[0].method(), "POST");
    assert_eq!(requests[0].target(), "/v3/blogs/b1/posts?isDraft=true");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["title"], "Notes");
    assert_eq!(body["labels"], serde_json::json!(["physics"]));
}

#[tokio::test]
async fn update_patches_content_and_leaves_labels_alone() {
    let server = StubServer::start(vec![(
        200,
        r#"{"id": "7", "title": "Notes", "content": "<p>new</p>", "status": "LIVE", "labels": ["kept"]}"#
            .to_string(),
    )])
    .await;
    let directory = client(&server);

    let post = directory
        .update_post(
            "b1",
            "7",
            NewPost {
                title: "Notes".to_string(),
                content: "<p>new</p>".to_string(),
                labels: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(post.state, LifecycleState::Live);
    assert_eq!(post.labels, vec!["kept"]);

    let requests = server.requests();
    assert_eq!(requests[0].method(), "PATCH");
    assert_eq!(requests[0].target(), "/v3/blogs/b1/posts/7");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["content"], "<p>new</p>");
    assert!(body.get("labels").is_none());
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let server = StubServer::start(vec![(500, r#"{"error": "backend down"}"#.to_string())]).await;
    let directory = client(&server);

    let err = directory
        .resolve_blog_by_url("http://example.com/blog")
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("500"), "got: {msg}");
    assert!(msg.contains("backend down"), "got: {msg}");
}

#[tokio::test]
async fn expired_token_is_refreshed_and_stored() {
    let server = StubServer::start(vec![(
        200,
        r#"{"access_token": "fresh-token", "expires_in": 3600, "token_type": "Bearer"}"#.to_string(),
    )])
    .await;
    let dir = tempdir().unwrap();
    let store = dir.path().join("credentials.json");
    fs::write(
        &store,
        r#"{"access_token": "stale", "refresh_token": "refresh-1", "expires_at": 1}"#,
    )
    .unwrap();
    let auth = AuthSection {
        credentials: store.clone(),
        token_endpoint: format!("{}/token", server.base_url),
        client_id: Some("client-1".to_string()),
        client_secret: Some("secret-1".to_string()),
    };

    let session = StoredCredentials::new(reqwest::Client::new(), &auth)
        .session()
        .await
        .unwrap();
    assert_eq!(session.access_token, "fresh-token");

    let requests = server.requests();
    assert_eq!(requests[0].method(), "POST");
    assert_eq!(requests[0].target(), "/token");
    assert!(requests[0].body.contains("grant_type=refresh_token"));
    assert!(requests[0].body.contains("refresh_token=refresh-1"));
    assert!(requests[0].body.contains("client_id=client-1"));

    let rewritten: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(rewritten["access_token"], "fresh-token");
    assert_eq!(rewritten["refresh_token"], "refresh-1");
    let expires_at = rewritten["expires_at"].as_u64().unwrap();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    assert!(expires_at > now + 3000 && expires_at <= now + 3600);
}
