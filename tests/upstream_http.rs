mod common;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use common::{credentials, FakeCatalog, FakeChat, CLIENT_SECRET};
use serde_json::{json, Value};
use song_scout::client::{ClientError, HttpProxy, Orchestrator, ProxyApi, SearchState};
use song_scout::config::Config;
use song_scout::error::AppError;
use song_scout::services::{
    AccessToken, CatalogApi, CatalogService, ChatApi, HttpCatalogApi, OpenAiChat, Recommender,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const STUB_TOKEN: &str = "stub-token";

/// Serves `router` on an ephemeral local port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base: &str) -> Config {
    Config {
        spotify_client_id: Some("client-id".to_string()),
        spotify_client_secret: Some(CLIENT_SECRET.to_string()),
        openai_api_key: Some("sk-test".to_string()),
        spotify_accounts_url: base.to_string(),
        spotify_api_url: format!("{}/v1", base),
        openai_api_url: format!("{}/openai/v1", base),
        upstream_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

async fn token_endpoint(
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));

    if !basic || form.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_client" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "access_token": STUB_TOKEN, "token_type": "Bearer", "expires_in": 3600 })),
    )
}

/// Catalog stub: a working token endpoint plus whatever `api` routes the test needs.
fn catalog_stub(api: Router) -> Router {
    Router::new()
        .route("/api/token", post(token_endpoint))
        .nest("/v1", api)
}

#[tokio::test]
async fn test_token_request_uses_client_credentials() {
    let base = serve(Router::new().route("/api/token", post(token_endpoint))).await;
    let api = HttpCatalogApi::new(&config_for(&base)).unwrap();

    let token = api.request_token(&credentials()).await.unwrap();
    assert_eq!(token.secret(), STUB_TOKEN);
}

#[tokio::test]
async fn test_token_body_without_access_token_is_auth_error() {
    let stub = Router::new().route(
        "/api/token",
        post(|| async { Json(json!({ "token_type": "Bearer", "expires_in": 3600 })) }),
    );
    let base = serve(stub).await;
    let api = HttpCatalogApi::new(&config_for(&base)).unwrap();

    let err = api.request_token(&credentials()).await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)), "{:?}", err);
}

#[tokio::test]
async fn test_rejected_token_is_auth_error() {
    let stub = Router::new().route(
        "/api/token",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_client" }))) }),
    );
    let base = serve(stub).await;
    let api = HttpCatalogApi::new(&config_for(&base)).unwrap();

    let err = api.request_token(&credentials()).await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)), "{:?}", err);
}

#[tokio::test]
async fn test_catalog_rejection_is_unauthorized() {
    let stub = catalog_stub(
        Router::new()
            .route("/search", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/artists/:id", get(|| async { StatusCode::FORBIDDEN })),
    );
    let base = serve(stub).await;
    let api = HttpCatalogApi::new(&config_for(&base)).unwrap();
    let token = AccessToken::new(STUB_TOKEN);

    let err = api.search_tracks(&token, "Blinding Lights", 1).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized), "{:?}", err);

    let err = api.fetch_artist(&token, "abc").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized), "{:?}", err);
}

#[tokio::test]
async fn test_search_and_artist_lookup_over_http() {
    let stub = catalog_stub(
        Router::new()
            .route(
                "/search",
                get(|headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    let bearer = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer stub-token");
                    if !bearer || params.get("type").map(String::as_str) != Some("track") {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    Json(json!({
                        "tracks": { "items": [{
                            "name": params.get("q").cloned().unwrap_or_default(),
                            "artists": [{ "name": "The Weeknd", "id": "abc" }],
                            "album": { "name": "After Hours" },
                            "popularity": 90
                        }] }
                    }))
                    .into_response()
                }),
            )
            .route(
                "/artists/:id",
                get(|| async {
                    Json(json!({ "name": "The Weeknd", "genres": ["canadian contemporary r&b", "pop"] }))
                }),
            ),
    );
    let base = serve(stub).await;
    let api = Arc::new(HttpCatalogApi::new(&config_for(&base)).unwrap());
    let catalog = CatalogService::new(api, Some(credentials()));

    let track = catalog.search_track("Blinding Lights").await.unwrap();
    assert_eq!(track.name, "Blinding Lights");
    assert_eq!(track.extra["popularity"], 90);

    assert_eq!(catalog.genre_of(Some("abc")).await, "canadian contemporary r&b");
}

#[tokio::test]
async fn test_malformed_catalog_payload_is_not_echoed() {
    let stub = catalog_stub(Router::new().route(
        "/search",
        get(|| async {
            Json(json!({
                "tracks": { "items": [{
                    "name": "x",
                    "artists": "INTERNAL-UPSTREAM-PAYLOAD",
                    "album": { "name": "y" }
                }] }
            }))
        }),
    ));
    let base = serve(stub).await;
    let config = config_for(&base);
    let router = song_scout::build_app(song_scout::build_state(&config).unwrap(), &config);

    let (status, body) = common::get(router, "/api/spotify?q=x").await;
    assert_eq!(status, 500);
    assert!(body.contains("\"error\""));
    assert!(!body.contains("INTERNAL-UPSTREAM-PAYLOAD"), "{}", body);
}

type SeenRequests = Arc<Mutex<Vec<(String, Value)>>>;

/// Chat provider stub answering with `reply` and recording each request's
/// Authorization header and JSON body.
fn chat_stub(reply: impl Fn() -> Response + Clone + Send + Sync + 'static) -> (Router, SeenRequests) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let router = Router::new().route(
        "/openai/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorded = recorded.clone();
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                recorded.lock().unwrap().push((auth, body));
                reply()
            }
        }),
    );
    (router, seen)
}

async fn recommender_for(router: Router) -> Recommender {
    let base = serve(router).await;
    let config = config_for(&base);
    Recommender::new(Arc::new(OpenAiChat::new(&config).unwrap()), &config)
}

#[tokio::test]
async fn test_chat_request_over_http() {
    let (stub, seen) = chat_stub(|| {
        Json(json!({
            "object": "chat.completion",
            "choices": [{ "message": { "role": "assistant", "content": "1. Save Your Tears" } }]
        }))
        .into_response()
    });
    let recommender = recommender_for(stub).await;

    let completion = recommender.recommend("Blinding Lights", "The Weeknd").await.unwrap();
    assert_eq!(completion["object"], "chat.completion");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 100);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(
        body["messages"][1]["content"],
        "Suggest 5 songs similar to 'Blinding Lights' by 'The Weeknd', but do not include the same song."
    );
}

#[tokio::test]
async fn test_chat_failures_are_upstream_errors() {
    let replies: [fn() -> Response; 4] = [
        || (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response(),
        || (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": { "message": "quota" } }))).into_response(),
        || "not json".into_response(),
        || Json(json!({ "choices": [] })).into_response(),
    ];

    for reply in replies {
        let (stub, seen) = chat_stub(reply);
        let recommender = recommender_for(stub).await;

        let err = recommender.recommend("Blinding Lights", "The Weeknd").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)), "{:?}", err);
        // no retries
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_missing_api_key_makes_no_call() {
    let (stub, seen) = chat_stub(|| StatusCode::OK.into_response());
    let base = serve(stub).await;
    let config = Config {
        openai_api_key: None,
        ..config_for(&base)
    };
    let chat = Arc::new(OpenAiChat::new(&config).unwrap());
    assert!(!chat.is_configured());

    let err = Recommender::new(chat, &config)
        .recommend("Blinding Lights", "The Weeknd")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
    assert!(seen.lock().unwrap().is_empty());
}

async fn http_proxy() -> (Arc<FakeCatalog>, HttpProxy) {
    let catalog = Arc::new(FakeCatalog::with_blinding_lights());
    let chat = Arc::new(FakeChat::answering("1. Save Your Tears - The Weeknd\n2. Take On Me - a-ha"));
    let base = serve(common::app(catalog.clone(), chat)).await;
    (catalog, HttpProxy::new(&base, Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_http_proxy_classifies_responses() {
    let (_, proxy) = http_proxy().await;

    assert_eq!(proxy.search("zzzzqqq").await.unwrap_err(), ClientError::NotFound);
    assert_eq!(
        proxy.search("  ").await.unwrap_err(),
        ClientError::Invalid("Missing query parameter".to_string())
    );

    let track = proxy.search("Blinding Lights").await.unwrap();
    assert_eq!(track.album.name, "After Hours");
    assert_eq!(proxy.genre(Some("abc")).await, "synthpop");
    assert_eq!(proxy.genre(None).await, "Unknown");
}

#[tokio::test]
async fn test_orchestrator_over_http_proxy() {
    let (catalog, proxy) = http_proxy().await;
    let orchestrator = Orchestrator::new(Arc::new(proxy));

    assert_eq!(orchestrator.search("Blinding Lights").await, SearchState::Rendered);

    let page = orchestrator.snapshot().await;
    assert!(page.song_html().contains("Blinding Lights by The Weeknd"));
    assert!(page.song_html().contains("Genre: synthpop"));
    assert_eq!(
        page.recommendations_html(),
        "<li>1. Save Your Tears - The Weeknd</li><li>2. Take On Me - a-ha</li>"
    );
    assert_eq!(
        catalog.calls(),
        vec!["token", "search:Blinding Lights", "token", "artist:abc"]
    );
}
