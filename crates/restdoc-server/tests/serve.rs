//! Router tests: access precedence, caching, reload and format negotiation.
//!
//! Uses the pet store manifest shipped under `demos/`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use restdoc::{AuthLevel, DocumentSettings, Manifest, SpecVersion};
use restdoc_server::{router, DocumentRequest, DocumentService, DocumentState};

const PETSTORE: &str = include_str!("../../../demos/petstore.yaml");
const SETTINGS: &str = include_str!("../../../demos/settings.yaml");

fn settings() -> DocumentSettings {
    serde_yaml_ng::from_str(SETTINGS).expect("settings should parse")
}

fn service(settings: DocumentSettings) -> DocumentService {
    let (registry, catalog) = Manifest::from_yaml(PETSTORE)
        .expect("manifest should parse")
        .into_parts()
        .expect("manifest should register");
    DocumentService::new(settings, registry.freeze(), catalog).expect("settings should validate")
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::get(uri).header(header::HOST, "localhost:7071")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, content_type, body)
}

async fn status_of(app: &Router, request: Request<Body>) -> StatusCode {
    send(app, request).await.0
}

#[tokio::test]
async fn json_route_serves_document() {
    let app = router(service(settings()));
    let (status, content_type, body) =
        send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc["openapi"], "3.0.1");
    assert_eq!(doc["servers"][0]["url"], "http://localhost:7071/api");
    assert_eq!(doc["servers"][1]["url"], "http://petstore.example.com/api");
}

#[tokio::test]
async fn yaml_route_matches_json_route() {
    let app = router(service(settings()));
    let (_, content_type, yaml) =
        send(&app, get("/swagger.yaml").body(Body::empty()).unwrap()).await;
    let (_, _, json) = send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;

    assert_eq!(content_type.as_deref(), Some("application/yaml"));
    let from_yaml: Value = serde_yaml_ng::from_str(std::str::from_utf8(&yaml).unwrap()).unwrap();
    let from_json: Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[tokio::test]
async fn accept_header_negotiates_format() {
    let app = router(service(settings()));
    let (_, content_type, _) = send(
        &app,
        get("/swagger")
            .header(header::ACCEPT, "application/yaml")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(content_type.as_deref(), Some("application/yaml"));

    let (_, content_type, _) = send(&app, get("/swagger").body(Body::empty()).unwrap()).await;
    assert_eq!(content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn repeated_requests_get_identical_bytes() {
    let app = router(service(settings()));
    let (_, _, first) = send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;
    let (_, _, second) = send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn hidden_document_is_not_found_even_with_valid_key() {
    let app = router(service(DocumentSettings {
        hide_document: true,
        api_key: Some("s3cret".to_string()),
        ..settings()
    }));
    let request = get("/swagger.json")
        .header("x-api-key", "s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"]["status"], "NOT_FOUND");
}

#[tokio::test]
async fn api_key_is_required_when_configured() {
    let app = router(service(DocumentSettings {
        api_key: Some("s3cret".to_string()),
        ..settings()
    }));

    let missing = get("/swagger.json").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, missing).await, StatusCode::UNAUTHORIZED);

    let wrong = get("/swagger.json?code=nope").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, wrong).await, StatusCode::UNAUTHORIZED);

    let by_header = get("/swagger.json")
        .header("x-api-key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_of(&app, by_header).await, StatusCode::OK);

    let by_query = get("/swagger.json?code=s3cret").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, by_query).await, StatusCode::OK);
}

#[tokio::test]
async fn auth_level_comes_from_request_extension() {
    let mut settings = settings();
    settings.auth_level.document = AuthLevel::Function;
    let app = router(service(settings));

    let anonymous = get("/swagger.json").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, anonymous).await, StatusCode::UNAUTHORIZED);

    let mut admin = get("/swagger.json").body(Body::empty()).unwrap();
    admin.extensions_mut().insert(AuthLevel::Admin);
    assert_eq!(status_of(&app, admin).await, StatusCode::OK);
}

#[tokio::test]
async fn force_https_rejects_plaintext() {
    let app = router(service(DocumentSettings {
        force_https: true,
        ..settings()
    }));

    let plaintext = get("/swagger.json").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, plaintext).await, StatusCode::FORBIDDEN);

    let proxied = get("/swagger.json")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, proxied).await;
    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc["servers"][0]["url"], "https://localhost:7071/api");
}

#[tokio::test]
async fn viewer_is_hidden_independently() {
    let app = router(service(DocumentSettings {
        hide_swagger_ui: true,
        ..settings()
    }));
    let viewer = get("/swagger/ui").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, viewer).await, StatusCode::NOT_FOUND);
    let document = get("/swagger.json").body(Body::empty()).unwrap();
    assert_eq!(status_of(&app, document).await, StatusCode::OK);

    let app = router(service(DocumentSettings {
        hide_document: true,
        ..settings()
    }));
    let (status, content_type, body) =
        send(&app, get("/swagger/ui").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("Swagger Petstore"));
}

#[tokio::test]
async fn oauth2_redirect_page_is_served() {
    let app = router(service(settings()));
    let (status, content_type, _) =
        send(&app, get("/oauth2-redirect.html").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_requests_build_once() {
    let service = service(settings());
    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let request = DocumentRequest::new("http").host("localhost:7071");
            service.serve_document(&request).await.map(|doc| doc.json().to_vec())
        }));
    }

    let mut bodies = Vec::new();
    for handle in handles {
        bodies.push(handle.await.unwrap().unwrap());
    }
    assert_eq!(service.build_count(), 1);
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn reload_rebuilds_exactly_once() {
    let service = service(settings());
    let app = router(service.clone());
    assert_eq!(service.state(), DocumentState::Unbuilt);

    send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;
    assert_eq!(service.state(), DocumentState::Served);
    assert_eq!(service.build_count(), 1);

    let mut v2 = settings();
    v2.version = SpecVersion::V2;
    service.reload(v2).unwrap();
    assert_eq!(service.state(), DocumentState::Stale);

    let (_, _, body) = send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;
    send(&app, get("/swagger.yaml").body(Body::empty()).unwrap()).await;
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc["swagger"], "2.0");
    assert_eq!(service.build_count(), 2);
    assert_eq!(service.state(), DocumentState::Served);
}

#[tokio::test]
async fn served_document_omits_internal_endpoints() {
    let app = router(service(settings()));
    let (_, _, body) = send(&app, get("/swagger.json").body(Body::empty()).unwrap()).await;
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"].get("/debug/snapshot").is_none());
}
