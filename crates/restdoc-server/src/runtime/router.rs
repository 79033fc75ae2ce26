//! Axum routes for documents and the viewer page.

use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE, VARY};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use restdoc::DocumentFormat;

use super::error::ServeError;
use super::request::DocumentRequest;
use super::service::DocumentService;
use super::viewer::oauth2_redirect_page;

/// Routes serving `service`:
///
/// | Route                       | Handler                        |
/// |-----------------------------|--------------------------------|
/// | `GET /swagger.json`         | document as JSON               |
/// | `GET /swagger.yaml`         | document as YAML               |
/// | `GET /swagger`              | format from the `Accept` header |
/// | `GET /swagger/ui`           | viewer page                    |
/// | `GET /oauth2-redirect.html` | OAuth2 redirect helper         |
///
/// Mount under a prefix with [`Router::nest`]; the viewer locates the
/// document relative to its own URL.
pub fn router(service: DocumentService) -> Router {
    Router::new()
        .route("/swagger.json", get(json_document))
        .route("/swagger.yaml", get(yaml_document))
        .route("/swagger", get(negotiated_document))
        .route("/swagger/ui", get(viewer))
        .route("/oauth2-redirect.html", get(oauth2_redirect))
        .with_state(service)
}

/// Pick YAML when `Accept` names a YAML media type, JSON otherwise.
#[must_use]
pub fn negotiate_format(headers: &HeaderMap) -> DocumentFormat {
    let wants_yaml = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|range| range.split(';').next())
        .map(str::trim)
        .any(|media| {
            matches!(
                media.to_ascii_lowercase().as_str(),
                "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml"
            )
        });
    if wants_yaml {
        DocumentFormat::Yaml
    } else {
        DocumentFormat::Json
    }
}

async fn document(
    service: &DocumentService,
    request: Request,
    format: DocumentFormat,
) -> Result<Response, ServeError> {
    let (parts, _body) = request.into_parts();
    let doc_request = DocumentRequest::from_parts(&parts);
    let document = service.serve_document(&doc_request).await?;
    Ok((
        [(CONTENT_TYPE, format.content_type())],
        document.render(format).to_vec(),
    )
        .into_response())
}

async fn json_document(
    State(service): State<DocumentService>,
    request: Request,
) -> Result<Response, ServeError> {
    document(&service, request, DocumentFormat::Json).await
}

async fn yaml_document(
    State(service): State<DocumentService>,
    request: Request,
) -> Result<Response, ServeError> {
    document(&service, request, DocumentFormat::Yaml).await
}

async fn negotiated_document(
    State(service): State<DocumentService>,
    request: Request,
) -> Result<Response, ServeError> {
    let format = negotiate_format(request.headers());
    let mut response = document(&service, request, format).await?;
    response
        .headers_mut()
        .insert(VARY, axum::http::HeaderValue::from_static("accept"));
    Ok(response)
}

async fn viewer(
    State(service): State<DocumentService>,
    request: Request,
) -> Result<Html<String>, ServeError> {
    let (parts, _body) = request.into_parts();
    service
        .serve_viewer(&DocumentRequest::from_parts(&parts))
        .map(Html)
}

async fn oauth2_redirect() -> Html<&'static str> {
    Html(oauth2_redirect_page())
}
