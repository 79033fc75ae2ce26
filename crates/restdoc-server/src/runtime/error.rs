//! Serve error: converts refusals and build failures to HTTP error responses.

use std::fmt;

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Why a caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// Missing or wrong API key, or insufficient auth level.
    Unauthorized,
    /// Plaintext request while HTTPS is enforced.
    Forbidden,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        })
    }
}

/// Errors returned while serving a document or the viewer page.
///
/// Converted to a JSON error body of the form
///
/// ```json
/// { "error": { "code": 401, "message": "...", "status": "UNAUTHENTICATED" } }
/// ```
///
/// Messages are fixed per variant. Build failures are logged with their
/// cause but the response body never carries it.
///
/// # Examples
///
/// ```
/// use axum::response::IntoResponse;
/// use restdoc_server::ServeError;
///
/// let response = ServeError::DocumentHidden.into_response();
/// assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServeError {
    /// Document serving is turned off.
    #[error("document not found")]
    DocumentHidden,

    /// The viewer page is turned off.
    #[error("viewer not found")]
    ViewerHidden,

    /// The caller may not see the resource.
    #[error("access denied: {0}")]
    AccessDenied(Denial),

    /// Assembly failed.
    #[error("document build failed: {0}")]
    Build(#[from] restdoc::Error),
}

impl ServeError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::DocumentHidden | Self::ViewerHidden => StatusCode::NOT_FOUND,
            Self::AccessDenied(Denial::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::AccessDenied(Denial::Forbidden) => StatusCode::FORBIDDEN,
            Self::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Canonical `SCREAMING_SNAKE_CASE` status name.
    #[must_use]
    pub const fn code_name(&self) -> &'static str {
        match self {
            Self::DocumentHidden | Self::ViewerHidden => "NOT_FOUND",
            Self::AccessDenied(Denial::Unauthorized) => "UNAUTHENTICATED",
            Self::AccessDenied(Denial::Forbidden) => "PERMISSION_DENIED",
            Self::Build(_) => "INTERNAL",
        }
    }

    /// Message placed in the response body.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::DocumentHidden => "document not found",
            Self::ViewerHidden => "viewer not found",
            Self::AccessDenied(Denial::Unauthorized) => "missing or invalid credentials",
            Self::AccessDenied(Denial::Forbidden) => "https is required",
            Self::Build(_) => "document is unavailable",
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> axum::response::Response {
        if let Self::Build(err) = &self {
            tracing::error!(error = %err, "document build failed");
        }
        let http_status = self.http_status();

        let body = serde_json::json!({
            "error": {
                "code": http_status.as_u16(),
                "message": self.public_message(),
                "status": self.code_name(),
            }
        });

        (http_status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    /// Parse the JSON error body from a `ServeError` response.
    async fn error_body(err: ServeError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let http_status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (http_status, json)
    }

    #[tokio::test]
    async fn hidden_document_response() {
        let (status, json) = error_body(ServeError::DocumentHidden).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], 404);
        assert_eq!(json["error"]["message"], "document not found");
        assert_eq!(json["error"]["status"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn hidden_viewer_response() {
        let (status, json) = error_body(ServeError::ViewerHidden).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["message"], "viewer not found");
    }

    #[tokio::test]
    async fn unauthorized_response() {
        let (status, json) = error_body(ServeError::AccessDenied(Denial::Unauthorized)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], 401);
        assert_eq!(json["error"]["status"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn forbidden_response() {
        let (status, json) = error_body(ServeError::AccessDenied(Denial::Forbidden)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], 403);
        assert_eq!(json["error"]["status"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn build_failure_hides_cause() {
        let cause = restdoc::Error::UnsupportedShape {
            descriptor: "SecretInternalType".to_string(),
        };
        let (status, json) = error_body(ServeError::from(cause)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "document is unavailable");
        assert!(!json.to_string().contains("SecretInternalType"));
    }

    #[test]
    fn display_format() {
        assert_eq!(
            ServeError::AccessDenied(Denial::Forbidden).to_string(),
            "access denied: forbidden"
        );
        assert_eq!(ServeError::DocumentHidden.to_string(), "document not found");
    }
}
