//! Access precedence for documents and the viewer page.

use restdoc::DocumentSettings;

use super::error::{Denial, ServeError};
use super::request::DocumentRequest;

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The JSON or YAML document.
    Document,
    /// The Swagger UI page.
    Viewer,
}

/// Decide whether `request` may see `resource` under `settings`.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. resource hidden (`hide_document` / `hide_swagger_ui`): 404, even for
///    callers with valid credentials
/// 2. configured API key missing or different: 401
/// 3. granted auth level below `auth_level.document` / `auth_level.ui`: 401
/// 4. documents only: `force_https` and a plaintext request: 403
///
/// # Errors
///
/// Returns [`ServeError::DocumentHidden`], [`ServeError::ViewerHidden`] or
/// [`ServeError::AccessDenied`].
pub fn authorize(
    settings: &DocumentSettings,
    request: &DocumentRequest,
    resource: Resource,
) -> Result<(), ServeError> {
    let (hidden, required) = match resource {
        Resource::Document => (settings.hide_document, settings.auth_level.document),
        Resource::Viewer => (settings.hide_swagger_ui, settings.auth_level.ui),
    };

    if hidden {
        tracing::debug!(?resource, "refused: hidden");
        return Err(match resource {
            Resource::Document => ServeError::DocumentHidden,
            Resource::Viewer => ServeError::ViewerHidden,
        });
    }

    if let Some(expected) = settings.api_key.as_deref() {
        if !request
            .presented_key(settings)
            .is_some_and(|presented| keys_match(presented, expected))
        {
            tracing::debug!(?resource, "refused: missing or invalid api key");
            return Err(ServeError::AccessDenied(Denial::Unauthorized));
        }
    }

    let granted = request.granted_level();
    if granted < required {
        tracing::debug!(?resource, ?granted, ?required, "refused: auth level too low");
        return Err(ServeError::AccessDenied(Denial::Unauthorized));
    }

    if resource == Resource::Document && settings.force_https && request.is_plaintext() {
        tracing::debug!(?resource, "refused: plaintext request while https is forced");
        return Err(ServeError::AccessDenied(Denial::Forbidden));
    }

    Ok(())
}

/// Key comparison whose running time depends only on the lengths.
fn keys_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
