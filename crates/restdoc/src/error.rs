//! Typed error enum for the `restdoc` library API.
//!
//! Library consumers can match on specific variants. The CLI converts these
//! to `anyhow::Error` at the binary boundary for richer context messages.
//!
//! Registration-time variants (`DuplicateOperationId`, `UnsupportedShape`,
//! `UnknownSecurityScheme`, ...) are meant to stop the process at startup;
//! none of them is ever produced while serving a cached document.

/// Errors produced by `restdoc` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading settings or manifest files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An operation id was registered twice.
    #[error("operation id '{operation_id}' is already registered")]
    DuplicateOperationId {
        /// The repeated operation id.
        operation_id: String,
    },

    /// A type descriptor names neither a primitive nor a declared type.
    #[error("unsupported shape '{descriptor}'; declare it as a type or use a primitive")]
    UnsupportedShape {
        /// The descriptor as written.
        descriptor: String,
    },

    /// A security requirement references a scheme missing from settings.
    #[error(
        "operation '{operation_id}' requires security scheme '{scheme}', \
         which is not defined in settings"
    )]
    UnknownSecurityScheme {
        /// Operation declaring the requirement.
        operation_id: String,
        /// The unknown scheme name.
        scheme: String,
    },

    /// A reserved component was never defined, or a reference dangles.
    ///
    /// Synthesis reserves names before descending, so this indicates a bug
    /// rather than bad input.
    #[error("component '{name}' was referenced but never defined")]
    ShapeCycleUnresolved {
        /// The unresolved component name.
        name: String,
    },

    /// Two different shapes were declared under the same name.
    #[error("component '{name}' is already defined with a different shape")]
    ShapeConflict {
        /// The conflicting component name.
        name: String,
    },

    /// A parameter name appears more than once within one endpoint.
    #[error("operation '{operation_id}' declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// Operation declaring the parameters.
        operation_id: String,
        /// The repeated parameter name.
        name: String,
    },

    /// Route placeholders and declared path parameters disagree.
    #[error(
        "operation '{operation_id}': path parameter '{name}' does not match \
         route template '{route}'"
    )]
    PathParameterMismatch {
        /// Operation with the mismatch.
        operation_id: String,
        /// Placeholder or parameter name without a counterpart.
        name: String,
        /// The route template.
        route: String,
    },

    /// Two endpoints share a method and path; only one could appear in the
    /// document.
    #[error("operations '{existing}' and '{operation_id}' both route {method} {path}")]
    DuplicateRoute {
        /// Upper-case HTTP method.
        method: String,
        /// Normalized path.
        path: String,
        /// Operation registered first.
        existing: String,
        /// Operation registered second.
        operation_id: String,
    },

    /// A status code appears more than once within one endpoint.
    #[error("operation '{operation_id}' declares response {status} more than once")]
    DuplicateResponse {
        /// Operation declaring the responses.
        operation_id: String,
        /// The repeated status code.
        status: u16,
    },

    /// A settings value could not be interpreted.
    #[error("invalid setting {key}={value:?}: {reason}")]
    InvalidSetting {
        /// Setting key (environment variable or YAML key).
        key: String,
        /// The rejected value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    /// Required for use in async contexts and across thread boundaries.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };

    #[test]
    fn display_names_the_offender() {
        let err = Error::UnknownSecurityScheme {
            operation_id: "getPetById".into(),
            scheme: "petstore_auth".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("getPetById"), "{msg}");
        assert!(msg.contains("petstore_auth"), "{msg}");
    }
}
