//! Error taxonomy shared by every adapter and driver.
//!
//! [`ProviderError`] is the only error type that crosses the driver/adapter
//! seam. Drivers translate their transport and wire failures into it; adapters
//! pass driver errors through unchanged. Nothing in this layer panics on a
//! missing feature: absent capabilities surface as
//! [`ProviderError::Unsupported`].

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors returned by the provider abstraction layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The addressed resource does not exist (or is not visible to the
    /// credential in use).
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable description of the missing resource.
        resource: String,
    },

    /// The operation has no meaning, or no implementation, for this backend.
    #[error("{operation} is not supported by this provider")]
    Unsupported {
        /// Name of the operation that was attempted (e.g. `"merge pull request"`).
        operation: &'static str,
    },

    /// The backend answered, but not with the status the operation requires.
    #[error("backend responded with status {status}: {message}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Backend-supplied error message, or the raw body when none was parsed.
        message: String,
    },

    /// Input was rejected before any request was made.
    #[error("invalid input: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The request did not produce a usable response (connection failure,
    /// undecodable body).
    #[error("transport error: {message}")]
    Transport {
        /// Short description of the failure.
        message: String,
        /// Underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ProviderError {
    /// Shorthand for [`ProviderError::Unsupported`].
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Shorthand for [`ProviderError::NotFound`].
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Shorthand for [`ProviderError::Backend`].
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status carried by a [`ProviderError::Backend`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for [`ProviderError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// `true` for [`ProviderError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
