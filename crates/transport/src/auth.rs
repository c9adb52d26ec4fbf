//! The before-request hook and the credential encodings the drivers need.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::warn;

/// Called exactly once per request, immediately before it is sent.
///
/// The request already carries its method, URL, body and the transport's own
/// headers. Implementations typically add an `Authorization` header.
pub trait BeforeRequest: Send + Sync {
    fn before_request(&self, request: &mut reqwest::Request);
}

impl<F> BeforeRequest for F
where
    F: Fn(&mut reqwest::Request) + Send + Sync,
{
    fn before_request(&self, request: &mut reqwest::Request) {
        self(request)
    }
}

/// An `Authorization` header scheme.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Basic base64(username:password)`. Azure DevOps personal access tokens
    /// use an empty username; Bitbucket app passwords use the account name.
    Basic { username: String, password: String },
    /// `Bearer <token>`.
    Bearer(String),
    /// `token <token>`, as Gitea expects for access tokens.
    Token(String),
}

impl Authorization {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// The full header value, scheme included.
    pub fn header_value(&self) -> String {
        match self {
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
            Self::Bearer(token) => format!("Bearer {token}"),
            Self::Token(token) => format!("token {token}"),
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Bearer(_) => "bearer",
            Self::Token(_) => "token",
        }
    }
}

impl BeforeRequest for Authorization {
    fn before_request(&self, request: &mut reqwest::Request) {
        match HeaderValue::from_str(&self.header_value()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            // Control characters in a credential; send unauthenticated and let
            // the backend answer 401.
            Err(_) => warn!(
                scheme = self.scheme(),
                "credential is not a valid header value, request sent without it"
            ),
        }
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}
