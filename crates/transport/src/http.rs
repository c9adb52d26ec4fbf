//! The `reqwest`-backed transport and its response type.

use std::sync::Arc;

use gitprovider::driver::status;
use gitprovider::{DriverResponse, ProviderError};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, Instrument};
use url::Url;
use uuid::Uuid;

use crate::auth::BeforeRequest;
use crate::errors::{TransportError, TransportResult};

/// Correlation header attached to every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const USER_AGENT: &str = concat!("gitprovider/", env!("CARGO_PKG_VERSION"));

/// Longest backend message carried into an error, in characters.
const MAX_MESSAGE_CHARS: usize = 512;

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A response whose status has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> TransportResult<T> {
        serde_json::from_slice(&self.body).map_err(|source| TransportError::Decode {
            status: self.status,
            source,
        })
    }

    /// The backend's error message.
    ///
    /// Understands `{"message": ..}` (Gitea, Azure DevOps) and
    /// `{"error": {"message": ..}}` (Bitbucket); otherwise falls back to the
    /// raw body, then to the status line.
    pub fn error_message(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            let message = value
                .get("message")
                .or_else(|| value.get("error").and_then(|e| e.get("message")))
                .and_then(serde_json::Value::as_str);
            if let Some(message) = message {
                return truncate(message);
            }
        }

        let text = String::from_utf8_lossy(&self.body);
        let text = text.trim();
        if text.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            truncate(text)
        }
    }

    /// Decodes the body when the status is `expected`; otherwise maps `404`
    /// to [`ProviderError::NotFound`] for `resource` and anything else to
    /// [`ProviderError::Backend`].
    pub fn expect_json<T: DeserializeOwned>(
        &self,
        expected: u16,
        resource: impl FnOnce() -> String,
    ) -> Result<T, ProviderError> {
        if self.status == expected {
            Ok(self.json()?)
        } else {
            Err(self.to_error(resource))
        }
    }

    /// A [`DriverResponse`] whose body is decoded only when the status is
    /// `success`. Other statuses carry the backend's error message instead.
    pub fn driver_response<T: DeserializeOwned>(
        &self,
        success: u16,
    ) -> TransportResult<DriverResponse<T>> {
        if self.status == success {
            Ok(DriverResponse::new(self.status, Some(self.json()?)))
        } else {
            Ok(DriverResponse::rejected(self.status, self.error_message()))
        }
    }

    /// A bodiless [`DriverResponse`], for endpoints whose success carries no
    /// useful payload.
    pub fn status_response(&self, success: u16) -> DriverResponse<()> {
        if self.status == success {
            DriverResponse::new(self.status, None)
        } else {
            DriverResponse::rejected(self.status, self.error_message())
        }
    }

    /// [`ProviderError::NotFound`] for a `404`, [`ProviderError::Backend`]
    /// for anything else.
    pub fn to_error(&self, resource: impl FnOnce() -> String) -> ProviderError {
        if self.status == status::NOT_FOUND {
            ProviderError::not_found(resource())
        } else {
            ProviderError::backend(self.status, self.error_message())
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_MESSAGE_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// An HTTP client bound to one API base URL.
///
/// Cloning shares the connection pool and the hook.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    hook: Option<Arc<dyn BeforeRequest>>,
}

impl HttpTransport {
    /// Creates a transport for `base_url`. A trailing slash is implied.
    pub fn new(base_url: &str) -> TransportResult<Self> {
        let mut parsed = Url::parse(base_url).map_err(|source| TransportError::InvalidBaseUrl {
            url: base_url.to_string(),
            source: Some(source),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(TransportError::InvalidBaseUrl {
                url: base_url.to_string(),
                source: None,
            });
        }
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: parsed,
            hook: None,
        })
    }

    /// Installs the before-request hook, replacing any previous one.
    pub fn with_hook(mut self, hook: impl BeforeRequest + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` followed by `segments`, each percent-encoded as a single
    /// path segment. Split file paths on `/` before passing them in.
    pub fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> TransportResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| TransportError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    source: None,
                })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        Ok(url)
    }

    pub async fn get(&self, url: Url) -> TransportResult<RawResponse> {
        self.send(Method::GET, url, |b| b).await
    }

    pub async fn delete(&self, url: Url) -> TransportResult<RawResponse> {
        self.send(Method::DELETE, url, |b| b).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> TransportResult<RawResponse> {
        self.send(Method::POST, url, |b| b.json(body)).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> TransportResult<RawResponse> {
        self.send(Method::PATCH, url, |b| b.json(body)).await
    }

    /// `application/x-www-form-urlencoded` POST.
    pub async fn post_form<B: Serialize + ?Sized>(
        &self,
        url: Url,
        form: &B,
    ) -> TransportResult<RawResponse> {
        self.send(Method::POST, url, |b| b.form(form)).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> TransportResult<RawResponse> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "http_request",
            method = %method,
            path = %url.path(),
            request_id = %request_id,
        );

        let mut request = body(self.client.request(method, url)).build()?;
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            request.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        if let Some(hook) = &self.hook {
            hook.before_request(&mut request);
        }

        async move {
            let response = self.client.execute(request).await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            debug!(status, bytes = body.len(), "response received");
            Ok(RawResponse { status, body })
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let transport = HttpTransport::new("https://gitea.example.com/api/v1").unwrap();
        assert_eq!(transport.base_url().as_str(), "https://gitea.example.com/api/v1/");
    }

    #[test]
    fn test_endpoint_encodes_each_segment() {
        let transport = HttpTransport::new("https://gitea.example.com/api/v1/").unwrap();

        let url = transport
            .endpoint(&["repos", "acme", "infra", "branches", "feature/x y"])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://gitea.example.com/api/v1/repos/acme/infra/branches/feature%2Fx%20y"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(TransportError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpTransport::new("mailto:someone@example.com"),
            Err(TransportError::InvalidBaseUrl { source: None, .. })
        ));
    }

    #[test]
    fn test_error_message_shapes() {
        let gitea = RawResponse {
            status: 409,
            body: br#"{"message":"sha does not match"}"#.to_vec(),
        };
        assert_eq!(gitea.error_message(), "sha does not match");

        let bitbucket = RawResponse {
            status: 400,
            body: br#"{"type":"error","error":{"message":"Bad branch"}}"#.to_vec(),
        };
        assert_eq!(bitbucket.error_message(), "Bad branch");

        let plain = RawResponse {
            status: 502,
            body: b"  upstream down \n".to_vec(),
        };
        assert_eq!(plain.error_message(), "upstream down");

        let empty = RawResponse {
            status: 500,
            body: Vec::new(),
        };
        assert_eq!(empty.error_message(), "HTTP 500");
    }

    #[test]
    fn test_to_error_maps_not_found() {
        let missing = RawResponse {
            status: 404,
            body: Vec::new(),
        };
        assert!(missing.to_error(|| "repository acme/x".into()).is_not_found());

        let forbidden = RawResponse {
            status: 403,
            body: br#"{"message":"no"}"#.to_vec(),
        };
        assert_eq!(forbidden.to_error(String::new).status(), Some(403));
    }

    #[test]
    fn test_driver_response_decodes_only_on_success() {
        let created = RawResponse {
            status: 201,
            body: br#"{"sha":"abc"}"#.to_vec(),
        };
        let response: DriverResponse<serde_json::Value> = created.driver_response(201).unwrap();
        assert_eq!(response.body.unwrap()["sha"], "abc");

        let conflict = RawResponse {
            status: 409,
            body: br#"{"message":"stale"}"#.to_vec(),
        };
        let response: DriverResponse<serde_json::Value> = conflict.driver_response(201).unwrap();
        assert_eq!(response.body, None);
        assert_eq!(response.message.as_deref(), Some("stale"));
        assert_eq!(conflict.status_response(201).status, 409);
    }

    #[test]
    fn test_expect_json_decode_failure_is_transport_error() {
        let garbage = RawResponse {
            status: 200,
            body: b"<html>".to_vec(),
        };

        let err = garbage
            .expect_json::<serde_json::Value>(200, String::new)
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
