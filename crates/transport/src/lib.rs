//! HTTP transport shared by the backend drivers.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Owns the `reqwest` client, URL construction and the
//! single [`BeforeRequest`] hook through which credentials are attached. It
//! does not interpret status codes: every response, successful or not, comes
//! back as a [`RawResponse`] and the driver decides what the status means.
//!
//! Every request carries an `X-Request-Id` header (a fresh UUID v4) that is
//! also recorded on the request's tracing span, so a backend-side log line can
//! be matched to the client-side span.

pub mod auth;
pub mod errors;
pub mod http;

pub use auth::{Authorization, BeforeRequest};
pub use errors::{TransportError, TransportResult};
pub use http::{HttpTransport, RawResponse, REQUEST_ID_HEADER};
