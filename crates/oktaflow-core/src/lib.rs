//! # Oktaflow Core
//!
//! Transport layer for the Okta management API (`/api/v1`).
//!
//! ## Overview
//!
//! - **Credential** handling for `SSWS` API tokens and OAuth 2.0 bearer tokens
//! - **Single and paginated request executors** following `Link: rel="next"`
//! - **Rate-limit retry** for HTTP 429 keyed off `x-rate-limit-reset`
//! - **Error normalization** of Okta `errorCode` payloads into one error shape
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`credential`] | Credential record, auth headers, credential stores |
//! | [`error`] | Transport errors and the Okta error normalizer |
//! | [`http_client`] | HTTP client abstraction and the reqwest implementation |
//! | [`link_header`] | `Link` header parsing |
//! | [`retry`] | 429 retry with exponential backoff |
//! | `testing` | Scripted HTTP client (`test-util` feature) |
//! | [`transport`] | Request executors bound to one credential |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oktaflow_core::{Credential, OktaTransport, ReqwestHttpClient, RequestSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = Credential::from_env()?;
//!     let transport = OktaTransport::new(credential, Arc::new(ReqwestHttpClient::new()))?;
//!
//!     let users = transport
//!         .request_all_items(&RequestSpec::get("/users"), Some(50))
//!         .await?;
//!     println!("fetched {} users", users.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! - Tokens are never logged; request logging carries method and URL only
//! - `Credential`'s `Debug` output redacts every secret field

pub mod credential;
pub mod error;
pub mod http_client;
pub mod link_header;
pub mod retry;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use credential::{
    AuthMethod, Credential, CredentialStore, EnvCredentialStore, StaticCredentialStore,
    CREDENTIAL_NAME,
};
pub use error::{known_error_message, normalize, ErrorResponse, OktaError, TransportError};
pub use http_client::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use link_header::{next_page_url, parse_link_header};
pub use retry::{handle_rate_limit, RateLimitRetry, RateLimitSignal};
pub use transport::{ApiResponse, OktaTransport, Query, RequestSpec, API_PATH_PREFIX, DEFAULT_PAGE_SIZE};
