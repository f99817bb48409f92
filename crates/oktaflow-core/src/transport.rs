//! Okta request executors.
//!
//! Every network interaction goes through [`OktaTransport`]:
//!
//! | Operation | Calls | Returns |
//! |-----------|-------|---------|
//! | [`OktaTransport::request`] | one | decoded body |
//! | [`OktaTransport::request_with_response`] | one | body + headers |
//! | [`OktaTransport::request_url`] | one, absolute URL | body + headers |
//! | [`OktaTransport::request_all_items`] | one per page | flattened items, bounded by `limit` |
//!
//! The credential and the HTTP capability are injected at construction. Each
//! call owns its accumulator and retry state, so a transport may be shared
//! across concurrent invocations; a paginated fetch is strictly sequential.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::credential::Credential;
use crate::error::{normalize, ErrorResponse, OktaError, TransportError};
use crate::http_client::{HttpClient, HttpMethod, HttpRequest};
use crate::link_header::next_page_url;
use crate::retry::RateLimitRetry;

/// Path prefix of the Okta management API.
pub const API_PATH_PREFIX: &str = "/api/v1";

/// Page size requested when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 200;

const PAGE_SIZE_PARAM: &str = "limit";
const LINK_HEADER: &str = "link";

/// Query string parameters of a request.
pub type Query = BTreeMap<String, String>;

/// One API call as described by an operation: method, resource path, body, query.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Resource path below `/api/v1`, starting with `/`.
    pub path: String,
    /// JSON body; `None` sends no body at all.
    pub body: Option<Value>,
    pub query: Query,
}

impl RequestSpec {
    /// Creates a request without body or query.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `path` - Resource path relative to `/api/v1`, e.g. `/users/00u1`
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Query::new(),
        }
    }

    /// Shorthand for [`RequestSpec::new`] with GET.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds one query parameter, replacing an earlier value of the same name.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Merges `query` into the existing parameters; later values win.
    pub fn with_query_map(mut self, query: Query) -> Self {
        self.query.extend(query);
        self
    }
}

/// Decoded body together with the response headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub body: Value,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Okta API transport bound to one credential.
#[derive(Clone)]
pub struct OktaTransport {
    credential: Credential,
    http_client: Arc<dyn HttpClient>,
    retry: Option<RateLimitRetry>,
    timeout_ms: u64,
}

impl OktaTransport {
    /// Creates a transport for one Okta org.
    ///
    /// # Arguments
    ///
    /// * `credential` - Org URL and secret used for every call
    /// * `http_client` - Capability performing the actual HTTP exchange
    ///
    /// # Returns
    ///
    /// The transport, or [`OktaError::Credential`] when the credential has no
    /// usable org URL or secret.
    pub fn new(credential: Credential, http_client: Arc<dyn HttpClient>) -> Result<Self, OktaError> {
        credential.validate()?;
        Ok(Self {
            credential,
            http_client,
            retry: None,
            timeout_ms: 30_000,
        })
    }

    /// Wraps every HTTP call (each page included) in the given 429 policy.
    pub fn with_rate_limit_retry(mut self, policy: RateLimitRetry) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Per-request timeout handed to the HTTP capability. Defaults to 30 s.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// `{orgUrl}/api/v1{path}` with the org URL's trailing slash removed.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{API_PATH_PREFIX}{path}", self.credential.base_url())
    }

    /// Issues one request and returns the decoded body (object or array).
    pub async fn request(&self, spec: &RequestSpec) -> Result<Value, OktaError> {
        Ok(self.request_with_response(spec).await?.body)
    }

    /// Like [`OktaTransport::request`] but keeps the response headers, e.g. to
    /// read `Link` or the rate-limit counters.
    pub async fn request_with_response(&self, spec: &RequestSpec) -> Result<ApiResponse, OktaError> {
        let url = self.endpoint_url(&spec.path);
        self.send(spec.method, &url, spec.body.as_ref(), Some(&spec.query))
            .await
    }

    /// Issues one request against an absolute URL, such as a `Link` target.
    pub async fn request_url(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, OktaError> {
        self.send(method, url, body, None).await
    }

    /// Follows `rel="next"` links and flattens every page into one sequence.
    ///
    /// The caller's query (plus a default page size) goes on the first request
    /// only; later pages use the link URL verbatim. A `limit` of `None` or `0`
    /// collects everything; otherwise the result holds at most `limit` items and
    /// no page is requested once the limit has been reached.
    ///
    /// # Arguments
    ///
    /// * `spec` - First-page request; its method and body are reused for every page
    /// * `limit` - Maximum number of items to return
    ///
    /// # Returns
    ///
    /// Items in page order, or the first page failure after normalization.
    pub async fn request_all_items(
        &self,
        spec: &RequestSpec,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, OktaError> {
        let limit = limit.filter(|limit| *limit > 0);
        let first_page_query = with_default_page_size(&spec.query);

        let mut results = Vec::new();
        let mut next_url = Some(self.endpoint_url(&spec.path));
        let mut page = 0_usize;

        while let Some(url) = next_url.take() {
            let query = (page == 0).then_some(&first_page_query);
            let ApiResponse { body, headers } =
                self.send(spec.method, &url, spec.body.as_ref(), query).await?;
            page += 1;

            let items = into_items(body);
            let fetched = items.len();
            results.extend(items);
            debug!(page, fetched, total = results.len(), "fetched Okta page");

            if let Some(limit) = limit {
                if results.len() >= limit {
                    results.truncate(limit);
                    debug!(limit, pages = page, "result limit reached; stopping pagination");
                    return Ok(results);
                }
            }

            next_url = next_page_url(headers.get(LINK_HEADER).map(String::as_str));
        }

        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Validates the credential by fetching the caller's own user.
    pub async fn test_credential(&self) -> Result<Value, OktaError> {
        self.request(&RequestSpec::get("/users/me")).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<ApiResponse, OktaError> {
        match self.retry {
            Some(policy) => {
                policy
                    .run(move || self.send_once(method, url, body, query))
                    .await
            }
            None => self.send_once(method, url, body, query).await,
        }
    }

    async fn send_once(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<ApiResponse, OktaError> {
        let request = self.build_request(method, url, body, query);
        debug!(%method, url, "sending Okta request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| normalize(TransportError::Connection(error)))?;

        if !response.is_success() {
            return Err(normalize(TransportError::Status(ErrorResponse {
                status_code: response.status,
                headers: response.headers,
                body: response.body,
            })));
        }

        Ok(ApiResponse {
            body: decode_body(&response.body)?,
            headers: response.headers,
        })
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, url)
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_header("Authorization", self.credential.authorization_header())
            .with_timeout_ms(self.timeout_ms);

        if let Some(body) = body.filter(|body| !is_empty_body(body)) {
            request = request.with_json_body(body.clone());
        }
        for (name, value) in query.into_iter().flatten() {
            request = request.with_query_param(name.as_str(), value.as_str());
        }
        request
    }
}

fn with_default_page_size(query: &Query) -> Query {
    let mut query = query.clone();
    let page_size_missing = query
        .get(PAGE_SIZE_PARAM)
        .map_or(true, |value| matches!(value.trim(), "" | "0"));
    if page_size_missing {
        query.insert(PAGE_SIZE_PARAM.to_owned(), DEFAULT_PAGE_SIZE.to_string());
    }
    query
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn decode_body(body: &str) -> Result<Value, OktaError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|error| OktaError::Decode(error.to_string()))
}

/// A page body as a list of items: arrays as-is, a lone object as one item,
/// an empty body as nothing.
fn into_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
