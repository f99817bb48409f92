//! Scripted [`HttpClient`] for unit tests of this crate and its dependents.
//!
//! Compiled for this crate's own tests and, for other crates, behind the
//! `test-util` feature.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Replays queued replies in order and records every request it sees.
///
/// Once the queue is drained every call fails with a connection error.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    replies: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    /// Client answering with `replies`, connection failures included.
    pub fn new(replies: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client answering with `responses`, all of which reach the transport.
    pub fn with_responses(responses: Vec<HttpResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("no scripted response left")));
        Box::pin(async move { reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_served_in_order_then_run_dry() {
        let client = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json("[]")),
            Err(HttpError::new("connection reset")),
        ]);

        let first = client.execute(HttpRequest::get("https://acme.okta.com/a")).await;
        let second = client.execute(HttpRequest::get("https://acme.okta.com/b")).await;
        let third = client.execute(HttpRequest::get("https://acme.okta.com/c")).await;

        assert_eq!(first, Ok(HttpResponse::ok_json("[]")));
        assert_eq!(second, Err(HttpError::new("connection reset")));
        assert_eq!(third, Err(HttpError::new("no scripted response left")));
        let urls: Vec<_> = client.requests().into_iter().map(|request| request.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://acme.okta.com/a",
                "https://acme.okta.com/b",
                "https://acme.okta.com/c"
            ]
        );
    }
}
