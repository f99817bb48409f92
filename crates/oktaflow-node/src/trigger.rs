//! Receiver for Okta event-hook deliveries.
//!
//! Okta verifies a new event hook with a one-time `GET` carrying the
//! `x-okta-verification-challenge` header and expects the challenge echoed back
//! as `{"verification": <challenge>}`. Deliveries afterwards are `POST`s whose
//! body holds the events under `data.events`.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::{debug, info};

pub const VERIFICATION_CHALLENGE_HEADER: &str = "x-okta-verification-challenge";

/// Name of the webhook path used while Okta verifies the hook.
pub const SETUP_WEBHOOK: &str = "setup";

/// An inbound webhook request as seen by the trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub webhook_name: String,
    pub method: String,
    /// Header names are matched case-insensitively.
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl WebhookRequest {
    pub fn new(webhook_name: impl Into<String>, method: impl Into<String>, body: Value) -> Self {
        Self {
            webhook_name: webhook_name.into(),
            method: method.into(),
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// What the host should do with a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Answer the caller directly; no workflow run.
    Respond(WebhookResponse),
    /// Start a workflow run with one item per event.
    Emit(Vec<Value>),
}

/// Event-hook trigger, optionally restricted to a set of event types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OktaTrigger {
    events: Vec<String>,
}

impl OktaTrigger {
    /// Trigger emitting every event type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger emitting only events whose `eventType` is in `events`; empty keeps all.
    pub fn for_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
        }
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn handle(&self, request: &WebhookRequest) -> WebhookOutcome {
        let verification_phase =
            request.webhook_name == SETUP_WEBHOOK || request.method.eq_ignore_ascii_case("GET");
        if verification_phase {
            if let Some(challenge) = request.header(VERIFICATION_CHALLENGE_HEADER) {
                info!(webhook = %request.webhook_name, "answering Okta verification challenge");
                return WebhookOutcome::Respond(verification_response(challenge));
            }
        }

        let delivered = request
            .body
            .pointer("/data/events")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let received = delivered.len();
        let events: Vec<Value> = delivered
            .into_iter()
            .filter(|event| self.accepts(event))
            .collect();

        debug!(received, emitted = events.len(), "processed Okta event delivery");
        if events.is_empty() {
            return WebhookOutcome::Respond(WebhookResponse {
                status: 200,
                headers: BTreeMap::new(),
                body: String::new(),
            });
        }
        WebhookOutcome::Emit(events)
    }

    fn accepts(&self, event: &Value) -> bool {
        if self.events.is_empty() {
            return true;
        }
        event
            .get("eventType")
            .and_then(Value::as_str)
            .is_some_and(|kind| self.events.iter().any(|wanted| wanted == kind))
    }
}

fn verification_response(challenge: &str) -> WebhookResponse {
    let mut headers = BTreeMap::new();
    headers.insert(String::from("Content-Type"), String::from("application/json"));
    WebhookResponse {
        status: 200,
        headers,
        body: json!({ "verification": challenge }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(events: Value) -> WebhookRequest {
        WebhookRequest::new("default", "POST", json!({ "data": { "events": events } }))
    }

    #[test]
    fn get_with_challenge_echoes_verification() {
        let request = WebhookRequest::new("default", "GET", Value::Null)
            .with_header("X-Okta-Verification-Challenge", "abc123");

        let WebhookOutcome::Respond(response) = OktaTrigger::new().handle(&request) else {
            panic!("verification must be answered directly");
        };

        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert_eq!(response.body, r#"{"verification":"abc123"}"#);
    }

    #[test]
    fn setup_webhook_answers_challenge_on_post_too() {
        let request = WebhookRequest::new(SETUP_WEBHOOK, "POST", json!({}))
            .with_header(VERIFICATION_CHALLENGE_HEADER, "xyz");

        let outcome = OktaTrigger::new().handle(&request);

        assert!(matches!(outcome, WebhookOutcome::Respond(ref r) if r.body.contains("xyz")));
    }

    #[test]
    fn challenge_header_on_regular_post_is_ignored() {
        let request = delivery(json!([{ "eventType": "user.session.start" }]))
            .with_header(VERIFICATION_CHALLENGE_HEADER, "xyz");

        let outcome = OktaTrigger::new().handle(&request);

        assert_eq!(outcome, WebhookOutcome::Emit(vec![json!({ "eventType": "user.session.start" })]));
    }

    #[test]
    fn configured_event_types_filter_delivery_in_order() {
        let trigger = OktaTrigger::for_events(["user.lifecycle.create", "user.account.lock"]);
        let request = delivery(json!([
            { "eventType": "user.account.lock", "uuid": "1" },
            { "eventType": "user.session.start", "uuid": "2" },
            { "eventType": "user.lifecycle.create", "uuid": "3" },
            { "uuid": "4" }
        ]));

        let outcome = trigger.handle(&request);

        assert_eq!(
            outcome,
            WebhookOutcome::Emit(vec![
                json!({ "eventType": "user.account.lock", "uuid": "1" }),
                json!({ "eventType": "user.lifecycle.create", "uuid": "3" }),
            ])
        );
    }

    #[test]
    fn no_matching_events_acknowledges_with_empty_body() {
        let trigger = OktaTrigger::for_events(["group.user_membership.add"]);

        let outcome = trigger.handle(&delivery(json!([{ "eventType": "user.session.end" }])));

        assert_eq!(
            outcome,
            WebhookOutcome::Respond(WebhookResponse {
                status: 200,
                headers: BTreeMap::new(),
                body: String::new(),
            })
        );
    }

    #[test]
    fn body_without_events_is_acknowledged() {
        let request = WebhookRequest::new("default", "POST", json!({ "eventType": "com.okta.event_hook" }));

        assert!(matches!(
            OktaTrigger::new().handle(&request),
            WebhookOutcome::Respond(WebhookResponse { status: 200, .. })
        ));
    }
}
