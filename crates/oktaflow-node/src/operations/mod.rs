//! Per-resource Okta operations.
//!
//! Each module exposes one `async fn` per operation plus a `register` function
//! adding them to an [`OperationRegistry`]. Operations read their parameters,
//! issue calls through the transport and shape the output items; pagination,
//! auth and error normalization stay in the transport.

pub mod application;
pub mod auth_server;
pub mod event_hook;
pub mod factor;
pub mod group;
pub mod identity_provider;
pub mod network_zone;
pub mod policy;
pub mod system_log;
pub mod user;

use std::borrow::Cow;

use oktaflow_core::transport::Query;
use serde_json::{json, Map, Value};

use crate::parameters::Fields;
use crate::registry::OperationRegistry;

pub(crate) fn register_all(registry: &mut OperationRegistry) {
    user::register(registry);
    group::register(registry);
    application::register(registry);
    policy::register(registry);
    auth_server::register(registry);
    identity_provider::register(registry);
    system_log::register(registry);
    network_zone::register(registry);
    event_hook::register(registry);
    factor::register(registry);
}

/// Percent-encodes an identifier for use as one path segment.
pub(crate) fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// `{"success": true, <id fields>}` for operations whose response body is dropped.
pub(crate) fn ack(ids: &[(&str, &str)]) -> Vec<Value> {
    let mut body = Map::new();
    body.insert(String::from("success"), Value::Bool(true));
    for (name, value) in ids {
        body.insert((*name).to_owned(), Value::String((*value).to_owned()));
    }
    vec![Value::Object(body)]
}

/// The response body, or an acknowledgement when the API answered with no body.
pub(crate) fn body_or_ack(body: Value, ids: &[(&str, &str)]) -> Vec<Value> {
    if body.is_null() {
        ack(ids)
    } else {
        vec![body]
    }
}

/// Parses user-supplied JSON text, substituting `fallback` when it is malformed.
pub(crate) fn parse_json_or(text: &str, fallback: Value) -> Value {
    serde_json::from_str(text).unwrap_or(fallback)
}

/// Copies every set field named in `names` into the query under the same name.
pub(crate) fn copy_into_query(fields: &Fields, query: &mut Query, names: &[&str]) {
    for name in names {
        if let Some(value) = fields.text(name) {
            query.insert((*name).to_owned(), value);
        }
    }
}

/// `{type: CIDR|RANGE, value}` address entries for network zones.
pub(crate) fn zone_addresses(values: &str) -> Value {
    crate::parameters::split_list(values)
        .into_iter()
        .map(|value| {
            let kind = if value.contains('/') { "CIDR" } else { "RANGE" };
            json!({ "type": kind, "value": value })
        })
        .collect()
}
