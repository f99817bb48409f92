//! Event hooks (`/eventHooks`).

use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Value};

use super::{ack, segment};
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

const DEFAULT_AUTH_HEADER: &str = "Authorization";

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::EventHook;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "verify", handler!(verify));
}

fn hook_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let hook_id = params.string("eventHookId")?;
    let path = format!("/eventHooks/{}", segment(&hook_id));
    Ok((hook_id, path))
}

fn event_subscription(items: Value) -> Value {
    json!({ "type": "EVENT_TYPE", "items": items })
}

fn http_channel(uri: Value, header_name: Value, header_value: Value) -> Value {
    json!({
        "type": "HTTP",
        "version": "1.0.0",
        "config": {
            "uri": uri,
            "authScheme": { "type": "HEADER", "key": header_name, "value": header_value },
        },
    })
}

/// First truthy candidate, else `fallback`.
fn first_truthy(candidates: &[Option<&Value>], fallback: &str) -> Value {
    candidates
        .iter()
        .flatten()
        .find(|value| crate::parameters::is_truthy(value))
        .map(|value| (*value).clone())
        .unwrap_or_else(|| Value::String(fallback.to_owned()))
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let additional = params.collection("additionalFields")?;
    let body = json!({
        "name": params.string("name")?,
        "events": event_subscription(json!(params.string_list("events")?)),
        "channel": http_channel(
            Value::String(params.string("uri")?),
            first_truthy(&[additional.truthy("authHeaderName")], DEFAULT_AUTH_HEADER),
            first_truthy(&[additional.truthy("authHeaderValue")], ""),
        ),
    });
    let spec = RequestSpec::post("/eventHooks").with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = hook_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let spec = RequestSpec::get("/eventHooks");
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

/// Reads the current hook and writes it back with the requested changes.
///
/// Changing the URI or either auth header rebuilds the whole channel; values
/// that were not supplied are carried over from the current channel.
pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = hook_path(params)?;
    let fields = params.collection("updateFields")?;

    let mut hook = transport.request(&RequestSpec::get(path.as_str())).await?;
    let current_config = hook
        .pointer("/channel/config")
        .cloned()
        .unwrap_or(Value::Null);

    if let Value::Object(current) = &mut hook {
        if let Some(name) = fields.truthy("name") {
            current.insert(String::from("name"), name.clone());
        }
        if let Some(events) = fields.present("events").filter(|events| {
            events.as_array().is_some_and(|items| !items.is_empty())
        }) {
            current.insert(String::from("events"), event_subscription(events.clone()));
        }

        let rebuild_channel = ["uri", "authHeaderName", "authHeaderValue"]
            .iter()
            .any(|name| fields.truthy(name).is_some());
        if rebuild_channel {
            let uri = fields
                .truthy("uri")
                .or_else(|| current_config.get("uri"))
                .cloned()
                .unwrap_or(Value::Null);
            let header_name = first_truthy(
                &[
                    fields.truthy("authHeaderName"),
                    current_config.pointer("/authScheme/key"),
                ],
                DEFAULT_AUTH_HEADER,
            );
            let header_value = first_truthy(
                &[
                    fields.truthy("authHeaderValue"),
                    current_config.pointer("/authScheme/value"),
                ],
                "",
            );
            current.insert(
                String::from("channel"),
                http_channel(uri, header_name, header_value),
            );
        }
    }

    let spec = RequestSpec::put(path).with_body(hook);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (hook_id, path) = hook_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("eventHookId", hook_id.as_str())]))
}

async fn lifecycle(
    transport: &OktaTransport,
    params: &Parameters,
    action: &str,
) -> Result<Vec<Value>, NodeError> {
    let (_, path) = hook_path(params)?;
    let spec = RequestSpec::post(format!("{path}/lifecycle/{action}"));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle(transport, params, "activate").await
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle(transport, params, "deactivate").await
}

pub async fn verify(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle(transport, params, "verify").await
}
