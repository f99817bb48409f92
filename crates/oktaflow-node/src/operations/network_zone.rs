//! Network zones (`/zones`).

use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Map, Value};

use super::{ack, parse_json_or, segment, zone_addresses};
use crate::error::NodeError;
use crate::parameters::{split_list, Fields, Parameters};
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

const IP_ZONE: &str = "IP";
const DYNAMIC_ZONE: &str = "DYNAMIC";

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::NetworkZone;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
}

fn zone_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let zone_id = params.string("zoneId")?;
    let path = format!("/zones/{}", segment(&zone_id));
    Ok((zone_id, path))
}

fn zone_type(params: &Parameters) -> Result<String, NodeError> {
    match params.optional_string("zoneType") {
        Some(kind) => Ok(kind),
        None => params.string("type"),
    }
}

fn insert_addresses(body: &mut Map<String, Value>, fields: &Fields) {
    for name in ["gateways", "proxies"] {
        if let Some(values) = fields.text(name) {
            body.insert(name.to_owned(), zone_addresses(&values));
        }
    }
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let kind = zone_type(params)?;
    let additional = params.collection("additionalFields")?;

    let mut body = Map::new();
    body.insert(String::from("name"), Value::String(params.string("name")?));
    body.insert(String::from("type"), Value::String(kind.clone()));
    body.insert(String::from("status"), json!("ACTIVE"));

    match kind.as_str() {
        IP_ZONE => insert_addresses(&mut body, &additional),
        DYNAMIC_ZONE => {
            if let Some(locations) = additional.text("locations") {
                body.insert(String::from("locations"), parse_json_or(&locations, json!([])));
            }
            if let Some(asns) = additional.text("asns") {
                body.insert(String::from("asns"), json!(split_list(&asns)));
            }
            if let Some(proxy_type) = additional.truthy("proxyType") {
                body.insert(String::from("proxyType"), proxy_type.clone());
            }
        }
        _ => {}
    }

    let spec = RequestSpec::post("/zones").with_body(Value::Object(body));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = zone_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut spec = RequestSpec::get("/zones");
    if let Some(filter) = filters.text("filter") {
        spec = spec.with_query("filter", filter);
    }
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

/// Reads the current zone and writes it back with the requested changes.
///
/// Malformed `locations` JSON leaves the zone's existing locations untouched.
pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = zone_path(params)?;
    let fields = params.collection("updateFields")?;

    let mut zone = transport.request(&RequestSpec::get(path.as_str())).await?;
    if let Value::Object(current) = &mut zone {
        for name in ["name", "status"] {
            if let Some(value) = fields.truthy(name) {
                current.insert(name.to_owned(), value.clone());
            }
        }
        insert_addresses(current, &fields);
        if let Some(locations) = fields.text("locations") {
            if let Ok(parsed) = serde_json::from_str::<Value>(&locations) {
                current.insert(String::from("locations"), parsed);
            }
        }
        if let Some(asns) = fields.text("asns") {
            current.insert(String::from("asns"), json!(split_list(&asns)));
        }
    }

    let spec = RequestSpec::put(path).with_body(zone);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (zone_id, path) = zone_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("zoneId", zone_id.as_str())]))
}
