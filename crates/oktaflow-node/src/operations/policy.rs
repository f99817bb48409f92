//! Policies and policy rules (`/policies`).

use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Value};

use super::{ack, parse_json_or, segment};
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::Policy;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "getRules", handler!(get_rules));
    registry.register(resource, "createRule", handler!(create_rule));
    registry.register(resource, "deleteRule", handler!(delete_rule));
}

fn policy_path(params: &Parameters, id_param: &str) -> Result<(String, String), NodeError> {
    let policy_id = params.string(id_param)?;
    let path = format!("/policies/{}", segment(&policy_id));
    Ok((policy_id, path))
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let body = json!({
        "type": params.string("type")?,
        "name": params.string("name")?,
        "description": params.string_or("description", ""),
        "priority": params.number_or("priority", 1)?,
        "status": "ACTIVE",
    });
    let spec = RequestSpec::post("/policies").with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = policy_path(params, "policyId")?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let spec = RequestSpec::get("/policies").with_query("type", params.string("policyType")?);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

/// Reads the current policy and writes it back with the requested changes.
pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = policy_path(params, "policyId")?;
    let fields = params.collection("updateFields")?;

    let mut policy = transport.request(&RequestSpec::get(path.as_str())).await?;
    if let Value::Object(current) = &mut policy {
        if let Some(name) = fields.truthy("name") {
            current.insert(String::from("name"), name.clone());
        }
        for name in ["description", "priority"] {
            if let Some(value) = fields.present(name) {
                current.insert(name.to_owned(), value.clone());
            }
        }
    }

    let spec = RequestSpec::put(path).with_body(policy);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (policy_id, path) = policy_path(params, "policyId")?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("policyId", policy_id.as_str())]))
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (policy_id, path) = policy_path(params, "policyId")?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/activate")))
        .await?;
    Ok(ack(&[("policyId", policy_id.as_str())]))
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (policy_id, path) = policy_path(params, "policyId")?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/deactivate")))
        .await?;
    Ok(ack(&[("policyId", policy_id.as_str())]))
}

pub async fn get_rules(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = policy_path(params, "policyId")?;
    let spec = RequestSpec::get(format!("{path}/rules"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn create_rule(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = policy_path(params, "policyIdForRule")?;

    let mut body = json!({
        "name": params.string("ruleName")?,
        "priority": params.number_or("rulePriority", 1)?,
        "status": "ACTIVE",
    });
    for name in ["conditions", "actions"] {
        if let Some(text) = params.optional_string(name) {
            body[name] = parse_json_or(&text, json!({}));
        }
    }

    let spec = RequestSpec::post(format!("{path}/rules")).with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete_rule(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (policy_id, path) = policy_path(params, "policyIdForRule")?;
    let rule_id = params.string("ruleId")?;
    transport
        .request(&RequestSpec::delete(format!("{path}/rules/{}", segment(&rule_id))))
        .await?;
    Ok(ack(&[("policyId", policy_id.as_str()), ("ruleId", rule_id.as_str())]))
}
