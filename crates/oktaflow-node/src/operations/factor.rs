//! MFA factors enrolled on a user (`/users/{id}/factors`).

use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Map, Value};

use super::segment;
use crate::error::NodeError;
use crate::parameters::{Fields, Parameters};
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

const PROFILE_FIELDS: [&str; 4] = ["phoneNumber", "email", "question", "answer"];

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::Factor;
    registry.register(resource, "getSupported", handler!(get_supported));
    registry.register(resource, "getUserFactors", handler!(get_user_factors));
    registry.register(resource, "enroll", handler!(enroll));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "verify", handler!(verify));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "reset", handler!(reset));
    registry.register(resource, "getSecurityQuestions", handler!(get_security_questions));
}

fn factors_path(user_id: &str) -> String {
    format!("/users/{}/factors", segment(user_id))
}

fn factor_path(params: &Parameters) -> Result<(String, String, String), NodeError> {
    let user_id = params.string("userIdForFactor")?;
    let factor_id = params.string("factorId")?;
    let path = format!("{}/{}", factors_path(&user_id), segment(&factor_id));
    Ok((user_id, factor_id, path))
}

/// Copies the truthy `names` out of `fields`; `None` when nothing was set.
fn pick(fields: &Fields, names: &[&str]) -> Option<Value> {
    let picked: Map<String, Value> = names
        .iter()
        .filter_map(|name| fields.truthy(name).map(|value| ((*name).to_owned(), value.clone())))
        .collect();
    (!picked.is_empty()).then_some(Value::Object(picked))
}

async fn list_for_user(
    transport: &OktaTransport,
    params: &Parameters,
    suffix: &str,
) -> Result<Vec<Value>, NodeError> {
    let user_id = params.string("userId")?;
    let spec = RequestSpec::get(format!("{}{suffix}", factors_path(&user_id)));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn get_supported(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    list_for_user(transport, params, "/catalog").await
}

pub async fn get_user_factors(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    list_for_user(transport, params, "").await
}

pub async fn get_security_questions(
    transport: &OktaTransport,
    params: &Parameters,
) -> Result<Vec<Value>, NodeError> {
    list_for_user(transport, params, "/questions").await
}

pub async fn enroll(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let user_id = params.string("userId")?;
    let additional = params.collection("additionalFields")?;

    let mut body = json!({
        "factorType": params.string("factorType")?,
        "provider": params.string("provider")?,
    });
    if let Some(profile) = pick(&additional, &PROFILE_FIELDS) {
        body["profile"] = profile;
    }

    let spec = RequestSpec::post(factors_path(&user_id)).with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, _, path) = factor_path(params)?;
    let mut spec = RequestSpec::post(format!("{path}/lifecycle/activate"));
    if let Some(pass_code) = params.optional_string("passCode") {
        spec = spec.with_body(json!({ "passCode": pass_code }));
    }
    Ok(vec![transport.request(&spec).await?])
}

pub async fn verify(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, _, path) = factor_path(params)?;
    let options = params.collection("verificationOptions")?;
    let mut spec = RequestSpec::post(format!("{path}/verify"));
    if let Some(body) = pick(&options, &["passCode", "answer"]) {
        spec = spec.with_body(body);
    }
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (user_id, factor_id, path) = factor_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(super::ack(&[("userId", user_id.as_str()), ("factorId", factor_id.as_str())]))
}

pub async fn reset(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let user_id = params.string("userId")?;
    let spec = RequestSpec::post(format!("/users/{}/lifecycle/reset_factors", segment(&user_id)));
    transport.request(&spec).await?;
    Ok(vec![json!({ "success": true, "userId": user_id, "message": "All factors reset" })])
}
