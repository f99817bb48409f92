//! User lifecycle, credentials and memberships (`/users`).

use oktaflow_core::transport::Query;
use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Map, Value};

use super::{ack, body_or_ack, copy_into_query, segment};
use crate::error::NodeError;
use crate::parameters::{split_list, Parameters};
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

/// Optional profile attributes copied from `additionalFields` on create.
const PROFILE_FIELDS: [&str; 22] = [
    "mobilePhone",
    "secondEmail",
    "displayName",
    "nickName",
    "profileUrl",
    "title",
    "employeeNumber",
    "costCenter",
    "organization",
    "division",
    "department",
    "managerId",
    "manager",
    "streetAddress",
    "city",
    "state",
    "zipCode",
    "countryCode",
    "preferredLanguage",
    "locale",
    "timezone",
    "userType",
];

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::User;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "suspend", handler!(suspend));
    registry.register(resource, "unsuspend", handler!(unsuspend));
    registry.register(resource, "unlock", handler!(unlock));
    registry.register(resource, "resetPassword", handler!(reset_password));
    registry.register(resource, "setPassword", handler!(set_password));
    registry.register(resource, "expirePassword", handler!(expire_password));
    registry.register(resource, "clearSessions", handler!(clear_sessions));
    registry.register(resource, "getGroups", handler!(get_groups));
    registry.register(resource, "getApps", handler!(get_apps));
    registry.register(resource, "getFactors", handler!(get_factors));
    registry.register(resource, "resetFactors", handler!(reset_factors));
}

fn user_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let user_id = params.string("userId")?;
    let path = format!("/users/{}", segment(&user_id));
    Ok((user_id, path))
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let additional = params.collection("additionalFields")?;

    let mut profile = Map::new();
    for name in ["firstName", "lastName", "email", "login"] {
        profile.insert(name.to_owned(), Value::String(params.string(name)?));
    }
    for name in PROFILE_FIELDS {
        if let Some(value) = additional.truthy(name) {
            profile.insert(name.to_owned(), value.clone());
        }
    }

    let mut credentials = Map::new();
    if let Some(password) = additional.truthy("password") {
        credentials.insert(String::from("password"), json!({ "value": password }));
    }
    if let (Some(question), Some(answer)) = (
        additional.truthy("recoveryQuestion"),
        additional.truthy("recoveryAnswer"),
    ) {
        credentials.insert(
            String::from("recovery_question"),
            json!({ "question": question, "answer": answer }),
        );
    }

    let mut body = Map::new();
    body.insert(String::from("profile"), Value::Object(profile));
    if !credentials.is_empty() {
        body.insert(String::from("credentials"), Value::Object(credentials));
    }
    if let Some(group_ids) = additional.text("groupIds") {
        body.insert(String::from("groupIds"), json!(split_list(&group_ids)));
    }

    let mut spec = RequestSpec::post("/users").with_body(Value::Object(body));
    match params.string_or("activate", "true").as_str() {
        "true" => spec = spec.with_query("activate", "true"),
        "sendEmail" => {
            spec = spec
                .with_query("activate", "true")
                .with_query("sendEmail", "true");
        }
        _ => {}
    }

    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut query = Query::new();
    copy_into_query(&filters, &mut query, &["filter", "search", "q"]);
    if let Some(status) = filters.text("status") {
        query.insert(String::from("filter"), format!("status eq \"{status}\""));
    }

    let spec = RequestSpec::get("/users").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    let fields = params.collection("updateFields")?;
    let profile: Map<String, Value> = fields
        .iter()
        .filter(|(_, value)| !value.is_null() && value.as_str() != Some(""))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let spec = RequestSpec::post(path).with_body(json!({ "profile": profile }));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (user_id, path) = user_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("userId", user_id.as_str())]))
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (user_id, path) = user_path(params)?;
    let send_email = params.bool_or("sendEmail", true);
    let spec = RequestSpec::post(format!("{path}/lifecycle/activate"))
        .with_query("sendEmail", send_email.to_string());

    let body = transport.request(&spec).await?;
    Ok(body_or_ack(body, &[("userId", user_id.as_str())]))
}

async fn lifecycle_ack(
    transport: &OktaTransport,
    params: &Parameters,
    action: &str,
) -> Result<Vec<Value>, NodeError> {
    let (user_id, path) = user_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/{action}")))
        .await?;
    Ok(ack(&[("userId", user_id.as_str())]))
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle_ack(transport, params, "deactivate").await
}

pub async fn suspend(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle_ack(transport, params, "suspend").await
}

pub async fn unsuspend(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle_ack(transport, params, "unsuspend").await
}

pub async fn unlock(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle_ack(transport, params, "unlock").await
}

pub async fn reset_factors(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    lifecycle_ack(transport, params, "reset_factors").await
}

pub async fn reset_password(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    let spec = RequestSpec::post(format!("{path}/lifecycle/reset_password"))
        .with_query("sendEmail", "true");
    Ok(vec![transport.request(&spec).await?])
}

pub async fn set_password(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    let password = params.string("password")?;
    let spec = RequestSpec::put(path)
        .with_body(json!({ "credentials": { "password": { "value": password } } }));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn expire_password(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    let spec = RequestSpec::post(format!("{path}/lifecycle/expire_password"));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn clear_sessions(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (user_id, path) = user_path(params)?;
    transport
        .request(&RequestSpec::delete(format!("{path}/sessions")))
        .await?;
    Ok(ack(&[("userId", user_id.as_str())]))
}

async fn list_under_user(
    transport: &OktaTransport,
    params: &Parameters,
    suffix: &str,
) -> Result<Vec<Value>, NodeError> {
    let (_, path) = user_path(params)?;
    let spec = RequestSpec::get(format!("{path}/{suffix}"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn get_groups(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    list_under_user(transport, params, "groups").await
}

pub async fn get_apps(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    list_under_user(transport, params, "appLinks").await
}

pub async fn get_factors(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    list_under_user(transport, params, "factors").await
}
