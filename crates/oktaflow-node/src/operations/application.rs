//! Applications and their user/group assignments (`/apps`).

use oktaflow_core::transport::Query;
use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Map, Value};

use super::{ack, body_or_ack, copy_into_query, parse_json_or, segment};
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::Application;
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "getUsers", handler!(get_users));
    registry.register(resource, "assignUser", handler!(assign_user));
    registry.register(resource, "removeUser", handler!(remove_user));
    registry.register(resource, "getGroups", handler!(get_groups));
    registry.register(resource, "assignGroup", handler!(assign_group));
    registry.register(resource, "removeGroup", handler!(remove_group));
}

fn app_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let app_id = params.string("appId")?;
    let path = format!("/apps/{}", segment(&app_id));
    Ok((app_id, path))
}

fn member_path(params: &Parameters, kind: &str, id_param: &str) -> Result<(String, String, String), NodeError> {
    let (app_id, path) = app_path(params)?;
    let member_id = params.string(id_param)?;
    let path = format!("{path}/{kind}/{}", segment(&member_id));
    Ok((app_id, member_id, path))
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = app_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut query = Query::new();
    copy_into_query(&filters, &mut query, &["filter", "q"]);
    if let Some(status) = filters.text("status") {
        query.insert(String::from("filter"), format!("status eq \"{status}\""));
    }

    let spec = RequestSpec::get("/apps").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, path) = app_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("appId", app_id.as_str())]))
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, path) = app_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/activate")))
        .await?;
    Ok(ack(&[("appId", app_id.as_str())]))
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, path) = app_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/deactivate")))
        .await?;
    Ok(ack(&[("appId", app_id.as_str())]))
}

pub async fn get_users(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = app_path(params)?;
    let spec = RequestSpec::get(format!("{path}/users"));
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn assign_user(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = app_path(params)?;
    let user_id = params.string("userId")?;
    let additional = params.collection("additionalFields")?;

    let mut body = Map::new();
    body.insert(String::from("id"), Value::String(user_id));

    let mut credentials = Map::new();
    if let Some(user_name) = additional.truthy("userName") {
        credentials.insert(String::from("userName"), user_name.clone());
    }
    if let Some(password) = additional.truthy("password") {
        credentials.insert(String::from("password"), json!({ "value": password }));
    }
    if !credentials.is_empty() {
        body.insert(String::from("credentials"), Value::Object(credentials));
    }
    if let Some(profile) = additional.text("profile") {
        body.insert(String::from("profile"), parse_json_or(&profile, json!({})));
    }

    let spec = RequestSpec::post(format!("{path}/users")).with_body(Value::Object(body));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn remove_user(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, user_id, path) = member_path(params, "users", "userId")?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("appId", app_id.as_str()), ("userId", user_id.as_str())]))
}

pub async fn get_groups(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = app_path(params)?;
    let spec = RequestSpec::get(format!("{path}/groups"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn assign_group(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, group_id, path) = member_path(params, "groups", "groupId")?;
    let body = transport.request(&RequestSpec::put(path)).await?;
    Ok(body_or_ack(
        body,
        &[("appId", app_id.as_str()), ("groupId", group_id.as_str())],
    ))
}

pub async fn remove_group(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (app_id, group_id, path) = member_path(params, "groups", "groupId")?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("appId", app_id.as_str()), ("groupId", group_id.as_str())]))
}
