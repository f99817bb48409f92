//! Groups and group membership (`/groups`).

use oktaflow_core::transport::Query;
use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Map, Value};

use super::{ack, copy_into_query, segment};
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::Group;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "getMembers", handler!(get_members));
    registry.register(resource, "addMember", handler!(add_member));
    registry.register(resource, "removeMember", handler!(remove_member));
    registry.register(resource, "getApps", handler!(get_apps));
}

fn group_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let group_id = params.string("groupId")?;
    let path = format!("/groups/{}", segment(&group_id));
    Ok((group_id, path))
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let name = params.string("name")?;
    let description = params.string_or("description", "");
    let spec = RequestSpec::post("/groups")
        .with_body(json!({ "profile": { "name": name, "description": description } }));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = group_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut query = Query::new();
    copy_into_query(&filters, &mut query, &["filter", "q"]);
    if let Some(kind) = filters.text("type") {
        query.insert(String::from("filter"), format!("type eq \"{kind}\""));
    }

    let spec = RequestSpec::get("/groups").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = group_path(params)?;
    let fields = params.collection("updateFields")?;

    let mut profile = Map::new();
    if let Some(name) = fields.truthy("name") {
        profile.insert(String::from("name"), name.clone());
    }
    if let Some(description) = fields.present("description") {
        profile.insert(String::from("description"), description.clone());
    }

    let spec = RequestSpec::put(path).with_body(json!({ "profile": profile }));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (group_id, path) = group_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("groupId", group_id.as_str())]))
}

pub async fn get_members(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = group_path(params)?;
    let spec = RequestSpec::get(format!("{path}/users"));
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

fn membership(params: &Parameters) -> Result<(String, String, String), NodeError> {
    let (group_id, path) = group_path(params)?;
    let user_id = params.string("userId")?;
    let path = format!("{path}/users/{}", segment(&user_id));
    Ok((group_id, user_id, path))
}

pub async fn add_member(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (group_id, user_id, path) = membership(params)?;
    transport.request(&RequestSpec::put(path)).await?;
    Ok(ack(&[("groupId", group_id.as_str()), ("userId", user_id.as_str())]))
}

pub async fn remove_member(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (group_id, user_id, path) = membership(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("groupId", group_id.as_str()), ("userId", user_id.as_str())]))
}

pub async fn get_apps(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = group_path(params)?;
    let spec = RequestSpec::get(format!("{path}/apps"));
    Ok(transport.request_all_items(&spec, None).await?)
}
