//! Identity providers and linked users (`/idps`).

use oktaflow_core::transport::Query;
use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Value};

use super::{ack, copy_into_query, segment};
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::IdentityProvider;
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "getLinkedUsers", handler!(get_linked_users));
    registry.register(resource, "linkUser", handler!(link_user));
    registry.register(resource, "unlinkUser", handler!(unlink_user));
}

fn idp_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let idp_id = params.string("idpId")?;
    let path = format!("/idps/{}", segment(&idp_id));
    Ok((idp_id, path))
}

fn linked_user_path(params: &Parameters) -> Result<(String, String, String), NodeError> {
    let (idp_id, path) = idp_path(params)?;
    let user_id = params.string("userId")?;
    let path = format!("{path}/users/{}", segment(&user_id));
    Ok((idp_id, user_id, path))
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = idp_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut query = Query::new();
    copy_into_query(&filters, &mut query, &["q", "type"]);

    let spec = RequestSpec::get("/idps").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (idp_id, path) = idp_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("idpId", idp_id.as_str())]))
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (idp_id, path) = idp_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/activate")))
        .await?;
    Ok(ack(&[("idpId", idp_id.as_str())]))
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (idp_id, path) = idp_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/deactivate")))
        .await?;
    Ok(ack(&[("idpId", idp_id.as_str())]))
}

pub async fn get_linked_users(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = idp_path(params)?;
    let spec = RequestSpec::get(format!("{path}/users"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn link_user(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, _, path) = linked_user_path(params)?;
    let external_id = params.string("externalId")?;
    let spec = RequestSpec::post(path).with_body(json!({ "externalId": external_id }));
    Ok(vec![transport.request(&spec).await?])
}

pub async fn unlink_user(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (idp_id, user_id, path) = linked_user_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("idpId", idp_id.as_str()), ("userId", user_id.as_str())]))
}
