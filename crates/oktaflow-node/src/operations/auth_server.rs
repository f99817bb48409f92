//! Custom authorization servers, their scopes and claims (`/authorizationServers`).

use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::{json, Value};

use super::{ack, segment};
use crate::error::NodeError;
use crate::parameters::{split_list, Parameters};
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    let resource = Resource::AuthServer;
    registry.register(resource, "create", handler!(create));
    registry.register(resource, "get", handler!(get));
    registry.register(resource, "getAll", handler!(get_all));
    registry.register(resource, "update", handler!(update));
    registry.register(resource, "delete", handler!(delete));
    registry.register(resource, "activate", handler!(activate));
    registry.register(resource, "deactivate", handler!(deactivate));
    registry.register(resource, "getScopes", handler!(get_scopes));
    registry.register(resource, "createScope", handler!(create_scope));
    registry.register(resource, "getClaims", handler!(get_claims));
    registry.register(resource, "createClaim", handler!(create_claim));
}

fn server_path(params: &Parameters) -> Result<(String, String), NodeError> {
    let server_id = params.string("authServerId")?;
    let path = format!("/authorizationServers/{}", segment(&server_id));
    Ok((server_id, path))
}

pub async fn create(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let body = json!({
        "name": params.string("name")?,
        "audiences": split_list(&params.string("audiences")?),
        "description": params.string_or("description", ""),
    });
    let spec = RequestSpec::post("/authorizationServers").with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    Ok(vec![transport.request(&RequestSpec::get(path)).await?])
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let spec = RequestSpec::get("/authorizationServers");
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

/// Reads the current server and writes it back with the requested changes.
pub async fn update(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    let fields = params.collection("updateFields")?;

    let mut server = transport.request(&RequestSpec::get(path.as_str())).await?;
    if let Value::Object(current) = &mut server {
        if let Some(name) = fields.truthy("name") {
            current.insert(String::from("name"), name.clone());
        }
        if let Some(description) = fields.present("description") {
            current.insert(String::from("description"), description.clone());
        }
        if let Some(audiences) = fields.text("audiences") {
            current.insert(String::from("audiences"), json!(split_list(&audiences)));
        }
    }

    let spec = RequestSpec::put(path).with_body(server);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn delete(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (server_id, path) = server_path(params)?;
    transport.request(&RequestSpec::delete(path)).await?;
    Ok(ack(&[("authServerId", server_id.as_str())]))
}

pub async fn activate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (server_id, path) = server_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/activate")))
        .await?;
    Ok(ack(&[("authServerId", server_id.as_str())]))
}

pub async fn deactivate(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (server_id, path) = server_path(params)?;
    transport
        .request(&RequestSpec::post(format!("{path}/lifecycle/deactivate")))
        .await?;
    Ok(ack(&[("authServerId", server_id.as_str())]))
}

pub async fn get_scopes(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    let spec = RequestSpec::get(format!("{path}/scopes"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn create_scope(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    let body = json!({
        "name": params.string("scopeName")?,
        "description": params.string_or("scopeDescription", ""),
        "consent": params.string_or("consent", "IMPLICIT"),
    });
    let spec = RequestSpec::post(format!("{path}/scopes")).with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

pub async fn get_claims(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    let spec = RequestSpec::get(format!("{path}/claims"));
    Ok(transport.request_all_items(&spec, None).await?)
}

pub async fn create_claim(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let (_, path) = server_path(params)?;
    let body = json!({
        "name": params.string("claimName")?,
        "claimType": params.string_or("claimType", "RESOURCE"),
        "valueType": params.string_or("valueType", "EXPRESSION"),
        "value": params.string("claimValue")?,
        "status": "ACTIVE",
    });
    let spec = RequestSpec::post(format!("{path}/claims")).with_body(body);
    Ok(vec![transport.request(&spec).await?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::testing::{params, scripted, BASE};

    #[tokio::test]
    async fn create_splits_audiences() {
        let (transport, client) = scripted(vec![json!({ "id": "aus1" })]);
        let params = params(json!({ "name": "api", "audiences": "api://a, api://b" }));

        create(&transport, &params).await.expect("create succeeds");

        assert_eq!(
            client.requests()[0].body,
            Some(json!({ "name": "api", "audiences": ["api://a", "api://b"], "description": "" }))
        );
    }

    #[tokio::test]
    async fn update_replaces_audiences_on_current_server() {
        let (transport, client) = scripted(vec![
            json!({ "id": "aus1", "name": "api", "audiences": ["old"], "issuer": "https://x" }),
            json!({ "id": "aus1" }),
        ]);
        let params = params(json!({ "authServerId": "aus1", "updateFields": { "audiences": "new1,new2" } }));

        update(&transport, &params).await.expect("update succeeds");

        assert_eq!(
            client.requests()[1].body,
            Some(json!({
                "id": "aus1",
                "name": "api",
                "audiences": ["new1", "new2"],
                "issuer": "https://x"
            }))
        );
    }

    #[tokio::test]
    async fn create_claim_is_active_with_defaults() {
        let (transport, client) = scripted(vec![json!({ "id": "ocl1" })]);
        let params = params(json!({
            "authServerId": "aus1",
            "claimName": "groups",
            "claimValue": "user.groups"
        }));

        create_claim(&transport, &params).await.expect("create claim succeeds");

        let request = &client.requests()[0];
        assert_eq!(request.url, format!("{BASE}/authorizationServers/aus1/claims"));
        assert_eq!(
            request.body,
            Some(json!({
                "name": "groups",
                "claimType": "RESOURCE",
                "valueType": "EXPRESSION",
                "value": "user.groups",
                "status": "ACTIVE"
            }))
        );
    }

    #[tokio::test]
    async fn create_scope_defaults_to_implicit_consent() {
        let (transport, client) = scripted(vec![json!({ "id": "scp1" })]);
        let params = params(json!({ "authServerId": "aus1", "scopeName": "read:all" }));

        create_scope(&transport, &params).await.expect("create scope succeeds");

        assert_eq!(client.requests()[0].body.as_ref().map(|b| &b["consent"]), Some(&json!("IMPLICIT")));
    }
}
