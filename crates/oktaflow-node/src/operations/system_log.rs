//! System log queries (`/logs`).

use oktaflow_core::transport::Query;
use oktaflow_core::{OktaTransport, RequestSpec};
use serde_json::Value;

use super::copy_into_query;
use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{handler, OperationRegistry};
use crate::resource::Resource;

pub(crate) fn register(registry: &mut OperationRegistry) {
    registry.register(Resource::SystemLog, "getAll", handler!(get_all));
    registry.register(Resource::SystemLog, "search", handler!(search));
}

pub async fn get_all(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("filters")?;
    let mut query = Query::new();
    copy_into_query(&filters, &mut query, &["since", "until", "filter", "q", "sortOrder"]);

    let spec = RequestSpec::get("/logs").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}

pub async fn search(transport: &OktaTransport, params: &Parameters) -> Result<Vec<Value>, NodeError> {
    let filters = params.collection("additionalFilters")?;
    let mut query = Query::new();
    query.insert(String::from("filter"), params.string("searchFilter")?);
    copy_into_query(&filters, &mut query, &["since", "until", "q", "sortOrder"]);

    let spec = RequestSpec::get("/logs").with_query_map(query);
    Ok(transport
        .request_all_items(&spec, params.collection_limit()?)
        .await?)
}
