//! Per-item execution of one `(resource, operation)` pair.

use std::sync::Arc;

use oktaflow_core::{CredentialStore, HttpClient, OktaTransport, RateLimitRetry, ReqwestHttpClient, CREDENTIAL_NAME};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::NodeError;
use crate::parameters::Parameters;
use crate::registry::{Handler, OperationRegistry};
use crate::resource::Resource;

/// One output item, tagged with the index of the input item that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionItem {
    pub json: Value,
    pub paired_item: usize,
}

impl ExecutionItem {
    pub fn new(json: Value, paired_item: usize) -> Self {
        Self { json, paired_item }
    }
}

/// The Okta node: resolves credentials, dispatches operations and collects output items.
pub struct OktaNode {
    store: Arc<dyn CredentialStore>,
    http_client: Arc<dyn HttpClient>,
    registry: OperationRegistry,
    retry: Option<RateLimitRetry>,
}

impl std::fmt::Debug for OktaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OktaNode")
            .field("registry", &self.registry)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OktaNode {
    /// Node using the reqwest client and the built-in operation registry.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_http_client(store, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(store: Arc<dyn CredentialStore>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            store,
            http_client,
            registry: OperationRegistry::okta(),
            retry: None,
        }
    }

    /// Wraps every Okta call issued by this node in the given 429 retry policy.
    pub fn with_rate_limit_retry(mut self, policy: RateLimitRetry) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn with_registry(mut self, registry: OperationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Runs `operation` on `resource` once per input item.
    ///
    /// The handler is resolved before any item runs, so an unknown resource or
    /// operation fails the whole execution. Per-item failures become
    /// `{"error": <message>}` items when `continue_on_fail` is set and abort
    /// the execution otherwise.
    pub async fn execute(
        &self,
        resource: &str,
        operation: &str,
        items: &[Parameters],
        continue_on_fail: bool,
    ) -> Result<Vec<ExecutionItem>, NodeError> {
        let resource: Resource = resource.parse()?;
        let handler = self
            .registry
            .lookup(resource, operation)
            .inspect_err(|error| warn!(%resource, operation, %error, "no handler registered"))?;

        let mut output = Vec::new();
        for (index, params) in items.iter().enumerate() {
            match self.run_item(handler, params).await {
                Ok(values) => {
                    debug!(%resource, operation, item = index, produced = values.len(), "operation finished");
                    output.extend(values.into_iter().map(|value| ExecutionItem::new(value, index)));
                }
                Err(error) if continue_on_fail => {
                    warn!(%resource, operation, item = index, error = %error, "operation failed; continuing");
                    output.push(ExecutionItem::new(json!({ "error": error.to_string() }), index));
                }
                Err(error) => return Err(error),
            }
        }
        Ok(output)
    }

    async fn run_item(&self, handler: Handler, params: &Parameters) -> Result<Vec<Value>, NodeError> {
        let transport = self.transport()?;
        handler(&transport, params).await
    }

    fn transport(&self) -> Result<OktaTransport, NodeError> {
        let credential = self.store.credential(CREDENTIAL_NAME)?;
        let transport = OktaTransport::new(credential, Arc::clone(&self.http_client))?;
        Ok(match self.retry {
            Some(policy) => transport.with_rate_limit_retry(policy),
            None => transport,
        })
    }
}
