//! `(resource, operation)` → handler table.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use oktaflow_core::OktaTransport;
use serde_json::Value;

use crate::error::NodeError;
use crate::operations;
use crate::parameters::Parameters;
use crate::resource::Resource;

/// Future returned by an operation handler.
pub type OperationFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>, NodeError>> + Send + 'a>>;

/// One operation: issues its calls through the transport and returns output items.
pub type Handler = for<'a> fn(&'a OktaTransport, &'a Parameters) -> OperationFuture<'a>;

/// Wraps an `async fn(&OktaTransport, &Parameters) -> Result<Vec<Value>, NodeError>`
/// into a [`Handler`].
macro_rules! handler {
    ($operation:path) => {{
        fn boxed<'a>(
            transport: &'a ::oktaflow_core::OktaTransport,
            params: &'a $crate::parameters::Parameters,
        ) -> $crate::registry::OperationFuture<'a> {
            Box::pin($operation(transport, params))
        }
        boxed as $crate::registry::Handler
    }};
}
pub(crate) use handler;

/// Handlers keyed by resource, then by operation name.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: BTreeMap<Resource, BTreeMap<&'static str, Handler>>,
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.handlers
                    .iter()
                    .map(|(resource, operations)| (resource, operations.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}

impl OperationRegistry {
    /// Empty registry, for hosts assembling their own operation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in Okta operation.
    pub fn okta() -> Self {
        let mut registry = Self::new();
        operations::register_all(&mut registry);
        registry
    }

    /// Adds `handler` under `(resource, operation)`, replacing any earlier one.
    pub fn register(&mut self, resource: Resource, operation: &'static str, handler: Handler) {
        self.handlers
            .entry(resource)
            .or_default()
            .insert(operation, handler);
    }

    /// Resolves the handler for `operation` on `resource`.
    ///
    /// # Returns
    ///
    /// The handler, or [`NodeError::UnsupportedOperation`] when none is registered.
    pub fn lookup(&self, resource: Resource, operation: &str) -> Result<Handler, NodeError> {
        self.handlers
            .get(&resource)
            .and_then(|operations| operations.get(operation))
            .copied()
            .ok_or_else(|| NodeError::UnsupportedOperation {
                resource: resource.to_string(),
                operation: operation.to_owned(),
            })
    }

    /// Operation names registered for `resource`, in name order.
    pub fn operations(&self, resource: Resource) -> Vec<&'static str> {
        self.handlers
            .get(&resource)
            .map(|operations| operations.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of registered operations across all resources.
    pub fn len(&self) -> usize {
        self.handlers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_resource_has_operations() {
        let registry = OperationRegistry::okta();

        for resource in Resource::ALL {
            assert!(
                !registry.operations(resource).is_empty(),
                "{resource} has no operations"
            );
        }
    }

    #[test]
    fn registry_covers_the_full_operation_surface() {
        let registry = OperationRegistry::okta();

        assert_eq!(registry.operations(Resource::User).len(), 18);
        assert_eq!(registry.operations(Resource::Group).len(), 9);
        assert_eq!(registry.operations(Resource::Application).len(), 11);
        assert_eq!(registry.operations(Resource::Policy).len(), 10);
        assert_eq!(registry.operations(Resource::AuthServer).len(), 11);
        assert_eq!(registry.operations(Resource::IdentityProvider).len(), 8);
        assert_eq!(registry.operations(Resource::SystemLog).len(), 2);
        assert_eq!(registry.operations(Resource::NetworkZone).len(), 5);
        assert_eq!(registry.operations(Resource::EventHook).len(), 8);
        assert_eq!(registry.operations(Resource::Factor).len(), 8);
        assert_eq!(registry.len(), 90);
    }

    #[test]
    fn unknown_operation_is_unsupported() {
        let registry = OperationRegistry::okta();

        let error = registry
            .lookup(Resource::SystemLog, "delete")
            .err()
            .expect("system log has no delete");

        assert_eq!(
            error,
            NodeError::UnsupportedOperation {
                resource: String::from("systemLog"),
                operation: String::from("delete"),
            }
        );
    }

    async fn canned(_: &OktaTransport, _: &Parameters) -> Result<Vec<Value>, NodeError> {
        Ok(vec![Value::from("canned")])
    }

    #[test]
    fn operation_names_are_scoped_to_their_resource() {
        let mut registry = OperationRegistry::new();
        registry.register(Resource::Group, "get", handler!(canned));

        assert!(registry.lookup(Resource::Group, "get").is_ok());
        assert!(registry.lookup(Resource::User, "get").is_err());
        assert_eq!(registry.operations(Resource::Group), vec!["get"]);
        assert!(registry.operations(Resource::User).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_registry_reports_empty() {
        let registry = OperationRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.lookup(Resource::Factor, "getAll").is_err());
    }

    #[test]
    fn known_operation_resolves() {
        assert!(OperationRegistry::okta().lookup(Resource::User, "getAll").is_ok());
    }
}
