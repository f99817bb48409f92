//! # Oktaflow Node
//!
//! Workflow-node surface over the Okta management API.
//!
//! ## Overview
//!
//! - **Ten resources** (users, groups, applications, policies, authorization
//!   servers, identity providers, system log, network zones, event hooks, factors)
//! - **Operation registry** keyed by `(resource, operation)`
//! - **Per-item execution** with credential lookup and `continue_on_fail`
//! - **Event-hook trigger** handling Okta's verification challenge and deliveries
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Node error categories |
//! | [`node`] | Per-item execution |
//! | [`operations`] | One module per resource |
//! | [`parameters`] | Typed access to an item's node parameters |
//! | [`registry`] | `(resource, operation)` → handler table |
//! | [`resource`] | Resource identifiers |
//! | [`trigger`] | Event-hook webhook receiver |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oktaflow_core::EnvCredentialStore;
//! use oktaflow_node::{OktaNode, Parameters};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = OktaNode::new(Arc::new(EnvCredentialStore));
//!     let items = [Parameters::from_json(json!({ "returnAll": true }))?];
//!
//!     for item in node.execute("group", "getAll", &items, false).await? {
//!         println!("{}", item.json);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod node;
pub mod operations;
pub mod parameters;
pub mod registry;
pub mod resource;
pub mod trigger;

pub use error::NodeError;
pub use node::{ExecutionItem, OktaNode};
pub use parameters::{Fields, Parameters, DEFAULT_RESULT_LIMIT};
pub use registry::{Handler, OperationFuture, OperationRegistry};
pub use resource::Resource;
pub use trigger::{OktaTrigger, WebhookOutcome, WebhookRequest, WebhookResponse};
