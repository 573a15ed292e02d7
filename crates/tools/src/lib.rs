//! Tool registry and executor for the Lodestar coordinator.
//!
//! The registry ([`catalog`]) is pure metadata: a closed set of tool names
//! with schemas and usage guidance for the model. The executor routes
//! model-proposed calls to the backing store operations under the
//! authenticated identity.

pub mod catalog;
pub mod executor;

pub use catalog::ToolName;
pub use executor::ToolExecutor;
