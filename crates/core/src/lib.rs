//! # Lodestar Core
//!
//! Domain types, traits, and error definitions for the Lodestar productivity
//! coordinator. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the model
//! endpoint (`Provider`), the backing store (`ProductivityQueries` plus the
//! mutation traits), the profile fetcher (`ProfileSource`), and the identity
//! provider (`IdentityProvider`). Implementations live in their respective
//! crates and are injected where they are used — there are no global
//! clients.

pub mod error;
pub mod identity;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AuthError, Error, ProviderError, Result, StoreError};
pub use identity::{IdentityProvider, UserId};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition};
pub use store::{
    GoalActions, GoalSummary, MilestoneActions, MilestoneSummary, ProductivityQueries,
    ProfileSource, TaskActions, TaskSummary,
};
pub use tool::{ToolCallRequest, ToolCallResult, ToolStatus};
