//! Context pipeline: token budgeting, snapshot assembly, and formatting.

pub mod assembler;
pub mod format;
pub mod snapshot;
pub mod token;

pub use assembler::ContextAssembler;
pub use format::format_snapshot;
pub use snapshot::{ContextSnapshot, SnapshotStats, TodayContext, WeeklySummary};
