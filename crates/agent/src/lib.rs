//! The Lodestar coordinator core.
//!
//! One inbound message flows through four stages:
//!
//! 1. **Route** ([`router`]) — a keyword scan decides whether the message
//!    likely needs mutating tool calls (tool path) or just conversation
//!    (streaming path).
//! 2. **Assemble** ([`context`]) — five concurrent store queries build a
//!    bounded [`ContextSnapshot`] of the user's tasks, goals, milestones,
//!    deadlines, and weekly progress; any single source may fail without
//!    aborting assembly.
//! 3. **Coordinate** ([`orchestrator`]) — one model call, and if the model
//!    proposes tool calls, one executor pass plus one follow-up model call.
//!    Never more than one tool round-trip.
//! 4. **Emit** — the router turns the outcome into a `progress`/`chunk`/
//!    `done`/`error` event stream for the transport.

pub mod context;
pub mod orchestrator;
pub mod prompt;
pub mod router;

pub use context::{
    ContextAssembler, ContextSnapshot, TodayContext, WeeklySummary, format_snapshot,
};
pub use orchestrator::{Coordinator, TurnOutcome};
pub use router::{MessageRouter, TransportEvent, needs_tools};
