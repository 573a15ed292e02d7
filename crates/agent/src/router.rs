//! Transport routing — per-message path selection and event streaming.
//!
//! A lowercased keyword scan picks the path: any mutation-intent keyword
//! selects the tool-calling path, everything else streams conversationally.
//! The scan is a heuristic, not a guarantee — a false negative just yields
//! a text answer with no side effect, a false positive costs one extra
//! round-trip of unused tool definitions. `needs_tools` is the seam to
//! swap in a model-based intent classifier without touching anything else.
//!
//! Either path emits the same event grammar: zero or more `progress`
//! (tool path only), one or more `chunk`, then exactly one `done` or
//! `error`.

use crate::context::{ContextAssembler, format_snapshot};
use crate::orchestrator::Coordinator;
use chrono::Utc;
use lodestar_core::error::ProviderError;
use lodestar_core::identity::UserId;
use lodestar_core::message::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Words whose presence suggests the message wants a mutation.
pub const MUTATION_KEYWORDS: &[&str] = &[
    "add", "create", "delete", "remove", "update", "mark", "complete", "finish", "done",
];

/// Whether a message likely needs mutating tool calls.
pub fn needs_tools(message: &str) -> bool {
    let lowered = message.to_lowercase();
    MUTATION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Server-push events emitted to the transport, in order: optional
/// `progress`, one or more `chunk`, one terminal `done`/`error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// Work is underway on the tool path.
    Progress { content: String },
    /// Partial or complete response text.
    Chunk { content: String },
    /// Terminal: the turn completed.
    Done,
    /// Terminal: the turn failed.
    Error { content: String },
}

impl TransportEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Chunk { .. } => "chunk",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Routes each inbound message to the streaming or tool-calling path and
/// emits the transport event sequence.
pub struct MessageRouter {
    coordinator: Arc<Coordinator>,
    assembler: Arc<ContextAssembler>,
    chunk_size: usize,
}

impl MessageRouter {
    pub fn new(coordinator: Arc<Coordinator>, assembler: Arc<ContextAssembler>) -> Self {
        Self {
            coordinator,
            assembler,
            chunk_size: 400,
        }
    }

    /// Size of the synthesized chunks on the tool path, in characters.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Handle one message. Events arrive on the returned receiver; dropping
    /// it stops further emission (in-flight tool execution still completes).
    pub fn route(
        &self,
        user: UserId,
        history: Vec<Message>,
        message: String,
    ) -> mpsc::Receiver<TransportEvent> {
        let (tx, rx) = mpsc::channel(32);
        let coordinator = self.coordinator.clone();
        let assembler = self.assembler.clone();
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let tool_path = needs_tools(&message);
            debug!(user = %user, tool_path, "Routing inbound message");

            let snapshot = assembler.assemble(&user, Utc::now()).await;
            let context = format_snapshot(&snapshot);

            if tool_path {
                run_tool_path(coordinator, tx, user, history, message, context, chunk_size).await;
            } else {
                run_streaming_path(coordinator, tx, history, message, context).await;
            }
        });

        rx
    }
}

/// Two sequential whole-response model calls, then the final text sliced
/// into fixed-size chunks. The slicing is presentation only — there is no
/// true incremental output on this path.
async fn run_tool_path(
    coordinator: Arc<Coordinator>,
    tx: mpsc::Sender<TransportEvent>,
    user: UserId,
    history: Vec<Message>,
    message: String,
    context: String,
    chunk_size: usize,
) {
    if tx
        .send(TransportEvent::Progress {
            content: "Reviewing your plan and applying changes...".into(),
        })
        .await
        .is_err()
    {
        return; // client disconnected before work started
    }

    match coordinator
        .respond(&user, &history, &message, Some(&context))
        .await
    {
        Ok(outcome) => {
            info!(
                user = %user,
                tool_calls = outcome.tool_calls.len(),
                "Tool path turn complete"
            );
            for piece in chunk_text(&outcome.response, chunk_size) {
                if tx.send(TransportEvent::Chunk { content: piece }).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(TransportEvent::Done).await;
        }
        Err(e) => {
            let _ = tx
                .send(TransportEvent::Error {
                    content: user_facing_error(&e),
                })
                .await;
        }
    }
}

/// True incremental delivery: each provider delta is forwarded as its own
/// chunk event as it arrives.
async fn run_streaming_path(
    coordinator: Arc<Coordinator>,
    tx: mpsc::Sender<TransportEvent>,
    history: Vec<Message>,
    message: String,
    context: String,
) {
    let mut chunks = match coordinator
        .respond_stream(&history, &message, Some(&context))
        .await
    {
        Ok(chunks) => chunks,
        Err(e) => {
            let _ = tx
                .send(TransportEvent::Error {
                    content: user_facing_error(&e),
                })
                .await;
            return;
        }
    };

    let mut emitted = false;
    while let Some(item) = chunks.recv().await {
        match item {
            Ok(chunk) => {
                if let Some(content) = chunk.content {
                    if !content.is_empty() {
                        emitted = true;
                        if tx.send(TransportEvent::Chunk { content }).await.is_err() {
                            return; // client disconnected
                        }
                    }
                }
                if chunk.done {
                    break;
                }
            }
            Err(e) => {
                let _ = tx
                    .send(TransportEvent::Error {
                        content: user_facing_error(&e),
                    })
                    .await;
                return;
            }
        }
    }

    // The grammar promises at least one chunk before the terminal event.
    if !emitted {
        let _ = tx
            .send(TransportEvent::Chunk {
                content: String::new(),
            })
            .await;
    }
    let _ = tx.send(TransportEvent::Done).await;
}

/// Slice text into fixed-size pieces on char boundaries. Empty text yields
/// a single empty chunk so the event grammar holds.
fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if current.chars().count() >= chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Map an upstream failure to a non-leaking user-facing message. Rate
/// limits get a distinct, reassuring wording.
fn user_facing_error(error: &ProviderError) -> String {
    match error {
        ProviderError::RateLimited { .. } => {
            "The assistant is receiving too many requests right now. Please try again in a \
             moment — if you asked for a change, re-check your tasks before retrying."
                .into()
        }
        _ => "The assistant is temporarily unavailable. Please try again.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection() {
        assert!(needs_tools("Add a task to buy milk"));
        assert!(needs_tools("please DELETE the report task"));
        assert!(needs_tools("mark it as finished"));
        assert!(!needs_tools("what should I focus on today?"));
        assert!(!needs_tools("how is my week going?"));
    }

    #[test]
    fn keyword_scan_is_substring_based() {
        // Known trade-off: "complete" inside a question still routes to the
        // tool path; the model simply won't call a tool.
        assert!(needs_tools("should I complete my degree this year?"));
    }

    #[test]
    fn event_serialization() {
        let event = TransportEvent::Chunk {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"chunk""#));
        assert!(json.contains(r#""content":"Hello""#));

        let done = serde_json::to_string(&TransportEvent::Done).unwrap();
        assert!(done.contains(r#""type":"done""#));
    }

    #[test]
    fn event_deserialization() {
        let event: TransportEvent =
            serde_json::from_str(r#"{"type":"error","content":"boom"}"#).unwrap();
        match event {
            TransportEvent::Error { content } => assert_eq!(content, "boom"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            TransportEvent::Progress { content: "x".into() }.event_type(),
            "progress"
        );
        assert_eq!(
            TransportEvent::Chunk { content: "x".into() }.event_type(),
            "chunk"
        );
        assert_eq!(TransportEvent::Done.event_type(), "done");
        assert_eq!(
            TransportEvent::Error { content: "x".into() }.event_type(),
            "error"
        );
    }

    #[test]
    fn chunking_covers_whole_text() {
        let text = "abcdefghij".repeat(10); // 100 chars
        let pieces = chunk_text(&text, 33);
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces.concat(), text);
        assert!(pieces[..3].iter().all(|p| p.chars().count() == 33));
    }

    #[test]
    fn chunking_respects_char_boundaries() {
        let text = "héllo wörld ".repeat(20);
        let pieces = chunk_text(&text, 7);
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        let pieces = chunk_text("", 100);
        assert_eq!(pieces, vec![String::new()]);
    }

    #[test]
    fn rate_limit_gets_distinct_message() {
        let message = user_facing_error(&ProviderError::RateLimited { retry_after_secs: 5 });
        assert!(message.contains("too many requests"));

        let generic = user_facing_error(&ProviderError::Network("10.0.0.5 refused".into()));
        assert!(!generic.contains("10.0.0.5"));
    }
}
