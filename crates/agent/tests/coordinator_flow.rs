//! End-to-end turns through the router, coordinator, executor, and the
//! in-memory store, with a scripted model.

use async_trait::async_trait;
use lodestar_agent::context::ContextAssembler;
use lodestar_agent::orchestrator::Coordinator;
use lodestar_agent::router::{MessageRouter, TransportEvent};
use lodestar_core::error::ProviderError;
use lodestar_core::identity::UserId;
use lodestar_core::message::{Message, MessageToolCall};
use lodestar_core::provider::{Provider, ProviderRequest, ProviderResponse};
use lodestar_core::store::{ProductivityQueries, TaskActions};
use lodestar_store::MemoryStore;
use lodestar_tools::ToolExecutor;
use std::sync::{Arc, Mutex};

/// Replays a fixed list of responses; panics if called more often than
/// scripted (that itself is a protocol violation worth failing on).
struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn text(content: &str) -> ProviderResponse {
        ProviderResponse {
            message: Message::assistant(content),
            usage: None,
            model: "scripted".into(),
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ProviderResponse {
        let mut message = Message::assistant("");
        message.tool_calls = vec![MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }];
        ProviderResponse {
            message,
            usage: None,
            model: "scripted".into(),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses.lock().unwrap().remove(0)
    }
}

fn harness(
    provider: Arc<ScriptedProvider>,
    store: Arc<MemoryStore>,
) -> (MessageRouter, Arc<MemoryStore>) {
    let executor = ToolExecutor::new()
        .with_task_actions(store.clone())
        .with_goal_actions(store.clone())
        .with_milestone_actions(store.clone());
    let coordinator = Arc::new(
        Coordinator::new(provider, "scripted").with_executor(executor),
    );
    let assembler = Arc::new(ContextAssembler::new(store.clone()));
    (
        MessageRouter::new(coordinator, assembler).with_chunk_size(40),
        store,
    )
}

async fn collect(mut rx: tokio::sync::mpsc::Receiver<TransportEvent>) -> Vec<TransportEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn user() -> UserId {
    UserId::from("user-1")
}

#[tokio::test]
async fn conversational_message_streams_and_mutates_nothing() {
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(ScriptedProvider::text(
        "Your week looks light — the report is the highest-leverage item.",
    ))]));
    let (router, store) = harness(provider.clone(), Arc::new(MemoryStore::new()));

    // No mutation keyword → conversational path.
    let events = collect(router.route(user(), vec![], "What should I focus on?".into())).await;

    // chunk(s) then done, no progress events on this path.
    assert!(matches!(events.last(), Some(TransportEvent::Done)));
    assert!(events
        .iter()
        .all(|e| !matches!(e, TransportEvent::Progress { .. })));
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            TransportEvent::Chunk { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert!(text.contains("highest-leverage"));

    // The model was never offered tools and nothing was written.
    assert!(provider.requests()[0].tools.is_empty());
    assert!(store.active_tasks(&user(), 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn keyword_miss_falls_through_with_no_side_effect() {
    // A mutation request phrased without any trigger keyword: the stale
    // keyword list misses it, the message gets a plain text answer, and no
    // store mutation happens.
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(ScriptedProvider::text(
        "Noted — you want milk on the list. Say 'add a task' and I'll save it.",
    ))]));
    let (router, store) = harness(provider.clone(), Arc::new(MemoryStore::new()));

    let events = collect(router.route(
        user(),
        vec![],
        "I need milk from the store sometime".into(),
    ))
    .await;

    assert!(matches!(events.last(), Some(TransportEvent::Done)));
    assert!(store.active_tasks(&user(), 20).await.unwrap().is_empty());
    assert!(provider.requests()[0].tools.is_empty());
}

#[tokio::test]
async fn add_task_round_trip_creates_and_reports() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(ScriptedProvider::tool_call(
            "call_1",
            "create_task",
            r#"{"title": "Buy milk"}"#,
        )),
        Ok(ScriptedProvider::text("Added 'Buy milk' to your tasks!")),
    ]));
    let (router, store) = harness(provider.clone(), Arc::new(MemoryStore::new()));

    let events = collect(router.route(user(), vec![], "Add a task to buy milk".into())).await;

    // progress → chunk(s) → done
    assert!(matches!(events.first(), Some(TransportEvent::Progress { .. })));
    assert!(matches!(events.last(), Some(TransportEvent::Done)));
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            TransportEvent::Chunk { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert!(text.contains("Buy milk"));

    // The task exists, owned by the authenticated user.
    let tasks = store.active_tasks(&user(), 20).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");

    // Tool definitions offered on the first call only.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].tools.is_empty());
    assert!(requests[1].tools.is_empty());
}

#[tokio::test]
async fn delete_of_missing_task_reports_not_found_without_mutation() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok(ScriptedProvider::tool_call(
            "call_1",
            "delete_task",
            // No task titled "report" exists, so any id the model produces
            // cannot match.
            r#"{"task_id": "00000000-0000-0000-0000-000000000000"}"#,
        )),
        Ok(ScriptedProvider::text(
            "I couldn't find a task called 'report' — nothing was deleted.",
        )),
    ]));
    let (router, store) = harness(provider.clone(), Arc::new(MemoryStore::new()));

    // Seed an unrelated task to prove it survives.
    store
        .create_task(
            &user(),
            lodestar_core::store::NewTask {
                title: "Water the plants".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let events = collect(router.route(user(), vec![], "Delete the report task".into())).await;

    assert!(matches!(events.last(), Some(TransportEvent::Done)));
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            TransportEvent::Chunk { content } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert!(text.contains("couldn't find"));

    // The not-found error reached the model on the follow-up call.
    let requests = provider.requests();
    let tool_message = requests[1]
        .messages
        .iter()
        .find(|m| m.tool_call_id.is_some())
        .expect("tool result message");
    assert!(tool_message.content.contains("not found or access denied"));

    // No store mutation occurred.
    let tasks = store.active_tasks(&user(), 20).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Water the plants");
}

#[tokio::test]
async fn first_model_failure_surfaces_single_error_event() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
        "connection reset by 10.1.2.3".into(),
    ))]));
    let (router, _store) = harness(provider, Arc::new(MemoryStore::new()));

    let events = collect(router.route(user(), vec![], "Add a task to buy milk".into())).await;

    let error = events
        .iter()
        .find_map(|e| match e {
            TransportEvent::Error { content } => Some(content.clone()),
            _ => None,
        })
        .expect("terminal error event");
    // Generic, non-leaking wording.
    assert!(!error.contains("10.1.2.3"));
    assert!(matches!(events.last(), Some(TransportEvent::Error { .. })));
}

#[tokio::test]
async fn context_snapshot_reaches_the_model() {
    let store = Arc::new(MemoryStore::new());
    store
        .create_task(
            &user(),
            lodestar_core::store::NewTask {
                title: "Prepare slides".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![Ok(ScriptedProvider::text(
        "Slides first.",
    ))]));
    let (router, _) = harness(provider.clone(), store);

    collect(router.route(user(), vec![], "What should I focus on?".into())).await;

    let request = &provider.requests()[0];
    let context = request
        .messages
        .iter()
        .find(|m| m.content.starts_with("User Context:"))
        .expect("context system message");
    assert!(context.content.contains("Prepare slides"));
    assert!(context.content.contains("=== SUMMARY ==="));
}
