//! The conversation orchestrator — two-phase tool calling.
//!
//! One turn is a small state machine:
//!
//! ```text
//! Idle → AwaitingModelReply₁ → Done                      (no tool calls)
//!                            ↘ AwaitingToolResults
//!                              → AwaitingModelReply₂ → Done
//! ```
//!
//! The "did we already execute tools" fact is structural: the first model
//! pass returns a [`ModelTurn`], and only its `ToolCalls` variant carries
//! the data needed to enter the tool phase. The second model call never
//! offers tools — one round-trip per turn, no recursive tool calling.

use crate::context::token;
use crate::prompt;
use lodestar_core::error::ProviderError;
use lodestar_core::identity::UserId;
use lodestar_core::message::Message;
use lodestar_core::provider::{Provider, ProviderRequest, StreamChunk};
use lodestar_core::tool::{ToolCallRequest, ToolCallResult};
use lodestar_tools::{ToolExecutor, catalog};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-message token overhead used when trimming history.
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Fallback shown when the follow-up model call is rate limited after tools
/// already ran. The mutation outcome is authoritative at that point.
const RATE_LIMITED_AFTER_TOOLS: &str = "I've applied your changes, but the assistant is \
currently rate-limited and couldn't compose a full summary. The actions completed — please \
re-check your tasks and goals to see the updated state.";

/// Fallback for any other follow-up failure after tools already ran.
const FAILED_AFTER_TOOLS: &str = "I've applied your changes, but ran into a temporary \
problem composing the summary. The actions completed — please re-check your tasks and \
goals to see the updated state.";

/// The outcome of one coordinator turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's final text.
    pub response: String,
    /// Every tool result from this turn, in request order (empty when the
    /// model called no tools). Errored calls are included so the caller can
    /// explain partial failures.
    pub tool_calls: Vec<ToolCallResult>,
}

/// What the first model pass produced.
enum ModelTurn {
    /// Plain text — the turn is done.
    Text(String),
    /// The model proposed tool calls; the assistant message (with the call
    /// list embedded) must be replayed in the follow-up request.
    ToolCalls {
        assistant: Message,
        requests: Vec<ToolCallRequest>,
    },
}

/// Drives model calls and tool execution for one user at a time.
///
/// All collaborators are injected; the coordinator holds no global state
/// and no per-request state, so one instance serves all requests.
pub struct Coordinator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    history_budget: usize,
    executor: ToolExecutor,
}

impl Coordinator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: Some(500),
            history_budget: 2000,
            executor: ToolExecutor::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Token budget for trimmed conversation history.
    pub fn with_history_budget(mut self, budget: usize) -> Self {
        self.history_budget = budget;
        self
    }

    /// Attach the tool executor. Tool definitions are offered to the model
    /// only when the executor has at least one backend.
    pub fn with_executor(mut self, executor: ToolExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Run one full turn: first model pass, tool execution if requested,
    /// and the follow-up pass that folds tool results into the final text.
    ///
    /// A failure of the *first* model call surfaces as `Err` — nothing has
    /// executed at that point. A failure of the *second* call after tools
    /// ran still returns `Ok`: the tool results are authoritative, and the
    /// response falls back to a notice telling the user the changes went
    /// through.
    pub async fn respond(
        &self,
        user: &UserId,
        history: &[Message],
        user_message: &str,
        context: Option<&str>,
    ) -> Result<TurnOutcome, ProviderError> {
        let messages = self.build_messages(history, user_message, context);

        let turn = self.first_pass(messages.clone()).await?;

        let (assistant, requests) = match turn {
            ModelTurn::Text(response) => {
                return Ok(TurnOutcome {
                    response,
                    tool_calls: Vec::new(),
                });
            }
            ModelTurn::ToolCalls {
                assistant,
                requests,
            } => (assistant, requests),
        };

        info!(
            user = %user,
            calls = requests.len(),
            "Executing model-proposed tool calls"
        );
        let results = self.executor.execute(&requests, user).await;

        let response = match self.second_pass(messages, assistant, &requests, &results).await {
            Ok(text) => text,
            Err(ProviderError::RateLimited { .. }) => {
                warn!(user = %user, "Follow-up model call rate limited after tool execution");
                RATE_LIMITED_AFTER_TOOLS.to_string()
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Follow-up model call failed after tool execution");
                FAILED_AFTER_TOOLS.to_string()
            }
        };

        Ok(TurnOutcome {
            response,
            tool_calls: results,
        })
    }

    /// Run one conversational turn as a token stream. Tools are never
    /// offered on this path.
    pub async fn respond_stream(
        &self,
        history: &[Message],
        user_message: &str,
        context: Option<&str>,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let messages = self.build_messages(history, user_message, context);
        self.provider
            .stream(ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: Vec::new(),
                stream: true,
            })
            .await
    }

    /// System prompt + optional context + trimmed history + user message.
    fn build_messages(
        &self,
        history: &[Message],
        user_message: &str,
        context: Option<&str>,
    ) -> Vec<Message> {
        let mut messages = vec![Message::system(prompt::SYSTEM_PROMPT)];

        if let Some(context) = context {
            messages.push(Message::system(prompt::context_message(context)));
        }

        let (kept, used) =
            token::trim_to_fit(history, self.history_budget, MESSAGE_OVERHEAD_TOKENS);
        if kept.len() < history.len() {
            debug!(
                kept = kept.len(),
                dropped = history.len() - kept.len(),
                used_tokens = used,
                "Trimmed conversation history to budget"
            );
        }
        messages.extend(kept);

        messages.push(Message::user(user_message));
        messages
    }

    async fn first_pass(&self, messages: Vec<Message>) -> Result<ModelTurn, ProviderError> {
        // Tool definitions go out only when something can actually execute
        // them.
        let tools = if self.executor.has_backends() {
            catalog::definitions()
        } else {
            Vec::new()
        };

        let response = self
            .provider
            .complete(ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools,
                stream: false,
            })
            .await?;

        if response.message.tool_calls.is_empty() {
            return Ok(ModelTurn::Text(response.message.content.clone()));
        }

        let requests = response
            .message
            .tool_calls
            .iter()
            .map(|tc| ToolCallRequest {
                id: tc.id.clone(),
                name: tc.name.clone(),
                arguments: tc.arguments.clone(),
            })
            .collect();

        Ok(ModelTurn::ToolCalls {
            assistant: response.message,
            requests,
        })
    }

    /// Replay the conversation plus the assistant's tool-call message and
    /// one tool message per call (matched by call id), with no tools on
    /// offer, to get the final user-facing text.
    async fn second_pass(
        &self,
        mut messages: Vec<Message>,
        assistant: Message,
        requests: &[ToolCallRequest],
        results: &[ToolCallResult],
    ) -> Result<String, ProviderError> {
        messages.push(assistant);
        for (request, result) in requests.iter().zip(results) {
            messages.push(Message::tool_result(&request.id, result.to_model_content()));
        }

        let response = self
            .provider
            .complete(ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: Vec::new(),
                stream: false,
            })
            .await?;

        Ok(response.message.content)
    }
}
