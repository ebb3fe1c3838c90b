//! The run loop: guardrails, then decide / dispatch until an answer.

use brain_core::{Conversation, ToolRequest, ToolResult, ToolSpec, Turn};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::decision::DecisionStep;
use crate::dispatcher::ToolDispatcher;
use crate::guardrails::{Guardrails, Verdict};

/// Assistant turn appended when the model keeps asking for tools.
pub const TOOL_LOOP_LIMIT_MESSAGE: &str = "Error: tool loop limit exceeded.";

/// Error payload answering tool requests that arrive after the round limit.
pub const TOOL_LOOP_LIMIT_RESULT: &str = "tool loop limit exceeded";

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum RunStatus {
    /// The model produced a final answer.
    Answered,
    /// The guardrails refused the turn; carries the reason.
    Blocked(String),
    /// The model call failed or timed out.
    ModelUnavailable,
    /// The model still wanted tools after the round limit.
    ToolLoopLimitExceeded,
}

impl RunStatus {
    /// Short label for logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Answered => "answered",
            RunStatus::Blocked(_) => "blocked",
            RunStatus::ModelUnavailable => "model_unavailable",
            RunStatus::ToolLoopLimitExceeded => "tool_loop_limit_exceeded",
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The conversation with every turn appended during the run.
    pub conversation: Conversation,
    /// Text of the final assistant turn.
    pub answer: String,
    pub status: RunStatus,
    /// Number of model calls made.
    pub model_calls: usize,
    /// Number of tool batches dispatched.
    pub tool_rounds: usize,
}

enum State {
    AwaitingDecision,
    DispatchingTools(Vec<ToolRequest>),
    Done(RunStatus),
}

/// The guardrail / decision / dispatch state machine.
pub struct Pipeline {
    guardrails: Guardrails,
    decision: DecisionStep,
    dispatcher: ToolDispatcher,
    max_tool_rounds: usize,
}

impl Pipeline {
    pub fn new(
        guardrails: Guardrails,
        decision: DecisionStep,
        dispatcher: ToolDispatcher,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            guardrails,
            decision,
            dispatcher,
            max_tool_rounds,
        }
    }

    pub fn guardrails(&self) -> &Guardrails {
        &self.guardrails
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Whether the model behind the decision step can take requests.
    pub async fn is_ready(&self) -> bool {
        self.decision.brain().is_ready().await
    }

    /// Specs bound to every model call.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.dispatcher.executor().specs()
    }

    /// Process one user turn to completion.
    ///
    /// The conversation is owned by the run; it is handed back, with the new
    /// turns appended, in the outcome.
    pub async fn run(&self, conversation: Conversation) -> RunOutcome {
        let mut conversation = match self.guardrails.check(conversation) {
            Verdict::Pass(conversation) => conversation,
            Verdict::Block {
                block,
                mut conversation,
            } => {
                info!(
                    "Guardrail blocked turn: {} (matched '{}')",
                    block.reason(),
                    block.matched
                );
                conversation.push(Turn::assistant(block.message()));
                return RunOutcome {
                    conversation,
                    answer: block.message().to_string(),
                    status: RunStatus::Blocked(block.reason().to_string()),
                    model_calls: 0,
                    tool_rounds: 0,
                };
            }
        };

        let tools = self.tool_specs();
        let mut model_calls = 0;
        let mut tool_rounds = 0;
        let mut state = State::AwaitingDecision;

        let status = loop {
            state = match state {
                State::AwaitingDecision => {
                    let decision = self.decision.decide(&conversation, &tools).await;
                    model_calls += 1;

                    let failed = decision.is_failure();
                    let requests = decision.turn.tool_calls.clone();
                    conversation.push(decision.turn);

                    if failed {
                        State::Done(RunStatus::ModelUnavailable)
                    } else if requests.is_empty() {
                        State::Done(RunStatus::Answered)
                    } else if tool_rounds >= self.max_tool_rounds {
                        warn!(
                            "Model requested tools after {} rounds, stopping",
                            tool_rounds
                        );
                        // Every tool call still needs a matching result turn,
                        // or the history is rejected on the next run.
                        conversation.extend(requests.into_iter().map(|request| {
                            Turn::tool_result(ToolResult::error(
                                request.id,
                                request.name,
                                TOOL_LOOP_LIMIT_RESULT,
                            ))
                        }));
                        conversation.push(Turn::assistant(TOOL_LOOP_LIMIT_MESSAGE));
                        State::Done(RunStatus::ToolLoopLimitExceeded)
                    } else {
                        State::DispatchingTools(requests)
                    }
                }
                State::DispatchingTools(requests) => {
                    let results = self.dispatcher.dispatch(&requests).await;
                    tool_rounds += 1;
                    debug!(
                        "Round {}: appended {} tool results",
                        tool_rounds,
                        results.len()
                    );
                    conversation.extend(results);
                    State::AwaitingDecision
                }
                State::Done(status) => break status,
            };
        };

        let answer = conversation
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();

        info!(
            "Run finished: {} ({} model calls, {} tool rounds)",
            status.label(),
            model_calls,
            tool_rounds
        );

        RunOutcome {
            conversation,
            answer,
            status,
            model_calls,
            tool_rounds,
        }
    }
}
