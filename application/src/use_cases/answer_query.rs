//! Answer Query use case.
//!
//! Drives one spoken query through the tool-calling loop:
//!
//! 1. Wrap the query with the voice instructions and seed the conversation
//! 2. Send the conversation plus the tool catalog to the model
//! 3. If the model asks for tools, run them all concurrently, append the
//!    results and go back to 2
//! 4. The first response without tool calls is the answer
//!
//! Model calls are strictly sequential; tool calls inside one round fan out
//! with [`join_all`]. The loop is bounded by
//! [`ExecutionParams::max_tool_rounds`] and can be abandoned at any await
//! point through a [`CancellationToken`].

use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmRequest};
use crate::ports::progress::QueryProgressNotifier;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use cryptovox_domain::util::preview;
use cryptovox_domain::{
    ContentBlock, Conversation, DomainError, DroppedToolCall, LlmResponse, Query, QueryRun,
    ToolCall, ToolError, ToolResult, VoicePromptTemplate,
};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a query. Tool failures never show up here.
#[derive(Error, Debug)]
pub enum AnswerQueryError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Model returned an empty answer")]
    EmptyResponse,

    #[error("Model still requested tools after {0} tool rounds")]
    MaxRoundsExceeded(usize),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Conversation error: {0}")]
    Conversation(DomainError),
}

impl From<DomainError> for AnswerQueryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::RoundLimitExceeded(max) => AnswerQueryError::MaxRoundsExceeded(max),
            DomainError::Cancelled => AnswerQueryError::Cancelled,
            other => AnswerQueryError::Conversation(other),
        }
    }
}

impl AnswerQueryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnswerQueryError::Cancelled)
    }
}

/// Input for the [`AnswerQueryUseCase`].
#[derive(Debug, Clone)]
pub struct AnswerQueryInput {
    /// The listener's question, already validated.
    pub query: Query,
    /// Loop control for this query.
    pub execution: ExecutionParams,
}

impl AnswerQueryInput {
    pub fn new(query: Query, execution: ExecutionParams) -> Self {
        Self { query, execution }
    }
}

/// A finished query.
#[derive(Debug, Clone)]
pub struct AnswerQueryOutput {
    /// Speech-ready answer text, trimmed.
    pub answer: String,
    /// Completed tool rounds.
    pub tool_rounds: usize,
    /// Total tool calls across all rounds.
    pub tool_calls: usize,
    /// Wall-clock time for the whole query.
    pub elapsed: Duration,
}

/// Use case for answering a query through the tool loop.
///
/// Holds no per-query state, so one instance serves concurrent queries.
#[derive(Clone)]
pub struct AnswerQueryUseCase {
    gateway: Arc<dyn LlmGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl AnswerQueryUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        tool_schema: Arc<dyn ToolSchemaPort>,
    ) -> Self {
        Self {
            gateway,
            tool_executor,
            tool_schema,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Answer a query.
    pub async fn execute(
        &self,
        input: AnswerQueryInput,
        progress: &dyn QueryProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<AnswerQueryOutput, AnswerQueryError> {
        let started = Instant::now();
        let params = &input.execution;
        info!(query = %preview(input.query.content(), 100), "Answering query");

        let tools = self
            .tool_schema
            .all_tools_schema(self.tool_executor.tool_spec());
        let mut conversation =
            Conversation::new(VoicePromptTemplate::format_query(input.query.content()));
        let mut run = QueryRun::new(params.max_tool_rounds);
        let mut total_calls = 0usize;

        debug!(
            model = %params.model,
            tools = tools.len(),
            max_rounds = params.max_tool_rounds,
            "Query setup"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "query_started",
            serde_json::json!({
                "query": input.query.content(),
                "model": params.model,
                "tools": tools.len(),
            }),
        ));

        loop {
            conversation.ensure_ready_for_model()?;
            let round = run.rounds_completed() + 1;

            let model_started = Instant::now();
            progress.on_model_call_start(round);
            let response = self
                .call_model(&conversation, &tools, params, progress, cancel)
                .await;
            progress.on_model_call_end(round);
            let (mut response, dropped) = response?;

            let calls = response.tool_calls();
            let rejected = Self::reject_dropped(&mut response, &dropped);
            info!(
                round,
                tool_calls = calls.len(),
                rejected = rejected.len(),
                elapsed_ms = model_started.elapsed().as_millis() as u64,
                "Model call completed"
            );
            self.conversation_logger.log(ConversationEvent::new(
                "llm_response",
                serde_json::json!({
                    "round": round,
                    "text": response.text_content(),
                    "tool_calls": calls.iter().map(|c| &c.tool_name).collect::<Vec<_>>(),
                    "rejected_calls": dropped.iter().map(|d| &d.name).collect::<Vec<_>>(),
                    "stop_reason": response.stop_reason,
                }),
            ));

            let wants_tools = !calls.is_empty() || !rejected.is_empty();
            if run.on_model_response(wants_tools)?.is_terminal() {
                return self.finish(&response, &input, &run, total_calls, started);
            }

            if response.is_truncated() {
                warn!(round, "Model hit max_tokens while requesting tools");
            }

            conversation.push_assistant(&response);
            let tools_started = Instant::now();
            let mut results = self.execute_round(&calls, params, progress, cancel).await?;
            for result in &rejected {
                progress.on_tool_finished(result);
            }
            results.extend(rejected);
            total_calls += results.len();

            let failed = results.iter().filter(|r| !r.is_success()).count();
            info!(
                round,
                calls = results.len(),
                failed,
                elapsed_ms = tools_started.elapsed().as_millis() as u64,
                "Tool round completed"
            );

            conversation.push_tool_results(&results)?;
            run.on_tools_completed()?;
        }
    }

    async fn call_model(
        &self,
        conversation: &Conversation,
        tools: &[Value],
        params: &ExecutionParams,
        progress: &dyn QueryProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<(LlmResponse, Vec<DroppedToolCall>), AnswerQueryError> {
        let request = LlmRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            messages: conversation.messages(),
            tools,
        };

        let call = async {
            if params.streaming {
                let handle = self.gateway.stream(&request).await?;
                handle.collect_response(progress).await
            } else {
                let response = self.gateway.send(&request).await?;
                let text = response.text_content();
                if !text.is_empty() {
                    progress.on_text_delta(&text);
                }
                Ok::<_, GatewayError>((response, Vec::new()))
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnswerQueryError::Cancelled),
            result = call => result.map_err(AnswerQueryError::from),
        }
    }

    /// Run every call of one round concurrently and wait for all of them.
    ///
    /// Results come back in call order. A call that exceeds the per-call
    /// timeout yields a `TIMEOUT` failure instead of stalling the round.
    async fn execute_round(
        &self,
        calls: &[ToolCall],
        params: &ExecutionParams,
        progress: &dyn QueryProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolResult>, AnswerQueryError> {
        let timeout = params.tool_call_timeout;

        let futures = calls.iter().map(|call| async move {
            debug!(
                tool = %call.tool_name,
                id = %call.id,
                args = %call.args_preview(120),
                "Dispatching tool call"
            );
            self.conversation_logger.log(ConversationEvent::new(
                "tool_call",
                serde_json::json!({
                    "id": call.id,
                    "tool": call.tool_name,
                    "input": call.arguments,
                }),
            ));
            progress.on_tool_started(call);

            let started = Instant::now();
            let mut result =
                match tokio::time::timeout(timeout, self.tool_executor.execute(call)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(tool = %call.tool_name, ?timeout, "Tool call timed out");
                        ToolResult::failure(
                            &call.id,
                            &call.tool_name,
                            ToolError::timeout(&call.tool_name),
                        )
                    }
                };
            if result.metadata.duration_ms.is_none() {
                result = result.with_duration(started.elapsed().as_millis() as u64);
            }

            self.conversation_logger.log(ConversationEvent::new(
                "tool_result",
                serde_json::json!({
                    "id": result.call_id,
                    "tool": result.tool_name,
                    "success": result.success,
                    "cached": result.metadata.cached,
                    "duration_ms": result.metadata.duration_ms,
                    "bytes": result.content.len(),
                }),
            ));
            progress.on_tool_finished(&result);
            result
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnswerQueryError::Cancelled),
            results = join_all(futures) => Ok(results),
        }
    }

    /// Keep malformed tool calls in the turn as tool uses with empty input,
    /// each answered by an `INVALID_ARGUMENT` result.
    fn reject_dropped(response: &mut LlmResponse, dropped: &[DroppedToolCall]) -> Vec<ToolResult> {
        dropped
            .iter()
            .map(|call| {
                response.content.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: Value::Object(Default::default()),
                });
                ToolResult::failure(
                    &call.id,
                    &call.name,
                    ToolError::invalid_argument(format!(
                        "Arguments for {} were not valid JSON ({}); call the tool again with a JSON object",
                        call.name, call.reason
                    )),
                )
            })
            .collect()
    }

    fn finish(
        &self,
        response: &LlmResponse,
        input: &AnswerQueryInput,
        run: &QueryRun,
        total_calls: usize,
        started: Instant,
    ) -> Result<AnswerQueryOutput, AnswerQueryError> {
        let answer = response.text_content().trim().to_string();
        if answer.is_empty() {
            return Err(AnswerQueryError::EmptyResponse);
        }
        if response.is_truncated() {
            warn!("Answer was cut off at max_tokens");
        }

        let elapsed = started.elapsed();
        info!(
            rounds = run.rounds_completed(),
            tool_calls = total_calls,
            elapsed_ms = elapsed.as_millis() as u64,
            "Query answered"
        );
        self.conversation_logger.log(ConversationEvent::new(
            "answer",
            serde_json::json!({
                "query": input.query.content(),
                "model": input.execution.model,
                "rounds": run.rounds_completed(),
                "bytes": answer.len(),
                "text": answer,
            }),
        ));

        Ok(AnswerQueryOutput {
            answer,
            tool_rounds: run.rounds_completed(),
            tool_calls: total_calls,
            elapsed,
        })
    }
}
