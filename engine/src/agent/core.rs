//! Conversation Core
//!
//! This module implements the turn loop that connects the user, the model
//! and the memory tools. A single user turn runs through:
//!
//! 1. Append the user message to the transcript
//! 2. Call the model with the full transcript and the tool declarations
//! 3. If the reply requests tools: append the reply (with its requests),
//!    run every request in order, append each result tagged with its
//!    correlation id, and go back to 2
//! 4. Otherwise append the reply and return it as the turn's answer
//!
//! # Limits
//!
//! - `max_tool_iterations` tool rounds per turn (circuit breaker)
//! - `llm_timeout` per model call
//!
//! Missing topics, bad tool arguments and unknown tools never end a turn:
//! they reach the model as error envelopes. Store I/O, store corruption and
//! model failures end the session.

use sdk::errors::{EngineError, RecallErrorExt};
use sdk::types::ToolSpec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::AgentConfig;
use crate::llm::{LLMError, LLMProvider, LLMResponse, Message, ToolCallBatch};
use crate::secrets::SecretManager;
use crate::tools::ToolDispatcher;

use super::prompt;
use super::Transcript;

/// Where a session currently is in the turn loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUserInput,
    ModelCall,
    ToolExecution,
    /// Absorbing: no further model calls happen
    Terminal,
}

/// Tunables of the turn loop
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub max_tool_iterations: usize,
    pub llm_timeout: Duration,
    /// Lowercased, trimmed exit commands
    pub exit_commands: Vec<String>,
    pub system_prompt: String,
}

impl ConversationSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_tool_iterations: config.max_tool_iterations,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
            exit_commands: config
                .exit_commands
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| prompt::butler_prompt(&config.assistant_name)),
        }
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// The answer of one completed turn
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub answer: String,

    /// Tool requests executed during the turn
    pub tool_calls: usize,

    pub model_calls: usize,

    pub duration_ms: u64,
}

/// What handling one line of user input produced
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The model answered
    Reply(TurnReply),

    /// Blank input; nothing was sent to the model
    Skipped,

    /// The session is over; carries the closing message
    Exit(String),
}

/// A chat session: the transcript plus the collaborators it drives
pub struct Conversation {
    provider: Arc<dyn LLMProvider>,
    dispatcher: ToolDispatcher,
    tools: Vec<ToolSpec>,
    transcript: Transcript,
    state: SessionState,
    settings: ConversationSettings,
}

impl Conversation {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        dispatcher: ToolDispatcher,
        settings: ConversationSettings,
    ) -> Self {
        let tools = dispatcher.specs();
        let transcript = Transcript::new(settings.system_prompt.clone());
        Self {
            provider,
            dispatcher,
            tools,
            transcript,
            state: SessionState::AwaitingUserInput,
            settings,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// True if `input` is one of the configured exit commands
    pub fn is_exit_command(&self, input: &str) -> bool {
        let normalized = input.trim().to_lowercase();
        self.settings.exit_commands.iter().any(|c| *c == normalized)
    }

    /// End the session (interrupt path) and return the closing message
    pub fn close(&mut self) -> String {
        if self.state != SessionState::Terminal {
            info!("Session closed");
        }
        self.state = SessionState::Terminal;
        prompt::farewell().to_string()
    }

    /// Handle one line of user input.
    ///
    /// # Errors
    ///
    /// - `ToolLoopExceeded` if the model keeps requesting tools; the session
    ///   stays usable
    /// - `LLMTimeout`, `LLMProvider`, `StoreIo`, `StoreCorrupt`: the session
    ///   is moved to `Terminal`
    pub async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome, EngineError> {
        if self.state == SessionState::Terminal {
            return Ok(TurnOutcome::Exit(prompt::farewell().to_string()));
        }

        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }
        if self.is_exit_command(input) {
            return Ok(TurnOutcome::Exit(self.close()));
        }

        match self.run_turn(input).await {
            Ok(reply) => {
                self.state = SessionState::AwaitingUserInput;
                Ok(TurnOutcome::Reply(reply))
            }
            Err(e) if e.is_recoverable() => {
                warn!("Turn failed: {}", e);
                self.state = SessionState::AwaitingUserInput;
                Err(e)
            }
            Err(e) => {
                error!("Session ended by fatal error: {}", e);
                self.state = SessionState::Terminal;
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self, input: &str) -> Result<TurnReply, EngineError> {
        let start = Instant::now();
        let limit = self.settings.max_tool_iterations;
        let mut model_calls = 0;
        let mut tool_calls = 0;
        let mut rounds = 0;

        info!("Turn started ({} chars)", input.chars().count());
        self.transcript.push(Message::user(input));

        loop {
            self.state = SessionState::ModelCall;
            model_calls += 1;
            debug!(
                "Model call {} with {} transcript entries",
                model_calls,
                self.transcript.len()
            );

            match self.call_model().await? {
                LLMResponse::FinalAnswer(answer) => {
                    self.transcript.push(Message::assistant(&answer.content));

                    let duration_ms = start.elapsed().as_millis() as u64;
                    info!(
                        "Turn completed in {}ms ({} model calls, {} tool calls)",
                        duration_ms, model_calls, tool_calls
                    );

                    return Ok(TurnReply {
                        answer: answer.content,
                        tool_calls,
                        model_calls,
                        duration_ms,
                    });
                }
                LLMResponse::ToolCalls(batch) => {
                    if rounds == limit {
                        warn!("Tool loop exceeded {} rounds, aborting turn", limit);
                        return Err(EngineError::ToolLoopExceeded { limit });
                    }
                    rounds += 1;

                    self.state = SessionState::ToolExecution;
                    tool_calls += self.execute_batch(batch)?;
                }
            }
        }
    }

    async fn call_model(&self) -> Result<LLMResponse, EngineError> {
        let call = self
            .provider
            .generate(self.transcript.messages(), &self.tools);

        match timeout(self.settings.llm_timeout, call).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(LLMError::Timeout)) | Err(_) => {
                error!(
                    "LLM call timed out after {}s",
                    self.settings.llm_timeout.as_secs()
                );
                Err(EngineError::LLMTimeout)
            }
            Ok(Err(e)) => {
                let message = SecretManager::new("recall").scrub(&e.to_string());
                error!("LLM call failed: {}", message);
                Err(EngineError::LLMProvider(message))
            }
        }
    }

    /// Record the assistant's requests, then run them in order.
    fn execute_batch(&mut self, batch: ToolCallBatch) -> Result<usize, EngineError> {
        let calls = batch.calls.clone();
        self.transcript
            .push(Message::assistant_with_tools(batch.content, batch.calls));

        for call in &calls {
            debug!("Tool call: {} ({})", call.name, call.id);
            let output = self.dispatcher.dispatch(&call.name, &call.arguments)?;
            self.transcript.push(Message::tool_result(
                output.to_json(),
                &call.id,
                &call.name,
            ));
        }

        Ok(calls.len())
    }
}
