//! Integration tests for the conversation loop
//!
//! A scripted provider stands in for the model: it replays a fixed list of
//! responses and records every transcript it was shown.

use async_trait::async_trait;
use recall_engine::agent::{Conversation, ConversationSettings, SessionState, TurnOutcome};
use recall_engine::llm::{
    FinalAnswer, LLMError, LLMProvider, LLMResponse, Message, MessageRole, ToolCall,
    ToolCallBatch,
};
use recall_engine::memory::{MemoryStore, ReadFilter};
use recall_engine::tools::ToolDispatcher;
use sdk::errors::EngineError;
use sdk::types::ToolSpec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct ScriptedProvider {
    script: Mutex<VecDeque<Result<LLMResponse, LLMError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
    tool_counts: Mutex<Vec<usize>>,
    /// Returned once the script runs out
    fallback: Option<LLMResponse>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<LLMResponse, LLMError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn transcript_at(&self, call: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LLMResponse, LLMError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.tool_counts.lock().unwrap().push(tools.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LLMError::InvalidRequest("script exhausted".to_string())),
        }
    }
}

fn answer(text: &str) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::FinalAnswer(FinalAnswer::new(text)))
}

fn tool_calls(calls: &[(&str, &str, &str)]) -> Result<LLMResponse, LLMError> {
    Ok(LLMResponse::ToolCalls(ToolCallBatch::new(
        "",
        calls
            .iter()
            .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
            .collect(),
    )))
}

fn setup(provider: Arc<ScriptedProvider>, settings: ConversationSettings) -> (TempDir, Conversation) {
    let temp_dir = TempDir::new().unwrap();
    let store = MemoryStore::new(temp_dir.path().join("memory_store.json"));
    let conversation = Conversation::new(provider, ToolDispatcher::new(store), settings);
    (temp_dir, conversation)
}

fn store_of(temp_dir: &TempDir) -> MemoryStore {
    MemoryStore::new(temp_dir.path().join("memory_store.json"))
}

#[tokio::test]
async fn test_tool_round_then_answer() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_calls(&[(
            "call_1",
            "write_memory",
            r#"{"topic": "work", "title": "Standup", "content": "10am"}"#,
        )]),
        answer("Noted!"),
    ]));
    let (temp_dir, mut conversation) = setup(provider.clone(), ConversationSettings::default());

    let outcome = conversation.handle_input("remember standup is at 10am").await.unwrap();
    let TurnOutcome::Reply(reply) = outcome else {
        panic!("expected a reply");
    };
    assert_eq!(reply.answer, "Noted!");
    assert_eq!(reply.tool_calls, 1);
    assert_eq!(reply.model_calls, 2);
    assert_eq!(conversation.state(), SessionState::AwaitingUserInput);

    // The store was written through the dispatcher
    let stored = store_of(&temp_dir)
        .read(&ReadFilter::default().topic("work"))
        .unwrap();
    assert_eq!(stored.count, 1);

    // Every model call gets the seven tool declarations
    assert_eq!(*provider.tool_counts.lock().unwrap(), vec![7, 7]);
}

#[tokio::test]
async fn test_transcript_ordering_contract() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_calls(&[
            ("call_a", "list_topics", "{}"),
            ("call_b", "get_statistics", ""),
        ]),
        answer("You have nothing stored yet."),
    ]));
    let (_temp_dir, mut conversation) = setup(provider.clone(), ConversationSettings::default());

    conversation.handle_input("what do you know?").await.unwrap();

    // Second model call sees: system, user, assistant+tools, tool a, tool b
    let seen = provider.transcript_at(1);
    let roles: Vec<MessageRole> = seen.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
            MessageRole::Tool
        ]
    );
    assert_eq!(seen[2].tool_calls.len(), 2);
    assert_eq!(seen[3].tool_call_id.as_deref(), Some("call_a"));
    assert_eq!(seen[3].name.as_deref(), Some("list_topics"));
    assert_eq!(seen[4].tool_call_id.as_deref(), Some("call_b"));

    let envelope: serde_json::Value = serde_json::from_str(&seen[3].content).unwrap();
    assert_eq!(envelope["status"], "ok");
    assert_eq!(envelope["total_topics"], 0);

    // The final answer closes the turn in the transcript
    let transcript = conversation.transcript().messages();
    assert_eq!(transcript.len(), 6);
    assert_eq!(transcript[5].role, MessageRole::Assistant);
    assert_eq!(transcript[5].content, "You have nothing stored yet.");
}

#[tokio::test]
async fn test_store_errors_reach_the_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_calls(&[(
            "call_1",
            "update_memory",
            r#"{"topic": "X", "title": "missing"}"#,
        )]),
        tool_calls(&[("call_2", "no_such_tool", "{}")]),
        answer("I couldn't find that. Shall I create it?"),
    ]));
    let (_temp_dir, mut conversation) = setup(provider.clone(), ConversationSettings::default());

    let outcome = conversation.handle_input("update my X note").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Reply(_)));

    let seen = provider.transcript_at(2);
    let first: serde_json::Value = serde_json::from_str(&seen[3].content).unwrap();
    assert_eq!(first["status"], "error");
    assert_eq!(first["message"], "topic 'X' does not exist");

    let second: serde_json::Value = serde_json::from_str(&seen[5].content).unwrap();
    assert_eq!(second["message"], "unknown tool no_such_tool");
}

#[tokio::test]
async fn test_transcript_replayed_across_turns() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        answer("Hello!"),
        answer("Still here."),
    ]));
    let (_temp_dir, mut conversation) = setup(provider.clone(), ConversationSettings::default());

    conversation.handle_input("hi").await.unwrap();
    conversation.handle_input("you there?").await.unwrap();

    let seen = provider.transcript_at(1);
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[1].content, "hi");
    assert_eq!(seen[2].content, "Hello!");
    assert_eq!(seen[3].content, "you there?");
}

#[tokio::test]
async fn test_tool_loop_circuit_breaker() {
    let provider = Arc::new(ScriptedProvider {
        fallback: Some(LLMResponse::ToolCalls(ToolCallBatch::new(
            "",
            vec![ToolCall::new("call_x", "list_topics", "{}")],
        ))),
        ..Default::default()
    });
    let settings = ConversationSettings {
        max_tool_iterations: 3,
        ..Default::default()
    };
    let (_temp_dir, mut conversation) = setup(provider.clone(), settings);

    let err = conversation.handle_input("loop forever").await.unwrap_err();
    assert!(matches!(err, EngineError::ToolLoopExceeded { limit: 3 }));

    // Three executed rounds plus the request that tripped the breaker
    assert_eq!(provider.calls(), 4);
    assert_eq!(conversation.state(), SessionState::AwaitingUserInput);

    // No unanswered tool request is left in the transcript
    let last = conversation.transcript().last().unwrap();
    assert_eq!(last.role, MessageRole::Tool);
}

#[tokio::test]
async fn test_provider_failure_is_fatal() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(
        LLMError::AuthenticationFailed("bad key sk-1234567890abcdefghijklmnop".to_string()),
    )]));
    let (_temp_dir, mut conversation) = setup(provider.clone(), ConversationSettings::default());

    let err = conversation.handle_input("hello").await.unwrap_err();
    match err {
        EngineError::LLMProvider(message) => {
            assert!(message.contains("[REDACTED]"));
            assert!(!message.contains("sk-1234567890"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(conversation.state(), SessionState::Terminal);

    // Terminal is absorbing
    let outcome = conversation.handle_input("hello again").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Exit(_)));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let provider = Arc::new(ScriptedProvider {
        script: Mutex::new(vec![answer("too late")].into()),
        delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let settings = ConversationSettings {
        llm_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let (_temp_dir, mut conversation) = setup(provider, settings);

    let err = conversation.handle_input("hello").await.unwrap_err();
    assert!(matches!(err, EngineError::LLMTimeout));
    assert_eq!(conversation.state(), SessionState::Terminal);
}

#[tokio::test]
async fn test_corrupt_store_ends_session() {
    let provider = Arc::new(ScriptedProvider::new(vec![tool_calls(&[(
        "call_1",
        "list_topics",
        "{}",
    )])]));
    let (temp_dir, mut conversation) = setup(provider, ConversationSettings::default());
    std::fs::write(temp_dir.path().join("memory_store.json"), "{broken").unwrap();

    let err = conversation.handle_input("list").await.unwrap_err();
    assert!(matches!(err, EngineError::StoreCorrupt(_)));
    assert_eq!(conversation.state(), SessionState::Terminal);
}

#[tokio::test]
async fn test_exit_and_close() {
    let provider = Arc::new(ScriptedProvider::default());
    let settings = ConversationSettings {
        exit_commands: vec!["bye".to_string()],
        ..Default::default()
    };
    let (_temp_dir, mut conversation) = setup(provider.clone(), settings);

    assert!(matches!(
        conversation.handle_input("").await.unwrap(),
        TurnOutcome::Skipped
    ));

    let outcome = conversation.handle_input(" BYE ").await.unwrap();
    let TurnOutcome::Exit(farewell) = outcome else {
        panic!("expected exit");
    };
    assert!(!farewell.is_empty());
    assert_eq!(conversation.state(), SessionState::Terminal);
    assert_eq!(provider.calls(), 0);

    // Closing again keeps the same message
    assert_eq!(conversation.close(), farewell);
}
