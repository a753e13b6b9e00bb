use crate::llm::adapter::{ChatMessage, ChatRequest, LLMClient};
use crate::mcp::client::MCPClient;
use crate::validator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant connected to a registration server.
Use your own knowledge for general questions.

When asked to register or view registrations, use the tools:
  - add_registration(name, email, date)
  - view_all_registration()

Interpret user inputs flexibly (name, email, date).
Always remind the user to enter the date in format: YYYY-MM-DD.";

const DATE_REMINDER: &str = "\n\n(Please enter date in format: YYYY-MM-DD)";

/// Remote calls are attempted exactly once, bounded by these.
pub const MODEL_CALL_TIMEOUT: Duration = Duration::from_secs(60);
pub const TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat history for one UI session. Lives for the process lifetime and is
/// reset by restarting; the system instruction is always element zero.
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            }],
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One registration row as rendered back to the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Render instruction handed back to the chat surface.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    Assistant(String),
    Table(Vec<RegistrationRow>),
    Warning(String),
}

/// What a tool result resolved to, decided once instead of duck-typed at
/// each use site.
#[derive(Clone, Debug)]
pub enum ToolReply {
    Records(Vec<RegistrationRow>),
    Text(String),
    Failure(String),
}

impl ToolReply {
    /// Resolves the wire shape of a call_tool result: text contents are
    /// joined, then a JSON array of flat records wins over free text.
    pub fn parse(result: &Value) -> ToolReply {
        if result
            .get("isError")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return ToolReply::Failure("tool reported an error".to_string());
        }
        let Some(contents) = result.get("content").and_then(|v| v.as_array()) else {
            return ToolReply::Failure("tool result carried no content".to_string());
        };
        let text: String = contents
            .iter()
            .filter_map(|c| c.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            return ToolReply::Failure("tool result carried no text".to_string());
        }
        match serde_json::from_str::<Vec<RegistrationRow>>(&text) {
            Ok(rows) => ToolReply::Records(rows),
            Err(_) => ToolReply::Text(text),
        }
    }
}

pub struct Orchestrator {
    pub llm: Arc<dyn LLMClient + Send + Sync>,
    pub mcp: Arc<dyn MCPClient + Send + Sync>,
    pub model: String,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LLMClient + Send + Sync>,
        mcp: Arc<dyn MCPClient + Send + Sync>,
        model: String,
    ) -> Self {
        Self { llm, mcp, model }
    }

    /// Runs one user turn to completion: model call, then any requested
    /// tool calls in order. Validation failure on add_registration ends
    /// the turn immediately and abandons the rest of the batch.
    pub async fn process_turn(
        &self,
        session: &mut ChatSession,
        input: &str,
    ) -> anyhow::Result<Vec<TurnEvent>> {
        session.messages.push(ChatMessage {
            role: "user".into(),
            content: input.to_string(),
        });

        let tools = self.mcp.list_tools().await?;
        let specs: Vec<Value> = tools.iter().map(|t| t.function_spec()).collect();

        let req = ChatRequest {
            model: self.model.clone(),
            messages: session.messages.clone(),
            temperature: None,
            tools: specs,
        };
        let output = timeout(MODEL_CALL_TIMEOUT, self.llm.chat(req))
            .await
            .context("model call timed out")??;

        let mut events = Vec::new();

        if output.tool_calls.is_empty() {
            let mut reply = output.text;
            let lower = reply.to_lowercase();
            if lower.contains("name") && lower.contains("email") {
                reply.push_str(DATE_REMINDER);
            }
            session.messages.push(ChatMessage {
                role: "assistant".into(),
                content: reply.clone(),
            });
            events.push(TurnEvent::Assistant(reply));
            return Ok(events);
        }

        for call in &output.tool_calls {
            if call.name == "add_registration" {
                let name = str_arg(&call.arguments, "name");
                let email = str_arg(&call.arguments, "email");
                let date = str_arg(&call.arguments, "date");
                if let Err(msg) = validator::validate_registration(name, email, date) {
                    let text = format!("Validation failed: {}", msg);
                    session.messages.push(ChatMessage {
                        role: "assistant".into(),
                        content: text.clone(),
                    });
                    events.push(TurnEvent::Assistant(text));
                    // Fail closed: nothing else from this batch runs.
                    return Ok(events);
                }
            }

            info!("running tool '{}'", call.name);
            let result = timeout(
                TOOL_CALL_TIMEOUT,
                self.mcp.call(&call.name, call.arguments.clone()),
            )
            .await
            .context("tool call timed out")??;

            if call.name == "view_all_registration" {
                match ToolReply::parse(&result) {
                    ToolReply::Records(rows) => {
                        session.messages.push(ChatMessage {
                            role: "assistant".into(),
                            content: "Displayed all registrations in table format.".into(),
                        });
                        events.push(TurnEvent::Table(rows));
                    }
                    ToolReply::Text(_) => {
                        events.push(TurnEvent::Warning(
                            "No valid registration data found.".into(),
                        ));
                    }
                    ToolReply::Failure(_) => {
                        events.push(TurnEvent::Warning(
                            "Unable to display registration data.".into(),
                        ));
                    }
                }
            } else {
                let text = "Registration added successfully!".to_string();
                session.messages.push(ChatMessage {
                    role: "assistant".into(),
                    content: text.clone(),
                });
                events.push(TurnEvent::Assistant(text));
            }
        }

        Ok(events)
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::adapter::{ChatOutput, ToolCall};
    use crate::mcp::registry::ToolMeta;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted LLM: hands back a fixed output and records the request.
    struct MockLLM {
        output: ChatOutput,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl MockLLM {
        fn text(text: &str) -> Self {
            Self {
                output: ChatOutput {
                    text: text.to_string(),
                    tool_calls: Vec::new(),
                    raw: Value::Null,
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn tool_calls(calls: Vec<ToolCall>) -> Self {
            Self {
                output: ChatOutput {
                    text: String::new(),
                    tool_calls: calls,
                    raw: Value::Null,
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMClient for MockLLM {
        async fn chat(&self, req: ChatRequest) -> anyhow::Result<ChatOutput> {
            self.seen.lock().unwrap().push(req);
            Ok(self.output.clone())
        }
    }

    /// In-memory tool service: records calls, replies from a script.
    struct MockMCP {
        replies: Mutex<Vec<Value>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockMCP {
        fn new(replies: Vec<Value>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_log(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MCPClient for MockMCP {
        async fn call(&self, tool: &str, args: Value) -> anyhow::Result<Value> {
            self.calls.lock().unwrap().push((tool.to_string(), args));
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                anyhow::bail!("no scripted reply left");
            }
            Ok(replies.remove(0))
        }

        async fn list_tools(&self) -> anyhow::Result<Vec<ToolMeta>> {
            Ok(vec![
                ToolMeta {
                    name: "add_registration".into(),
                    description: "Add a registration".into(),
                    input_schema: Some(json!({"type": "object", "properties": {}})),
                },
                ToolMeta {
                    name: "view_all_registration".into(),
                    description: "List registrations".into(),
                    input_schema: Some(json!({"type": "object", "properties": {}})),
                },
            ])
        }
    }

    fn tool_result_text(text: &str) -> Value {
        json!({ "content": [{ "type": "text", "text": text }] })
    }

    fn add_call(name: &str, email: &str, date: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "add_registration".into(),
            arguments: json!({ "name": name, "email": email, "date": date }),
        }
    }

    fn orchestrator(llm: MockLLM, mcp: Arc<MockMCP>) -> Orchestrator {
        Orchestrator::new(Arc::new(llm), mcp, "test-model".into())
    }

    #[tokio::test]
    async fn valid_add_reaches_the_tool_and_reports_success() {
        let llm = MockLLM::tool_calls(vec![add_call("John Doe", "john@doe.com", "1990-05-05")]);
        let mcp = Arc::new(MockMCP::new(vec![tool_result_text(
            "{\"message\":\"Registration added for John Doe on 1990-05-05.\"}",
        )]));
        let orch = orchestrator(llm, mcp.clone());
        let mut session = ChatSession::new();

        let events = orch
            .process_turn(&mut session, "register John Doe, john@doe.com, 1990-05-05")
            .await
            .unwrap();

        let log = mcp.call_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "add_registration");
        assert_eq!(log[0].1["email"], "john@doe.com");
        assert_eq!(
            events,
            vec![TurnEvent::Assistant("Registration added successfully!".into())]
        );
        // History gained the user turn and the success message.
        assert_eq!(session.messages.len(), 3);
    }

    #[tokio::test]
    async fn invalid_email_blocks_the_whole_batch() {
        let llm = MockLLM::tool_calls(vec![
            add_call("John Doe", "bademail", "1990-05-05"),
            ToolCall {
                id: "call_2".into(),
                name: "view_all_registration".into(),
                arguments: json!({}),
            },
        ]);
        let mcp = Arc::new(MockMCP::new(vec![tool_result_text("[]")]));
        let orch = orchestrator(llm, mcp.clone());
        let mut session = ChatSession::new();

        let events = orch
            .process_turn(&mut session, "register John Doe, bademail, 1990-05-05")
            .await
            .unwrap();

        // No remote call happened, not even the trailing view.
        assert!(mcp.call_log().is_empty());
        assert_eq!(events.len(), 1);
        match &events[0] {
            TurnEvent::Assistant(text) => {
                assert!(text.starts_with("Validation failed:"));
                assert!(text.contains("email format"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn view_renders_rows_in_insertion_order() {
        let llm = MockLLM::tool_calls(vec![ToolCall {
            id: "call_1".into(),
            name: "view_all_registration".into(),
            arguments: json!({}),
        }]);
        let rows = json!([
            { "Name": "Ana", "Email": "ana@example.com", "Date": "1985-02-01" },
            { "Name": "Bob", "Email": "bob@example.com", "Date": "1992-11-30" }
        ]);
        let mcp = Arc::new(MockMCP::new(vec![tool_result_text(&rows.to_string())]));
        let orch = orchestrator(llm, mcp);
        let mut session = ChatSession::new();

        let events = orch
            .process_turn(&mut session, "show all registrations")
            .await
            .unwrap();

        match &events[0] {
            TurnEvent::Table(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].name, "Ana");
                assert_eq!(rows[1].email, "bob@example.com");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(
            session.messages.last().unwrap().content,
            "Displayed all registrations in table format."
        );
    }

    #[tokio::test]
    async fn unparseable_view_result_degrades_to_warning() {
        let llm = MockLLM::tool_calls(vec![ToolCall {
            id: "call_1".into(),
            name: "view_all_registration".into(),
            arguments: json!({}),
        }]);
        let mcp = Arc::new(MockMCP::new(vec![tool_result_text("no records here")]));
        let orch = orchestrator(llm, mcp);
        let mut session = ChatSession::new();

        let events = orch.process_turn(&mut session, "list").await.unwrap();
        assert_eq!(
            events,
            vec![TurnEvent::Warning("No valid registration data found.".into())]
        );
    }

    #[tokio::test]
    async fn plain_reply_about_name_and_email_gains_date_reminder() {
        let llm = MockLLM::text("Sure! Please give me your name and email.");
        let mcp = Arc::new(MockMCP::new(Vec::new()));
        let orch = orchestrator(llm, mcp);
        let mut session = ChatSession::new();

        let events = orch.process_turn(&mut session, "I want to register").await.unwrap();
        match &events[0] {
            TurnEvent::Assistant(text) => {
                assert!(text.contains("name and email"));
                assert!(text.contains("YYYY-MM-DD"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        // The stored history carries the reminder too.
        assert!(session.messages.last().unwrap().content.contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn plain_reply_without_the_heuristic_stays_verbatim() {
        let llm = MockLLM::text("The capital of France is Paris.");
        let mcp = Arc::new(MockMCP::new(Vec::new()));
        let orch = orchestrator(llm, mcp);
        let mut session = ChatSession::new();

        let events = orch.process_turn(&mut session, "capital of France?").await.unwrap();
        assert_eq!(
            events,
            vec![TurnEvent::Assistant("The capital of France is Paris.".into())]
        );
    }

    #[tokio::test]
    async fn tool_specs_are_rebuilt_each_turn_from_the_listing() {
        let llm = Arc::new(MockLLM::text("hello"));
        let mcp = Arc::new(MockMCP::new(Vec::new()));
        let orch = Orchestrator::new(llm.clone(), mcp, "test-model".into());
        let mut session = ChatSession::new();

        orch.process_turn(&mut session, "hi").await.unwrap();
        orch.process_turn(&mut session, "hi again").await.unwrap();

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for req in seen.iter() {
            assert_eq!(req.tools.len(), 2);
            assert_eq!(req.tools[0]["function"]["name"], "add_registration");
            assert_eq!(req.tools[1]["function"]["name"], "view_all_registration");
        }
    }

    #[test]
    fn tool_reply_parse_resolves_shapes() {
        let records = tool_result_text(
            "[{\"Name\":\"A B\",\"Email\":\"a@b.co\",\"Date\":\"2000-01-01\"}]",
        );
        assert!(matches!(ToolReply::parse(&records), ToolReply::Records(r) if r.len() == 1));

        let text = tool_result_text("just words");
        assert!(matches!(ToolReply::parse(&text), ToolReply::Text(_)));

        let errored = json!({ "isError": true, "content": [] });
        assert!(matches!(ToolReply::parse(&errored), ToolReply::Failure(_)));

        let empty = json!({});
        assert!(matches!(ToolReply::parse(&empty), ToolReply::Failure(_)));
    }
}
