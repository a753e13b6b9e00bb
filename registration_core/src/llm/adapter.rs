use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    /// OpenAI function specs; the provider picks freely among them.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tools: Vec<serde_json::Value>,
}

/// One structured tool invocation requested by the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Already decoded from the provider's argument string. Undecodable
    /// arguments degrade to an empty object.
    pub arguments: serde_json::Value,
}

#[derive(Clone, Debug)]
pub struct ChatOutput {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait LLMClient {
    async fn chat(&self, req: ChatRequest) -> anyhow::Result<ChatOutput>;
}
