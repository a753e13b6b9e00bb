use crate::mcp::registry::ToolMeta;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait MCPClient: Send + Sync {
    /// Invokes a remote tool and returns the raw call result as JSON.
    async fn call(&self, tool: &str, args: Value) -> anyhow::Result<Value>;
    /// Lists the tools the server advertises, schemas included.
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolMeta>>;
}
