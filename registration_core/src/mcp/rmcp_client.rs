use crate::mcp::client::MCPClient;
use crate::mcp::registry::ToolMeta;
use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation},
    service::{RoleClient, RunningService},
};

pub struct RegistrationClientHandler {
    info: ClientInfo,
}

impl rmcp::handler::client::ClientHandler for RegistrationClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }
}

/// MCP client over a plain TCP stream to the registration server.
pub struct RmcpTcpClient {
    service: RunningService<RoleClient, RegistrationClientHandler>,
}

impl RmcpTcpClient {
    pub async fn connect(server_addr: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to MCP server at: {}", server_addr);
        let stream = tokio::net::TcpStream::connect(server_addr).await?;
        tracing::info!("Connected to MCP server");

        let client_info = ClientInfo {
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "registration-chat-client".to_string(),
                title: None,
                version: "0.1.0".to_string(),
                website_url: None,
                icons: None,
            },
        };
        let handler = RegistrationClientHandler { info: client_info };
        let service = handler.serve(stream).await?;
        Ok(Self { service })
    }
}

#[async_trait]
impl MCPClient for RmcpTcpClient {
    async fn call(&self, tool: &str, args: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        tracing::info!("calling tool '{}' with args: {:?}", tool, args);
        let arguments = if args.is_object() {
            Some(rmcp::model::object(args))
        } else {
            tracing::warn!(
                "args for tool '{}' is not an object, sending none. Args: {:?}",
                tool,
                args
            );
            None
        };
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments,
            })
            .await?;
        Ok(serde_json::to_value(&result)?)
    }

    async fn list_tools(&self) -> anyhow::Result<Vec<ToolMeta>> {
        let tools = self.service.list_all_tools().await?;
        let metas = tools
            .into_iter()
            .map(|t| ToolMeta {
                name: t.name.to_string(),
                description: t.description.unwrap_or_default().to_string(),
                input_schema: Some(serde_json::Value::Object((*t.input_schema).clone())),
            })
            .collect();
        Ok(metas)
    }
}
