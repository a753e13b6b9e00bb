use anyhow::Result;
use rmcp::{
    ErrorData, ServerHandler, ServiceExt,
    model::*,
    service::{RequestContext, RoleServer},
};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{self, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
mod store;
mod tools;
use crate::store::RecordStore;
use crate::tools::AppState;

#[derive(Clone)]
pub struct RegistrationService {
    state: Arc<Mutex<AppState>>,
}

impl RegistrationService {
    pub fn new(state: Arc<Mutex<AppState>>) -> Self {
        Self { state }
    }
}

impl ServerHandler for RegistrationService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Registration MCP server: add registrations and list them back".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: tools::all_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        tools::dispatch(
            &request.name,
            request.arguments.map(|v| v.into()),
            context,
            self.state.clone(),
        )
        .await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let bind_addr = std::env::var("REGISTRATION_MCP_BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8090".to_string());
    let csv_path = std::env::var("REGISTRATION_CSV_PATH")
        .unwrap_or_else(|_| "user_registrations.csv".to_string());

    // One store shared by every connection. The file itself stays unlocked.
    let state = Arc::new(Mutex::new(AppState {
        store: RecordStore::new(csv_path),
    }));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Registration MCP server listening on: {}", bind_addr);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        tracing::info!("Accepted connection from: {}", peer_addr);

        let state = state.clone();
        tokio::spawn(async move {
            let service = RegistrationService::new(state);
            match service.serve(stream).await {
                Ok(server) => {
                    tracing::info!("Service initialized for {}", peer_addr);
                    if let Err(e) = server.waiting().await {
                        tracing::error!("Service error for {}: {:?}", peer_addr, e);
                    }
                    tracing::info!("Service closed for {}", peer_addr);
                }
                Err(e) => {
                    tracing::error!("Service run error for {}: {:?}", peer_addr, e);
                }
            }
        });
    }
}
