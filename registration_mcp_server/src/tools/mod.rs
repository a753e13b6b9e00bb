use rmcp::{
    ErrorData,
    model::*,
    service::{RequestContext, RoleServer},
};
use std::sync::{Arc, Mutex};
use std::{future::Future, pin::Pin};

use crate::store::RecordStore;

pub fn to_object(v: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match v {
        serde_json::Value::Object(m) => m,
        _ => serde_json::Map::new(),
    }
}

/// Shared server state: the one registration store behind all connections.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: RecordStore,
}

pub mod add_registration;
pub mod view_all_registration;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;

pub struct ToolEntry {
    pub name: &'static str,
    pub tool: Tool,
    pub handler: Arc<
        dyn Fn(
                Option<serde_json::Value>,
                RequestContext<RoleServer>,
                Arc<Mutex<AppState>>,
            ) -> HandlerFuture
            + Send
            + Sync,
    >,
}

pub fn all_entries() -> Vec<ToolEntry> {
    vec![add_registration::tool(), view_all_registration::tool()]
}

pub fn all_tools() -> Vec<Tool> {
    all_entries().into_iter().map(|e| e.tool).collect()
}

pub async fn dispatch(
    name: &str,
    args: Option<serde_json::Value>,
    context: RequestContext<RoleServer>,
    state: Arc<Mutex<AppState>>,
) -> Result<CallToolResult, ErrorData> {
    for entry in all_entries() {
        if entry.name == name {
            return (entry.handler)(args, context, state).await;
        }
    }
    Err(ErrorData::invalid_params(
        format!("unknown tool: {}", name),
        None,
    ))
}
