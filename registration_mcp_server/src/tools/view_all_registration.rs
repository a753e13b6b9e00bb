use crate::store::RecordStore;
use crate::tools::{AppState, ToolEntry, to_object};
use rmcp::{
    ErrorData,
    model::*,
    service::{RequestContext, RoleServer},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "View all registrations request")]
pub struct ViewAllRegistrationRequest {}

pub fn tool() -> ToolEntry {
    let schema = schemars::schema_for!(ViewAllRegistrationRequest);
    let tool = Tool {
        name: "view_all_registration".into(),
        title: Some("View All Registrations".into()),
        description: Some("Return all registration records as a JSON array.".into()),
        input_schema: Arc::new(to_object(serde_json::to_value(schema).unwrap())),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    };
    ToolEntry {
        name: "view_all_registration",
        tool,
        handler: Arc::new(|request, context, state| {
            Box::pin(async move { handle(request, context, &state).await })
        }),
    }
}

pub async fn handle(
    _request: Option<serde_json::Value>,
    _context: RequestContext<RoleServer>,
    state: &Arc<Mutex<AppState>>,
) -> Result<CallToolResult, ErrorData> {
    let payload = {
        let state = state.lock().unwrap();
        run(&state.store)
    }
    .map_err(|e| ErrorData::internal_error(format!("{:#}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(payload)]))
}

/// Full scan of the store, serialized as a JSON array of records.
pub fn run(store: &RecordStore) -> anyhow::Result<String> {
    let records = store.read_all()?;
    tracing::info!("listing {} registration(s)", records.len());
    Ok(serde_json::to_string(&records)?)
}
