use crate::store::{Record, RecordStore};
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
#[schemars(description = "Add registration request")]
pub struct AddRegistrationRequest {
    #[schemars(description = "Full name of the registrant")]
    pub name: String,
    #[schemars(description = "Email address of the registrant")]
    pub email: String,
    #[schemars(description = "Registration date in YYYY-MM-DD format")]
    pub date: String,
}

pub fn tool() -> ToolEntry {
    let schema = schemars::schema_for!(AddRegistrationRequest);
    let tool = Tool {
        name: "add_registration".into(),
        title: Some("Add Registration".into()),
        description: Some(
            "Add a new registration entry with name, email, and date (YYYY-MM-DD).".into(),
        ),
        input_schema: Arc::new(to_object(serde_json::to_value(schema).unwrap())),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    };
    ToolEntry {
        name: "add_registration",
        tool,
        handler: Arc::new(|request, context, state| {
            Box::pin(async move { handle(request, context, &state).await })
        }),
    }
}

pub async fn handle(
    request: Option<serde_json::Value>,
    _context: RequestContext<RoleServer>,
    state: &Arc<Mutex<AppState>>,
) -> Result<CallToolResult, ErrorData> {
    let args: AddRegistrationRequest = match request {
        Some(args) => serde_json::from_value(args)
            .map_err(|e| ErrorData::invalid_params(e.to_string(), None))?,
        None => return Err(ErrorData::invalid_params("missing arguments", None)),
    };
    let message = {
        let state = state.lock().unwrap();
        run(&args, &state.store)
    }
    .map_err(|e| ErrorData::internal_error(format!("{:#}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(message)]))
}

/// Appends the row and returns the JSON text payload for the tool result.
/// Validation is the caller's job; this end appends unconditionally.
pub fn run(args: &AddRegistrationRequest, store: &RecordStore) -> anyhow::Result<String> {
    let record = Record {
        name: args.name.clone(),
        email: args.email.clone(),
        date: args.date.clone(),
    };
    store.append(&record)?;
    tracing::info!("appended registration for '{}'", record.name);
    let payload = serde_json::json!({
        "message": format!("Registration added for {} on {}.", record.name, record.date)
    });
    Ok(payload.to_string())
}
