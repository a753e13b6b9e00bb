pub mod client;
pub mod registry;
pub mod rmcp_client;
