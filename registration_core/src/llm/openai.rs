use crate::llm::adapter::{ChatOutput, ChatRequest, LLMClient, ToolCall};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::json;
use tracing::info;
use url::Url;

/// Chat-completions client for OpenAI or any API-compatible endpoint.
#[derive(Clone)]
pub struct OpenAIClient {
    pub base_url: Url,
    pub api_key: Option<String>,
}

impl OpenAIClient {
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        Self { base_url, api_key }
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat(&self, req: ChatRequest) -> anyhow::Result<ChatOutput> {
        let mut endpoint = self.base_url.clone();
        endpoint.set_path("/v1/chat/completions");
        let mut payload = json!({
            "model": req.model,
            "messages": req.messages,
            "temperature": req.temperature.unwrap_or(0.7),
        });
        if !req.tools.is_empty() {
            payload["tools"] = serde_json::Value::Array(req.tools);
            payload["tool_choice"] = json!("auto");
        }
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();
        let client: Client<_, Full<Bytes>> = Client::builder(TokioExecutor::new()).build(connector);
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(endpoint.as_str())
            .header("content-type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }
        let req = builder.body(Full::new(Bytes::from(payload.to_string())))?;
        info!("chat completion request {}", endpoint);
        let res: hyper::Response<Incoming> = client.request(req).await?;
        let status = res.status();
        let body_bytes = res.into_body().collect().await?.to_bytes();
        let raw: serde_json::Value = serde_json::from_slice(&body_bytes)?;
        if !status.is_success() {
            return Err(anyhow::anyhow!(format!("status {} error: {}", status, raw)));
        }
        let message = &raw["choices"][0]["message"];
        let text = message["content"].as_str().unwrap_or_default().to_string();
        let tool_calls = parse_tool_calls(message);
        Ok(ChatOutput {
            text,
            tool_calls,
            raw,
        })
    }
}

fn parse_tool_calls(message: &serde_json::Value) -> Vec<ToolCall> {
    let Some(calls) = message["tool_calls"].as_array() else {
        return Vec::new();
    };
    calls
        .iter()
        .filter_map(|call| {
            let name = call["function"]["name"].as_str()?;
            let arguments = match call["function"]["arguments"].as_str() {
                Some(s) => serde_json::from_str(s).unwrap_or_else(|_| json!({})),
                None => json!({}),
            };
            Some(ToolCall {
                id: call["id"].as_str().unwrap_or_default().to_string(),
                name: name.to_string(),
                arguments,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_calls_from_message() {
        let message = json!({
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {
                    "name": "add_registration",
                    "arguments": "{\"name\":\"John\",\"email\":\"j@d.com\",\"date\":\"1990-05-05\"}"
                }
            }]
        });
        let calls = parse_tool_calls(&message);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "add_registration");
        assert_eq!(calls[0].arguments["name"], "John");
    }

    #[test]
    fn undecodable_arguments_degrade_to_empty_object() {
        let message = json!({
            "tool_calls": [{
                "id": "call_1",
                "function": { "name": "view_all_registration", "arguments": "not json" }
            }]
        });
        let calls = parse_tool_calls(&message);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments, json!({}));
    }

    #[test]
    fn no_tool_calls_is_empty() {
        let message = json!({ "content": "hello" });
        assert!(parse_tool_calls(&message).is_empty());
    }
}
