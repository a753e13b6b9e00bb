use anyhow::Result;
use registration_core::llm::openai::OpenAIClient;
use registration_core::mcp::rmcp_client::RmcpTcpClient;
use registration_core::session::{ChatSession, Orchestrator, RegistrationRow, TurnEvent};
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use url::Url;

/// Fixed-width rendering of the registration table.
fn format_table(rows: &[RegistrationRow]) -> String {
    let mut widths = ["Name".len(), "Email".len(), "Date".len()];
    for row in rows {
        widths[0] = widths[0].max(row.name.chars().count());
        widths[1] = widths[1].max(row.email.chars().count());
        widths[2] = widths[2].max(row.date.chars().count());
    }
    let line = |a: &str, b: &str, c: &str| {
        format!(
            "{:<w0$} | {:<w1$} | {:<w2$}",
            a,
            b,
            c,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
    };
    let mut out = Vec::new();
    out.push(line("Name", "Email", "Date"));
    out.push(format!(
        "{}-+-{}-+-{}",
        "-".repeat(widths[0]),
        "-".repeat(widths[1]),
        "-".repeat(widths[2])
    ));
    for row in rows {
        out.push(line(&row.name, &row.email, &row.date));
    }
    out.join("\n")
}

fn render(events: &[TurnEvent]) {
    for event in events {
        match event {
            TurnEvent::Assistant(text) => println!("{}", text),
            TurnEvent::Warning(text) => println!("Warning: {}", text),
            TurnEvent::Table(rows) => {
                println!("Here are all registrations:");
                println!("{}", format_table(rows));
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rmcp=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let base =
        std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
    let url = Url::parse(&base)?;
    let api_key = std::env::var("OPENAI_API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; model calls will fail");
    }
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let mcp_addr =
        std::env::var("REGISTRATION_MCP_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".to_string());

    let llm = Arc::new(OpenAIClient::new(url, api_key));
    let mcp = Arc::new(RmcpTcpClient::connect(&mcp_addr).await?);
    let orchestrator = Orchestrator::new(llm, mcp, model);
    let mut session = ChatSession::new();

    println!("Registration assistant ready. Ask me anything.");

    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        let n = stdin.read_line(&mut line).await?;
        if n == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        // One turn in flight: further input waits for this loop iteration.
        match orchestrator.process_turn(&mut session, input).await {
            Ok(events) => render(&events),
            Err(e) => {
                tracing::error!("turn failed: {:#}", e);
                println!("Something went wrong with that request. Try again.");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            RegistrationRow {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                date: "1985-02-01".into(),
            },
            RegistrationRow {
                name: "Bartholomew".into(),
                email: "b@x.co".into(),
                date: "1992-11-30".into(),
            },
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Name "));
        // Every row is padded to the same width.
        assert_eq!(lines[0].len(), lines[2].len());
        assert_eq!(lines[2].len(), lines[3].len());
        assert!(lines[3].contains("Bartholomew"));
    }
}
