//! Tool-server health check

use std::error::Error;

use crate::mcp::{ProbeOutcome, ToolServerProbe};
use crate::utils::url::is_http_url;

/// Human-readable probe results, plus whether the server is healthy.
pub async fn probe_report(probe: &ToolServerProbe, url: &str, list_tools: bool) -> (String, bool) {
    let mut lines = Vec::new();

    let health = probe.health(url).await;
    let healthy = health.is_available();
    lines.push(format!("Health: {health}"));
    if !healthy {
        return (lines.join("\n"), false);
    }

    match probe.info(url).await {
        ProbeOutcome::Available(info) => {
            let name = info.get("name").and_then(|value| value.as_str());
            let version = info.get("version").and_then(|value| value.as_str());
            match (name, version) {
                (Some(name), Some(version)) => lines.push(format!("Server: {name} {version}")),
                (Some(name), None) => lines.push(format!("Server: {name}")),
                _ => lines.push(format!("Info: {info}")),
            }
        }
        other => lines.push(format!("Info: {other}")),
    }

    if list_tools {
        match probe.tools(url).await {
            ProbeOutcome::Available(tools) if tools.is_empty() => {
                lines.push("Tools: none".to_string());
            }
            ProbeOutcome::Available(tools) => {
                lines.push(format!("Tools ({}):", tools.len()));
                for tool in tools {
                    match tool.description {
                        Some(description) if !description.is_empty() => {
                            lines.push(format!("  {} - {}", tool.name, description));
                        }
                        _ => lines.push(format!("  {}", tool.name)),
                    }
                }
            }
            other => lines.push(format!("Tools: {other}")),
        }
    }

    (lines.join("\n"), true)
}

pub async fn run_probe(url: &str, list_tools: bool) -> Result<(), Box<dyn Error>> {
    if !is_http_url(url) {
        return Err(format!("Tool server URL must start with http:// or https://: {url}").into());
    }

    let (report, healthy) = probe_report(&ToolServerProbe::default(), url, list_tools).await;
    println!("{url}");
    println!("{report}");
    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}
