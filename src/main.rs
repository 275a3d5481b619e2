//! mcp-craft CLI
//!
//! 用法: mcp-craft [agent_id] [goal]（默认 A demo），对该 agent 跑一步并以 JSON 打印结果。

use anyhow::Context;
use mcp_craft::{config::load_config, core::StepRequest, observability, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let mut args = std::env::args().skip(1);
    let agent_id = args.next().unwrap_or_else(|| "A".to_string());
    let goal = {
        let rest: Vec<String> = args.collect();
        if rest.is_empty() {
            "demo".to_string()
        } else {
            rest.join(" ")
        }
    };

    let cfg = load_config(None).context("Failed to load config")?;
    let orchestrator = Orchestrator::from_config(&cfg);

    let outcome = orchestrator
        .step(StepRequest::new(agent_id, goal))
        .await
        .context("Step failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );
    Ok(())
}
