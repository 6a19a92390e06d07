//! Animagen CLI - Command-line interface for the Animagen daemon

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tokio::io::AsyncWriteExt;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";
const FETCH_CHUNK_BYTES: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(name = "animagen")]
#[command(about = "Animagen CLI - text to Manim animation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "ANIMAGEN_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a description and render it
    Submit {
        /// Natural-language description of the animation
        description: String,

        /// Return once the source is written instead of waiting for the render
        #[arg(long)]
        no_wait: bool,

        /// Print the generated source
        #[arg(long)]
        show_source: bool,
    },

    /// Show the state of a job
    Status {
        /// Job ID
        job_id: String,
    },

    /// Download the rendered video of a job
    Fetch {
        /// Job ID
        job_id: String,

        /// Output file (default: <job_id>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List known jobs
    List,

    /// Show daemon health
    Health,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    data: Option<serde_json::Value>,
}

#[derive(Deserialize, Tabled)]
struct SubmitResult {
    job_id: String,
    state: String,
    artifact_url: String,
}

#[derive(Deserialize)]
struct JobEntry {
    job_id: String,
    state: String,
    description: Option<String>,
    submitted_at: Option<i64>,
    failure_kind: Option<String>,
}

#[derive(Tabled)]
struct JobRow {
    job_id: String,
    state: String,
    failure: String,
    submitted_at: String,
    description: String,
}

impl From<JobEntry> for JobRow {
    fn from(entry: JobEntry) -> Self {
        Self {
            job_id: entry.job_id,
            state: entry.state,
            failure: entry.failure_kind.unwrap_or_else(|| "-".to_string()),
            submitted_at: entry
                .submitted_at
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            description: entry
                .description
                .map(|d| truncate(&d, 40))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}

fn colored_state(state: &str) -> colored::ColoredString {
    match state {
        "COMPLETED" => state.green().bold(),
        "PROCESSING" => state.yellow().bold(),
        _ => state.red().bold(),
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        let detail = error
            .data
            .as_ref()
            .and_then(|d| d.get("detail"))
            .and_then(|d| d.as_str())
            .map(|d| format!("\n{}", d))
            .unwrap_or_default();
        anyhow::bail!("RPC error ({}): {}{}", error.code, error.message, detail);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn fetch(url: &str, job_id: &str, output: PathBuf) -> Result<u64> {
    let mut file = tokio::fs::File::create(&output)
        .await
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut offset = 0u64;
    loop {
        let params = json!({
            "job_id": job_id,
            "offset": offset,
            "length": FETCH_CHUNK_BYTES,
        });
        let chunk = call_rpc(url, "animation.artifact.v1", params).await?;
        let data = chunk["data"].as_str().unwrap_or_default();
        let bytes = STANDARD.decode(data).context("Invalid chunk encoding")?;
        file.write_all(&bytes).await?;
        offset += bytes.len() as u64;

        if chunk["eof"].as_bool().unwrap_or(true) || bytes.is_empty() {
            break;
        }
    }
    file.flush().await?;
    Ok(offset)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            description,
            no_wait,
            show_source,
        } => {
            if !no_wait {
                println!("{}", "Rendering... (this can take a while)".cyan());
            }
            let params = json!({
                "description": description,
                "wait": !no_wait,
            });

            let result = call_rpc(&cli.rpc_url, "animation.submit.v1", params).await?;
            let source = result["source_text"].as_str().unwrap_or_default().to_string();
            let submit_result: SubmitResult = serde_json::from_value(result)?;

            if no_wait {
                println!("{}", "✓ Job accepted".green().bold());
            } else {
                println!("{}", "✓ Animation rendered".green().bold());
            }
            println!();
            println!("{}", Table::new(vec![submit_result]));

            if show_source {
                println!();
                println!("{}", "Generated source:".cyan().bold());
                println!("{}", source);
            }
        }

        Commands::Status { job_id } => {
            let result =
                call_rpc(&cli.rpc_url, "animation.status.v1", json!({ "job_id": job_id })).await?;
            let state = result["state"].as_str().unwrap_or("UNKNOWN");

            println!("  {} {}", "Job:".bold(), job_id);
            println!("  {} {}", "State:".bold(), colored_state(state));
            if let Some(url) = result["artifact_url"].as_str() {
                println!("  {} {}", "Artifact:".bold(), url);
            }
            if let Some(failure) = result.get("failure") {
                println!(
                    "  {} {} ({})",
                    "Last render:".bold(),
                    "FAILED".red(),
                    failure["kind"].as_str().unwrap_or("?")
                );
                if let Some(diagnostics) = failure["diagnostics"].as_str() {
                    println!();
                    println!("{}", diagnostics.dimmed());
                }
            }
        }

        Commands::Fetch { job_id, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.mp4", job_id)));
            let written = fetch(&cli.rpc_url, &job_id, output.clone()).await?;
            println!(
                "{}",
                format!("✓ Saved {} bytes to {}", written, output.display())
                    .green()
                    .bold()
            );
        }

        Commands::List => {
            let result = call_rpc(&cli.rpc_url, "animation.list.v1", json!({})).await?;
            let entries: Vec<JobEntry> = serde_json::from_value(result["jobs"].clone())?;

            if entries.is_empty() {
                println!("{}", "No jobs yet".yellow());
            } else {
                let rows: Vec<JobRow> = entries.into_iter().map(JobRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Health => {
            println!("{}", "Daemon Health".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "system.health.v1", json!({})).await {
                Ok(health) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), health["version"]);
                    println!("  {} {} seconds", "Uptime:".bold(), health["uptime_seconds"]);
                    println!("  {} {}", "Codegen:".bold(), health["codegen_mode"]);
                    println!(
                        "  {} {}/{}",
                        "Renders:".bold(),
                        health["renders_in_flight"],
                        health["render_capacity"]
                    );
                    println!();
                    let host = &health["host"];
                    println!(
                        "  {} {:.1}%",
                        "CPU:".bold(),
                        host["cpu_usage_percent"].as_f64().unwrap_or(0.0)
                    );
                    println!(
                        "  {} {} / {} MB",
                        "Memory:".bold(),
                        host["memory_used_mb"],
                        host["memory_total_mb"]
                    );
                    println!(
                        "  {} {} MB free of {} MB",
                        "Media disk:".bold(),
                        host["media_disk_available_mb"],
                        host["media_disk_total_mb"]
                    );
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
