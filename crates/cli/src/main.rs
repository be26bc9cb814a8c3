//! # sigmascholar-cli: Operator tool for the ingestion pipeline
//!
//! Runs one ingestion request in the foreground, or enqueues it onto the
//! Pub/Sub topic the way the trigger endpoint would. Both commands read the
//! same `config.yml` as the server.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest::Client as ReqwestClient;
use sigmascholar::{providers::queue::MessagePublisher, ExecutionOutcome, IngestionRequest};
use sigmascholar_server::{
    config::get_config,
    state::{build_executor, build_pubsub_publisher, build_token_source},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file. Defaults to the server's lookup.
    #[arg(long, global = true, env = "SIGMA_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline for one uploaded file and record its status
    Process(RequestArgs),
    /// Publish a processing request for the deployed consumer
    Enqueue(RequestArgs),
}

#[derive(Args, Debug, Clone)]
struct RequestArgs {
    /// Owner of the file record
    #[arg(long)]
    user_id: String,
    /// Caller-side file identifier
    #[arg(long)]
    file_id: String,
    /// Object path inside the storage bucket
    #[arg(long)]
    storage_path: String,
    /// File name stored on the file record
    #[arg(long)]
    file_name: String,
}

impl From<RequestArgs> for IngestionRequest {
    fn from(args: RequestArgs) -> Self {
        IngestionRequest {
            user_id: args.user_id,
            file_id: args.file_id,
            storage_path: args.storage_path,
            file_name: args.file_name,
        }
    }
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Process(args) => handle_process(cli.config.as_deref(), args.into()).await,
        Commands::Enqueue(args) => handle_enqueue(cli.config.as_deref(), args.into()).await,
    }
}

// --- Command Handlers ---

async fn handle_process(config_path: Option<&str>, request: IngestionRequest) -> Result<()> {
    let config = get_config(config_path).context("Failed to load configuration")?;
    let client = ReqwestClient::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let token_source = build_token_source(&config, &client);
    let executor = build_executor(&config, &client, token_source).await?;

    info!(file_name = %request.file_name, "Processing file in the foreground.");
    let outcome = executor.execute(&request).await;
    println!("{}", outcome_summary(&outcome));

    match outcome {
        ExecutionOutcome::Completed { .. } | ExecutionOutcome::RecordMissing => Ok(()),
        ExecutionOutcome::Failed { error } => bail!("Processing failed: {error}"),
        ExecutionOutcome::StatusWriteFailed { error } => {
            bail!("Could not record the processing status: {error}")
        }
    }
}

async fn handle_enqueue(config_path: Option<&str>, request: IngestionRequest) -> Result<()> {
    let config = get_config(config_path).context("Failed to load configuration")?;
    let client = ReqwestClient::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let token_source = build_token_source(&config, &client);
    let publisher = build_pubsub_publisher(&config, &client, token_source)?;

    let message_id = publisher.publish(&request).await?;
    println!(
        "{}",
        serde_json::json!({ "messageId": message_id, "topic": config.queue.topic })
    );
    Ok(())
}

/// One-line JSON summary of an execution, printed on stdout.
fn outcome_summary(outcome: &ExecutionOutcome) -> serde_json::Value {
    match outcome {
        ExecutionOutcome::Completed {
            element_count,
            text_length,
            used_fallback,
        } => serde_json::json!({
            "status": "completed",
            "elementCount": element_count,
            "textLength": text_length,
            "usedFallback": used_fallback,
        }),
        ExecutionOutcome::Failed { error } => {
            serde_json::json!({ "status": "failed", "error": error })
        }
        ExecutionOutcome::RecordMissing => serde_json::json!({ "status": "record_missing" }),
        ExecutionOutcome::StatusWriteFailed { error } => {
            serde_json::json!({ "status": "status_write_failed", "error": error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_args_build_request() {
        let cli = Cli::try_parse_from([
            "sigmascholar-cli",
            "process",
            "--user-id",
            "u1",
            "--file-id",
            "f1",
            "--storage-path",
            "u1/f.pdf",
            "--file-name",
            "f.pdf",
        ])
        .unwrap();

        let Commands::Process(args) = cli.command else {
            panic!("expected the process command");
        };
        let request: IngestionRequest = args.into();
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.storage_path, "u1/f.pdf");
        assert_eq!(request.file_name, "f.pdf");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result = Cli::try_parse_from(["sigmascholar-cli", "enqueue", "--user-id", "u1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_summary_reports_counts() {
        let summary = outcome_summary(&ExecutionOutcome::Completed {
            element_count: 2,
            text_length: 12,
            used_fallback: false,
        });
        assert_eq!(summary["status"], "completed");
        assert_eq!(summary["textLength"], 12);
    }
}
