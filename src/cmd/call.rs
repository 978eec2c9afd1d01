use std::path::PathBuf;

use clap::Args;
use tokio::io::AsyncReadExt;

use crate::error::AppResult;
use crate::tools::{ToolEnvelope, ToolRouter};

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Read the tool-call envelope from this file instead of stdin.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Executes one tool call and prints the JSON response. Returns whether the
/// call succeeded.
pub async fn run(router: &ToolRouter, args: CallArgs) -> AppResult<bool> {
    let raw = match &args.file {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let envelope: ToolEnvelope = serde_json::from_str(&raw)?;
    let tool = envelope.call.tool.clone();
    let response = router.handle_envelope(envelope).await;
    tracing::debug!(%tool, status = response.status, "tool call finished");

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.ok)
}
