use clap::Args;

use crate::auth::{API_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, sign_request};
use crate::clock::Clock;
use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Sign this epoch-millisecond timestamp instead of the current time.
    #[arg(long)]
    pub timestamp: Option<i64>,
}

/// Prints signed-request headers for the configured key, ready to paste into
/// a tool-call envelope.
pub fn run(settings: &AuthSettings, clock: &dyn Clock, args: SignArgs) -> AppResult<()> {
    let key = settings
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::Configuration("MCP_API_KEY not configured".to_string()))?;
    let secret = settings
        .api_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration("MCP_API_SECRET not configured".to_string()))?;

    let timestamp = args
        .timestamp
        .unwrap_or_else(|| clock.now_millis())
        .to_string();
    let signature = sign_request(key, secret, &timestamp)
        .map_err(|err| AppError::Configuration(format!("cannot sign with secret: {err}")))?;

    let headers = serde_json::json!({
        API_KEY_HEADER: key,
        TIMESTAMP_HEADER: timestamp,
        SIGNATURE_HEADER: signature,
    });
    println!("{}", serde_json::to_string_pretty(&headers)?);
    Ok(())
}
