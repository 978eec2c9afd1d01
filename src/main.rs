mod auth;
mod clock;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
#[cfg(test)]
mod testing;
mod tools;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::auth::AuthGate;
use crate::clock::SystemClock;
use crate::cmd::call::{self, CallArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::sign::{self, SignArgs};
use crate::cmd::tools as tools_cmd;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::confluence::ConfluenceClient;
use crate::infra::jira::JiraClient;
use crate::tools::ToolRouter;

#[derive(Parser)]
#[command(
    name = "ticketgate",
    author,
    version,
    about = "Authenticated ticket and wiki tools for agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one tool-call envelope and print the JSON response.
    Call(CallArgs),
    /// List the available tools and their input schemas.
    Tools,
    /// Print signed-request headers for the configured API key.
    Sign(SignArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    init_logging();

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> AppResult<bool> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Tools => tools_cmd::run().map(|()| true),
        Commands::Config(args) => config_cmd::run(&config, args.command).map(|()| true),
        Commands::Sign(args) => sign::run(&config.auth, &SystemClock, args).map(|()| true),
        Commands::Call(args) => {
            let router = build_router(config)?;
            call::run(&router, args).await
        }
    }
}

fn build_router(config: AppConfig) -> AppResult<ToolRouter> {
    for setting in config.missing_settings() {
        warn!(setting, "not configured; tools that need it will fail");
    }

    let http = Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;

    let issue_tracker = Arc::new(JiraClient::new(http.clone(), &config.jira));
    let wiki = Arc::new(ConfluenceClient::new(http, &config.confluence));
    let gate = AuthGate::new(config.auth, Arc::new(SystemClock));
    let context = AppContext::new(config.review, issue_tracker, wiki);

    Ok(ToolRouter::new(gate, context))
}
