use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked).
    Show,
}

pub fn run(config: &AppConfig, command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(config),
    }
}

fn run_show(cfg: &AppConfig) -> AppResult<()> {
    println!("Jira base URL: {}", display_value(&cfg.jira.base_url));
    println!("Jira email: {}", display_value(&cfg.jira.email));
    println!("Jira API token: {}", mask_secret(&cfg.jira.token));
    println!("Jira reviewer field: {}", cfg.jira.reviewer_field);
    println!("Confluence host: {}", display_value(&cfg.confluence.host));
    println!(
        "Confluence username: {}",
        display_value(&cfg.confluence.username)
    );
    println!("Confluence API token: {}", mask_secret(&cfg.confluence.token));
    println!("API key id: {}", display_value(&cfg.auth.api_key));
    println!("API secret: {}", mask_secret(&cfg.auth.api_secret));
    println!("Bearer token: {}", mask_secret(&cfg.auth.bearer_token));
    println!("Review tool: {}", cfg.review.review_tool);
    println!("Workspace root: {}", cfg.review.workspace_root);
    println!(
        "Organisation prefix: {}",
        display_value(&cfg.review.org_prefix)
    );
    for (repo, path) in &cfg.review.repo_paths {
        println!("  {repo} -> {path}");
    }
    println!("HTTP timeout: {}s", cfg.http_timeout.as_secs());

    Ok(())
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret(&Some("abcdefghij".to_string())), "abc***hij");
        assert_eq!(mask_secret(&Some("short".to_string())), "***");
        assert_eq!(mask_secret(&None), "<not set>");
        assert_eq!(mask_secret(&Some("ééééééé".to_string())), "ééé***ééé");
    }
}
