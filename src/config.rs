use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

const DEFAULT_REVIEWER_FIELD: &str = "customfield_19601";
const DEFAULT_REVIEW_TOOL: &str = "git.code.review";
const DEFAULT_WORKSPACE_ROOT: &str = "~/dev";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: AuthSettings,
    pub jira: JiraSettings,
    pub confluence: ConfluenceSettings,
    pub review: ReviewSettings,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub reviewer_field: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfluenceSettings {
    pub host: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
}

/// Settings for turning pull-request URLs into local review commands.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub review_tool: String,
    pub workspace_root: String,
    /// Organisation prefix (`org/`) stripped from display labels.
    pub org_prefix: Option<String>,
    /// Known `org/repo` checkouts and their local paths.
    pub repo_paths: BTreeMap<String, String>,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            review_tool: DEFAULT_REVIEW_TOOL.to_string(),
            workspace_root: DEFAULT_WORKSPACE_ROOT.to_string(),
            org_prefix: None,
            repo_paths: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank
    /// values are treated as unset. Auth secrets keep surrounding whitespace
    /// since they must match what clients sign or send byte for byte.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let secret = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                AppError::Configuration(format!("HTTP_TIMEOUT_SECS must be a number, got '{raw}'"))
            })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let repo_paths = match get("PR_REPO_PATHS") {
            Some(raw) => parse_repo_paths(&raw)?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            auth: AuthSettings {
                bearer_token: secret("GPT_BEARER_TOKEN"),
                api_key: get("MCP_API_KEY"),
                api_secret: secret("MCP_API_SECRET"),
            },
            jira: JiraSettings {
                base_url: get("JIRA_API_BASE_URL"),
                email: get("JIRA_EMAIL"),
                token: get("JIRA_API_TOKEN"),
                reviewer_field: get("JIRA_REVIEWER_FIELD")
                    .unwrap_or_else(|| DEFAULT_REVIEWER_FIELD.to_string()),
            },
            confluence: ConfluenceSettings {
                host: get("CONFLUENCE_HOST"),
                username: get("CONFLUENCE_USERNAME"),
                token: get("CONFLUENCE_API_TOKEN"),
            },
            review: ReviewSettings {
                review_tool: get("PR_REVIEW_TOOL")
                    .unwrap_or_else(|| DEFAULT_REVIEW_TOOL.to_string()),
                workspace_root: get("PR_WORKSPACE_ROOT")
                    .unwrap_or_else(|| DEFAULT_WORKSPACE_ROOT.to_string()),
                org_prefix: get("PR_ORG_PREFIX"),
                repo_paths,
            },
            http_timeout,
        })
    }

    /// Settings that are absent but needed by some tool. Reported at startup;
    /// the affected tools fail when called.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let checks = [
            ("JIRA_API_BASE_URL", self.jira.base_url.is_none()),
            ("JIRA_EMAIL", self.jira.email.is_none()),
            ("JIRA_API_TOKEN", self.jira.token.is_none()),
            ("CONFLUENCE_HOST", self.confluence.host.is_none()),
            ("CONFLUENCE_API_TOKEN", self.confluence.token.is_none()),
            ("MCP_API_KEY", self.auth.api_key.is_none()),
            ("MCP_API_SECRET", self.auth.api_secret.is_none()),
            ("GPT_BEARER_TOKEN", self.auth.bearer_token.is_none()),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(name, _)| name)
            .collect()
    }
}

fn parse_repo_paths(raw: &str) -> AppResult<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (repo, path) = entry.split_once('=').ok_or_else(|| {
                AppError::Configuration(format!(
                    "PR_REPO_PATHS entry '{entry}' must look like org/repo=path"
                ))
            })?;
            let (repo, path) = (repo.trim(), path.trim());
            if !repo.contains('/') || path.is_empty() {
                return Err(AppError::Configuration(format!(
                    "PR_REPO_PATHS entry '{entry}' must look like org/repo=path"
                )));
            }
            Ok((repo.to_string(), path.to_string()))
        })
        .collect()
}
