use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::ReviewSettings;
use crate::domain::ticket::Comment;

static PULL_REQUEST_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S*/pull/[0-9]+").expect("valid pull request link regex")
});

static PULL_REQUEST_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://[^/\s|]+/([^/\s|]+)/([^/\s|]+)/pull/([0-9]+)")
        .expect("valid pull request parts regex")
});

const NO_COMMAND: &str = "No command available";

/// Collects every pull-request URL mentioned in `comments`, in comment order
/// and then in order of appearance. Repeated links are kept.
pub fn extract_pull_request_links(comments: &[Comment]) -> Vec<String> {
    comments
        .iter()
        .flat_map(|comment| PULL_REQUEST_LINK.find_iter(&comment.body))
        .map(|found| found.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrAlias {
    /// `org/repo`
    pub repo: String,
    pub pr_number: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestReference {
    pub url: String,
    pub label: String,
    pub alias: Option<PrAlias>,
}

impl PullRequestReference {
    /// Markdown link to the pull request.
    pub fn link(&self) -> String {
        format!("[{}]({})", self.label, self.url)
    }

    pub fn command(&self) -> &str {
        self.alias
            .as_ref()
            .map(|alias| alias.command.as_str())
            .unwrap_or(NO_COMMAND)
    }
}

/// Derives local review commands for pull-request URLs.
#[derive(Debug, Clone)]
pub struct PrAliasResolver {
    settings: ReviewSettings,
}

impl PrAliasResolver {
    pub fn new(settings: ReviewSettings) -> Self {
        Self { settings }
    }

    /// Derives the alias from the first `/<org>/<repo>/pull/<n>` URL found in
    /// `url`, which may be several links glued together by a smart-link body.
    pub fn alias(&self, url: &str) -> Option<PrAlias> {
        let caps = PULL_REQUEST_PARTS.captures(url)?;
        let repo = format!("{}/{}", &caps[1], &caps[2]);
        let pr_number = caps[3].to_string();
        let path = self.repo_path(&repo, &caps[2]);
        let command = format!("cd {path} && {} {pr_number}", self.settings.review_tool);
        Some(PrAlias {
            repo,
            pr_number,
            command,
        })
    }

    pub fn reference(&self, url: String) -> PullRequestReference {
        let alias = self.alias(&url);
        let label = match &alias {
            Some(alias) => format!("{} - {}", alias.pr_number, self.short_repo(&alias.repo)),
            None => "PR - repo".to_string(),
        };
        PullRequestReference { url, label, alias }
    }

    pub fn references(&self, comments: &[Comment]) -> Vec<PullRequestReference> {
        extract_pull_request_links(comments)
            .into_iter()
            .map(|url| self.reference(url))
            .collect()
    }

    fn repo_path(&self, repo: &str, name: &str) -> String {
        match self.settings.repo_paths.get(repo) {
            Some(path) => path.clone(),
            None => format!(
                "{}/{}",
                self.settings.workspace_root.trim_end_matches('/'),
                name
            ),
        }
    }

    fn short_repo<'a>(&self, repo: &'a str) -> &'a str {
        self.settings
            .org_prefix
            .as_deref()
            .map(|prefix| prefix.trim_end_matches('/'))
            .and_then(|org| repo.strip_prefix(org))
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(repo)
    }
}
