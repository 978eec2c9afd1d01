use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, Method, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::JiraSettings;
use crate::domain::ticket::{Comment, Issue, Reviewer, Transition};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const SEARCH_FIELDS: &str = "summary,status,assignee";

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    email: Option<String>,
    token: Option<String>,
    reviewer_field: String,
}

impl JiraClient {
    pub fn new(http: Client, settings: &JiraSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.clone(),
            email: settings.email.clone(),
            token: settings.token.clone(),
            reviewer_field: settings.reviewer_field.clone(),
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira email not configured".to_string()))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        Ok((base_url, email, token))
    }

    fn auth_header(email: &str, token: &str) -> String {
        let credentials = format!("{email}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn endpoint(base_url: &str, path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let (base_url, email, token) = self.api_details()?;
        Ok(self
            .http
            .request(method, Self::endpoint(base_url, path))
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json"))
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> AppResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|err| AppError::remote(operation, format!("failed to call Jira: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::remote(
                operation,
                format!("Jira responded with {status}: {body}"),
            ));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = self.send(operation, request).await?;
        response.json::<T>().await.map_err(|err| {
            AppError::remote(operation, format!("failed to parse Jira response: {err}"))
        })
    }

    fn decode_issue(&self, raw: JiraIssue) -> AppResult<Issue> {
        let reviewers = match raw.fields.extra.get(&self.reviewer_field) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<JiraUserRef>>(value.clone())
                .map_err(|err| {
                    AppError::remote(
                        "read ticket",
                        format!("unexpected {} value: {err}", self.reviewer_field),
                    )
                })?
                .into_iter()
                .map(|user| Reviewer { name: user.name })
                .collect(),
        };

        Ok(Issue {
            key: raw.key,
            summary: raw.fields.summary,
            status: raw.fields.status.name,
            assignee: raw.fields.assignee.map(|user| user.display_name),
            description: raw.fields.description,
            reviewers,
        })
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn fetch_issue(&self, key: &str) -> AppResult<Issue> {
        let request = self
            .request(Method::GET, &format!("issue/{key}"))?
            .query(&[("expand", "names,renderedFields")]);
        let raw: JiraIssue = self.get_json("read ticket", request).await?;
        self.decode_issue(raw)
    }

    async fn fetch_comments(&self, key: &str) -> AppResult<Vec<Comment>> {
        let request = self.request(Method::GET, &format!("issue/{key}/comment"))?;
        let page: JiraCommentPage = self.get_json("read ticket comments", request).await?;
        Ok(page
            .comments
            .into_iter()
            .map(|comment| Comment { body: comment.body })
            .collect())
    }

    async fn fetch_transitions(&self, key: &str) -> AppResult<Vec<Transition>> {
        let request = self.request(Method::GET, &format!("issue/{key}/transitions"))?;
        let list: JiraTransitionList = self.get_json("read ticket transitions", request).await?;
        Ok(list
            .transitions
            .into_iter()
            .map(|transition| Transition {
                id: transition.id,
                name: transition.name,
                target: transition.to.map(|status| status.name),
            })
            .collect())
    }

    async fn execute_transition(&self, key: &str, transition_id: &str) -> AppResult<()> {
        let body = JiraTransitionRequest {
            transition: JiraTransitionId {
                id: transition_id.to_string(),
            },
        };
        let request = self
            .request(Method::POST, &format!("issue/{key}/transitions"))?
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        self.send("transition ticket", request).await?;
        debug!(key, transition_id, "transition applied");
        Ok(())
    }

    async fn search(&self, jql: &str, max_results: usize) -> AppResult<Vec<Issue>> {
        let request = self.request(Method::GET, "search")?.query(&[
            ("jql", jql.to_string()),
            ("maxResults", max_results.to_string()),
            ("fields", format!("{SEARCH_FIELDS},{}", self.reviewer_field)),
        ]);
        let page: JiraSearchPage = self.get_json("search tickets", request).await?;
        page.issues
            .into_iter()
            .map(|issue| self.decode_issue(issue))
            .collect()
    }

    async fn set_reviewers(&self, key: &str, reviewers: &[Reviewer]) -> AppResult<()> {
        let mut fields = Map::new();
        fields.insert(self.reviewer_field.clone(), json!(reviewers));
        let request = self
            .request(Method::PUT, &format!("issue/{key}"))?
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "fields": fields }));
        self.send("update ticket reviewers", request).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Deserialize)]
struct JiraIssueFields {
    summary: String,
    status: JiraStatus,
    #[serde(default)]
    assignee: Option<JiraAssignee>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct JiraStatus {
    name: String,
}

#[derive(Deserialize)]
struct JiraAssignee {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Deserialize)]
struct JiraUserRef {
    name: String,
}

#[derive(Deserialize)]
struct JiraCommentPage {
    #[serde(default)]
    comments: Vec<JiraComment>,
}

#[derive(Deserialize)]
struct JiraComment {
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct JiraTransitionList {
    transitions: Vec<JiraTransition>,
}

#[derive(Deserialize)]
struct JiraTransition {
    #[serde(deserialize_with = "id_from_string_or_number")]
    id: String,
    name: String,
    #[serde(default)]
    to: Option<JiraTransitionTarget>,
}

#[derive(Deserialize)]
struct JiraTransitionTarget {
    name: String,
}

#[derive(Deserialize)]
struct JiraSearchPage {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Serialize)]
struct JiraTransitionRequest {
    transition: JiraTransitionId,
}

#[derive(Serialize)]
struct JiraTransitionId {
    id: String,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
