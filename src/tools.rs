//! Tool-style operations offered to the calling agent.
//!
//! A call names a tool and carries JSON arguments plus the request headers.
//! Headers are authenticated first; only then are arguments decoded and the
//! matching workflow run. Failures are rendered as caller-facing messages,
//! with upstream detail kept in the local log.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::auth::AuthGate;
use crate::context::AppContext;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::workflow::{page, ticket};

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A tool call together with the headers it arrived with.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolEnvelope {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub call: ToolCall,
}

impl ToolEnvelope {
    pub fn header_map(&self) -> AppResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| AppError::InvalidArguments(format!("invalid header name '{name}'")))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                AppError::InvalidArguments(format!("invalid value for header '{name}'"))
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetTicketByKey,
    TransitionTicket,
    ListTicketTransitions,
    ListTicketsByTeamAndStatus,
    ListTicketsBySprintAndTeam,
    AddCodeReviewer,
    GetWikiPage,
    UpdateWikiPage,
    CheckWikiConnection,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::GetTicketByKey,
        Tool::TransitionTicket,
        Tool::ListTicketTransitions,
        Tool::ListTicketsByTeamAndStatus,
        Tool::ListTicketsBySprintAndTeam,
        Tool::AddCodeReviewer,
        Tool::GetWikiPage,
        Tool::UpdateWikiPage,
        Tool::CheckWikiConnection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::GetTicketByKey => "get-ticket-by-key",
            Tool::TransitionTicket => "transition-ticket",
            Tool::ListTicketTransitions => "list-ticket-transitions",
            Tool::ListTicketsByTeamAndStatus => "list-tickets-by-team-and-status",
            Tool::ListTicketsBySprintAndTeam => "list-tickets-by-sprint-and-team",
            Tool::AddCodeReviewer => "add-code-reviewer",
            Tool::GetWikiPage => "get-wiki-page",
            Tool::UpdateWikiPage => "update-wiki-page",
            Tool::CheckWikiConnection => "check-wiki-connection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Tool::GetTicketByKey => {
                "Fetch a ticket with its description and the pull requests linked in its comments."
            }
            Tool::TransitionTicket => {
                "Move a ticket to a new status. Accepts synonyms such as 'send for review' or 'done'."
            }
            Tool::ListTicketTransitions => "List the statuses a ticket can move to right now.",
            Tool::ListTicketsByTeamAndStatus => "List a team's tickets in a given status.",
            Tool::ListTicketsBySprintAndTeam => "List a team's tickets in a given sprint.",
            Tool::AddCodeReviewer => "Add a user as code reviewer on one or more tickets.",
            Tool::GetWikiPage => "Fetch a wiki page and its storage-format HTML body.",
            Tool::UpdateWikiPage => "Replace the HTML body of a wiki page.",
            Tool::CheckWikiConnection => "Check that the wiki is reachable with the configured credentials.",
        }
    }

    fn input_schema(&self) -> Value {
        let string = json!({ "type": "string" });
        let (properties, required) = match self {
            Tool::GetTicketByKey | Tool::ListTicketTransitions => {
                (json!({ "key": string }), vec!["key"])
            }
            Tool::TransitionTicket => (
                json!({ "key": string, "status": string }),
                vec!["key", "status"],
            ),
            Tool::ListTicketsByTeamAndStatus => (
                json!({ "team": string, "status": string }),
                vec!["team", "status"],
            ),
            Tool::ListTicketsBySprintAndTeam => (
                json!({ "sprint": string, "team": string }),
                vec!["sprint", "team"],
            ),
            Tool::AddCodeReviewer => (
                json!({
                    "keys": { "type": "array", "items": string },
                    "username": string,
                }),
                vec!["keys", "username"],
            ),
            Tool::GetWikiPage => (json!({ "page_id": string }), vec!["page_id"]),
            Tool::UpdateWikiPage => (
                json!({
                    "page_id": string,
                    "content": string,
                    "minor_edit": { "type": "boolean" },
                }),
                vec!["page_id", "content"],
            ),
            Tool::CheckWikiConnection => (json!({}), vec![]),
        };
        json!({ "type": "object", "properties": properties, "required": required })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn definitions() -> Vec<ToolDefinition> {
    Tool::ALL
        .into_iter()
        .map(|tool| ToolDefinition {
            name: tool.as_str(),
            description: tool.description(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl ToolResponse {
    fn success(result: Value) -> Self {
        Self {
            ok: true,
            status: 200,
            result: Some(result),
            error: None,
            available: None,
        }
    }

    fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            result: None,
            error: Some(message.into()),
            available: None,
        }
    }

    pub fn from_error(err: AppError) -> Self {
        let message = err.caller_message();
        match err {
            AppError::Auth(rejection) => {
                info!(reason = %rejection, "request rejected");
                Self::failure(rejection.status_code(), message)
            }
            AppError::RemoteFetch { operation, detail } => {
                error!(%operation, %detail, "upstream call failed");
                Self::failure(502, message)
            }
            AppError::InvalidTransition { available, .. } => Self {
                available: Some(available),
                ..Self::failure(422, message)
            },
            AppError::InvalidArguments(_) => Self::failure(400, message),
            AppError::UnknownTool(_) => Self::failure(404, message),
            other => {
                error!(error = %other, "tool call failed");
                Self::failure(500, message)
            }
        }
    }
}

pub struct ToolRouter {
    gate: AuthGate,
    ctx: AppContext,
}

impl ToolRouter {
    pub fn new(gate: AuthGate, ctx: AppContext) -> Self {
        Self { gate, ctx }
    }

    pub async fn handle(&self, headers: &HeaderMap, call: ToolCall) -> ToolResponse {
        if let Err(rejection) = self.gate.check(headers) {
            return ToolResponse::from_error(rejection.into());
        }
        match self.dispatch(call).await {
            Ok(result) => ToolResponse::success(result),
            Err(err) => ToolResponse::from_error(err),
        }
    }

    pub async fn handle_envelope(&self, envelope: ToolEnvelope) -> ToolResponse {
        match envelope.header_map() {
            Ok(headers) => self.handle(&headers, envelope.call).await,
            Err(err) => ToolResponse::from_error(err),
        }
    }

    async fn dispatch(&self, call: ToolCall) -> AppResult<Value> {
        let tool = Tool::from_name(&call.tool).ok_or(AppError::UnknownTool(call.tool))?;
        let ctx = &self.ctx;
        let args = call.arguments;

        let result = match tool {
            Tool::GetTicketByKey => {
                let args: KeyArgs = decode(args)?;
                let ticket = ticket::fetch_ticket(ctx, &args.key).await?;
                serde_json::to_value(TicketView::new(&ticket, true))?
            }
            Tool::TransitionTicket => {
                let args: TransitionArgs = decode(args)?;
                let outcome = ticket::apply_transition(ctx, &args.key, &args.status).await?;
                serde_json::to_value(outcome)?
            }
            Tool::ListTicketTransitions => {
                let args: KeyArgs = decode(args)?;
                serde_json::to_value(ticket::list_transitions(ctx, &args.key).await?)?
            }
            Tool::ListTicketsByTeamAndStatus => {
                let args: TeamStatusArgs = decode(args)?;
                let tickets =
                    ticket::search_by_team_and_status(ctx, &args.team, &args.status).await?;
                ticket_list(&tickets)?
            }
            Tool::ListTicketsBySprintAndTeam => {
                let args: SprintTeamArgs = decode(args)?;
                let tickets =
                    ticket::search_by_sprint_and_team(ctx, &args.sprint, &args.team).await?;
                ticket_list(&tickets)?
            }
            Tool::AddCodeReviewer => {
                let args: ReviewerArgs = decode(args)?;
                serde_json::to_value(
                    ticket::add_code_reviewer(ctx, &args.keys, &args.username).await?,
                )?
            }
            Tool::GetWikiPage => {
                let args: PageArgs = decode(args)?;
                serde_json::to_value(page::fetch_page(ctx, &args.page_id).await?)?
            }
            Tool::UpdateWikiPage => {
                let args: PageUpdateArgs = decode(args)?;
                serde_json::to_value(
                    page::update_page(ctx, &args.page_id, &args.content, args.minor_edit).await?,
                )?
            }
            Tool::CheckWikiConnection => serde_json::to_value(page::check_connection(ctx).await)?,
        };
        Ok(result)
    }
}

fn decode<T: DeserializeOwned>(arguments: Value) -> AppResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|err| AppError::InvalidArguments(err.to_string()))
}

fn ticket_list(tickets: &[Ticket]) -> AppResult<Value> {
    let views: Vec<_> = tickets
        .iter()
        .map(|ticket| TicketView::new(ticket, false))
        .collect();
    Ok(serde_json::to_value(views)?)
}

#[derive(Deserialize)]
struct KeyArgs {
    key: String,
}

#[derive(Deserialize)]
struct TransitionArgs {
    key: String,
    status: String,
}

#[derive(Deserialize)]
struct TeamStatusArgs {
    team: String,
    status: String,
}

#[derive(Deserialize)]
struct SprintTeamArgs {
    sprint: String,
    team: String,
}

#[derive(Deserialize)]
struct ReviewerArgs {
    keys: Vec<String>,
    username: String,
}

#[derive(Deserialize)]
struct PageArgs {
    page_id: String,
}

#[derive(Deserialize)]
struct PageUpdateArgs {
    page_id: String,
    content: String,
    #[serde(default)]
    minor_edit: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketView<'a> {
    key: &'a str,
    summary: &'a str,
    status: &'a str,
    assignee: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    pull_requests: Vec<PullRequestView<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestView<'a> {
    link: String,
    executable_command: &'a str,
}

impl<'a> TicketView<'a> {
    fn new(ticket: &'a Ticket, include_description: bool) -> Self {
        Self {
            key: &ticket.key,
            summary: &ticket.summary,
            status: &ticket.status,
            assignee: ticket.assignee.as_deref().unwrap_or("Unassigned"),
            description: ticket
                .description
                .as_deref()
                .filter(|_| include_description),
            pull_requests: ticket
                .pull_requests
                .iter()
                .map(|reference| PullRequestView {
                    link: reference.link(),
                    executable_command: reference.command(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::sign_request;
    use crate::clock::FixedClock;
    use crate::config::AuthSettings;
    use crate::domain::ticket::Transition;
    use crate::testing::{FakeTracker, context};

    const NOW: i64 = 1_700_000_000_000;

    fn router(tracker: FakeTracker) -> (ToolRouter, Arc<FakeTracker>) {
        let (ctx, tracker) = context(tracker);
        let gate = AuthGate::new(
            AuthSettings {
                bearer_token: Some("tok".to_string()),
                api_key: Some("client-1".to_string()),
                api_secret: Some("s3cret".to_string()),
            },
            Arc::new(FixedClock(NOW)),
        );
        (ToolRouter::new(gate, ctx), tracker)
    }

    fn envelope(headers: &[(&str, &str)], tool: &str, arguments: Value) -> ToolEnvelope {
        serde_json::from_value(json!({
            "headers": headers.iter().cloned().collect::<BTreeMap<_, _>>(),
            "tool": tool,
            "arguments": arguments,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_before_running_any_workflow() {
        let tracker = FakeTracker {
            transitions: vec![Transition {
                id: "1".to_string(),
                name: "Code Review".to_string(),
                target: None,
            }],
            ..FakeTracker::default()
        };
        let (router, tracker) = router(tracker);
        let call = envelope(
            &[("Authorization", "Bearer wrong")],
            "transition-ticket",
            json!({ "key": "STK-1", "status": "review" }),
        );
        let response = router.handle_envelope(call).await;
        assert_eq!(response.status, 403);
        assert_eq!(response.error.as_deref(), Some("Invalid bearer token"));
        assert!(tracker.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_request_reaches_the_ticket_workflow() {
        let tracker = FakeTracker::default().with_issue(
            "STK-1",
            "Fix login",
            &["https://git.example.com/org/repo/pull/7"],
        );
        let (router, _) = router(tracker);
        let ts = NOW.to_string();
        let signature = sign_request("client-1", "s3cret", &ts).unwrap();
        let call = envelope(
            &[
                ("x-api-key", "client-1"),
                ("x-api-timestamp", &ts),
                ("x-api-signature", &signature),
            ],
            "get-ticket-by-key",
            json!({ "key": "STK-1" }),
        );
        let response = router.handle_envelope(call).await;
        assert!(response.ok);
        let result = response.result.unwrap();
        assert_eq!(result["assignee"], "Unassigned");
        assert_eq!(
            result["pullRequests"][0]["link"],
            "[7 - org/repo](https://git.example.com/org/repo/pull/7)"
        );
        assert_eq!(
            result["pullRequests"][0]["executableCommand"],
            "cd ~/dev/repo && git.code.review 7"
        );
    }

    #[tokio::test]
    async fn invalid_transition_reports_alternatives() {
        let tracker = FakeTracker {
            transitions: vec![Transition {
                id: "1".to_string(),
                name: "Code Review".to_string(),
                target: None,
            }],
            ..FakeTracker::default()
        };
        let (router, _) = router(tracker);
        let call = envelope(
            &[("authorization", "Bearer tok")],
            "transition-ticket",
            json!({ "key": "STK-1", "status": "nonexistent status" }),
        );
        let response = router.handle_envelope(call).await;
        assert_eq!(response.status, 422);
        assert_eq!(response.available, Some(vec!["Code Review".to_string()]));
    }

    #[tokio::test]
    async fn hides_upstream_detail_from_the_caller() {
        let (router, _) = router(FakeTracker::default());
        let call = envelope(
            &[("authorization", "Bearer tok")],
            "get-ticket-by-key",
            json!({ "key": "STK-404" }),
        );
        let response = router.handle_envelope(call).await;
        assert_eq!(response.status, 502);
        assert_eq!(response.error.as_deref(), Some("Failed to read ticket"));
    }

    #[tokio::test]
    async fn reports_unknown_tools_and_bad_arguments() {
        let (router, _) = router(FakeTracker::default());
        let unknown = envelope(&[("authorization", "Bearer tok")], "delete-everything", json!({}));
        assert_eq!(router.handle_envelope(unknown).await.status, 404);

        let missing = envelope(
            &[("authorization", "Bearer tok")],
            "transition-ticket",
            json!({ "key": "STK-1" }),
        );
        let response = router.handle_envelope(missing).await;
        assert_eq!(response.status, 400);
        assert!(response.error.unwrap().contains("status"));
    }

    #[test]
    fn every_tool_is_listed_once() {
        let defs = definitions();
        assert_eq!(defs.len(), Tool::ALL.len());
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(Tool::from_name("get_ticket"), None);
    }
}
