use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::ConfluenceSettings;
use crate::domain::page::{ConnectionReport, PageRevision, PageUpdate, Space, WikiPage};
use crate::error::{AppError, AppResult};
use crate::services::WikiService;

const PAGE_EXPANSIONS: &str = "body.storage,version,space,metadata.labels";

pub struct ConfluenceClient {
    http: Client,
    host: Option<String>,
    username: Option<String>,
    token: Option<String>,
}

impl ConfluenceClient {
    pub fn new(http: Client, settings: &ConfluenceSettings) -> Self {
        Self {
            http,
            host: settings.host.clone(),
            username: settings.username.clone(),
            token: settings.token.clone(),
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str)> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Confluence host not configured".to_string()))?;
        let token = self.token.as_deref().ok_or_else(|| {
            AppError::Configuration("Confluence API token not configured".to_string())
        })?;
        Ok((host, token))
    }

    fn endpoint(host: &str, path: &str) -> String {
        format!("{}/rest/api/{}", host.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let (host, token) = self.api_details()?;
        Ok(self
            .http
            .request(method, Self::endpoint(host, path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json"))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = request.send().await.map_err(|err| {
            AppError::remote(operation, format!("failed to call Confluence: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .json::<ConfluenceErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(AppError::remote(
                operation,
                format!("Confluence responded with {status}: {body}"),
            ));
        }

        response.json::<T>().await.map_err(|err| {
            AppError::remote(operation, format!("failed to parse Confluence response: {err}"))
        })
    }

    fn server_report(
        &self,
        success: bool,
        message: String,
        status_code: Option<u16>,
    ) -> ConnectionReport {
        ConnectionReport {
            success,
            message,
            server_url: self.host.clone().unwrap_or_default(),
            username: self.username.clone(),
            status_code,
        }
    }
}

#[async_trait]
impl WikiService for ConfluenceClient {
    async fn fetch_page(&self, page_id: &str) -> AppResult<WikiPage> {
        let request = self
            .request(Method::GET, &format!("content/{page_id}"))?
            .query(&[("expand", PAGE_EXPANSIONS)]);
        let page: ConfluencePage = self.fetch_json("fetch page", request).await?;
        Ok(WikiPage {
            id: page.id,
            title: page.title,
            version: page.version.number,
            space: page.space.into(),
            labels: page
                .metadata
                .map(|metadata| metadata.labels.results)
                .unwrap_or_default()
                .into_iter()
                .map(|label| label.name)
                .collect(),
            last_updated: page.version.when,
            updated_by: page.version.by.and_then(|user| user.display_name),
            html_content: page.body.storage.value,
        })
    }

    async fn store_page(&self, update: &PageUpdate) -> AppResult<PageRevision> {
        let payload = ConfluencePageUpdate {
            id: &update.id,
            page_type: "page",
            title: &update.title,
            space: ConfluenceSpaceKey {
                key: &update.space_key,
            },
            version: ConfluenceVersionUpdate {
                number: update.version,
                minor_edit: update.minor_edit,
            },
            body: ConfluenceBodyUpdate {
                storage: ConfluenceStorageUpdate {
                    value: &update.html_content,
                    representation: "storage",
                },
            },
        };
        let request = self
            .request(Method::PUT, &format!("content/{}", update.id))?
            .header(CONTENT_TYPE, "application/json")
            .json(&payload);
        let page: ConfluencePageSummary = self.fetch_json("update page", request).await?;
        Ok(PageRevision {
            id: page.id,
            title: page.title,
            version: page.version.number,
            space: page.space.into(),
            last_updated: page.version.when,
            updated_by: page.version.by.and_then(|user| user.display_name),
        })
    }

    async fn check_connection(&self) -> ConnectionReport {
        let request = match self.request(Method::GET, "space") {
            Ok(request) => request.query(&[("limit", "1")]),
            Err(err) => return self.server_report(false, err.to_string(), None),
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                self.server_report(true, "Successfully connected to Confluence".to_string(), None)
            }
            Ok(response) => {
                let status = response.status();
                error!(%status, "Confluence connection check failed");
                self.server_report(
                    false,
                    format!("Connection test failed: Confluence responded with {status}"),
                    Some(status.as_u16()),
                )
            }
            Err(err) => {
                error!(error = %err, "Confluence connection check failed");
                self.server_report(
                    false,
                    format!("Connection test failed: {err}"),
                    err.status().map(|status| status.as_u16()),
                )
            }
        }
    }
}

#[derive(Deserialize)]
struct ConfluenceErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ConfluencePage {
    id: String,
    title: String,
    version: ConfluenceVersion,
    space: ConfluenceSpace,
    body: ConfluenceBody,
    #[serde(default)]
    metadata: Option<ConfluenceMetadata>,
}

#[derive(Deserialize)]
struct ConfluencePageSummary {
    id: String,
    title: String,
    version: ConfluenceVersion,
    space: ConfluenceSpace,
}

#[derive(Deserialize)]
struct ConfluenceVersion {
    number: u64,
    #[serde(default)]
    when: Option<String>,
    #[serde(default)]
    by: Option<ConfluenceUser>,
}

#[derive(Deserialize)]
struct ConfluenceUser {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ConfluenceSpace {
    key: String,
    #[serde(default)]
    name: String,
}

impl From<ConfluenceSpace> for Space {
    fn from(space: ConfluenceSpace) -> Self {
        Space {
            key: space.key,
            name: space.name,
        }
    }
}

#[derive(Deserialize)]
struct ConfluenceBody {
    storage: ConfluenceStorage,
}

#[derive(Deserialize)]
struct ConfluenceStorage {
    value: String,
}

#[derive(Deserialize)]
struct ConfluenceMetadata {
    #[serde(default)]
    labels: ConfluenceLabels,
}

#[derive(Deserialize, Default)]
struct ConfluenceLabels {
    #[serde(default)]
    results: Vec<ConfluenceLabel>,
}

#[derive(Deserialize)]
struct ConfluenceLabel {
    name: String,
}

#[derive(Serialize)]
struct ConfluencePageUpdate<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    page_type: &'static str,
    title: &'a str,
    space: ConfluenceSpaceKey<'a>,
    version: ConfluenceVersionUpdate,
    body: ConfluenceBodyUpdate<'a>,
}

#[derive(Serialize)]
struct ConfluenceSpaceKey<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct ConfluenceVersionUpdate {
    number: u64,
    #[serde(rename = "minorEdit")]
    minor_edit: bool,
}

#[derive(Serialize)]
struct ConfluenceBodyUpdate<'a> {
    storage: ConfluenceStorageUpdate<'a>,
}

#[derive(Serialize)]
struct ConfluenceStorageUpdate<'a> {
    value: &'a str,
    representation: &'static str,
}
