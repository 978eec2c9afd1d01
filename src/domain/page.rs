use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Space {
    pub key: String,
    pub name: String,
}

/// A wiki page with its storage-format body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiPage {
    pub id: String,
    pub title: String,
    pub version: u64,
    pub space: Space,
    pub labels: Vec<String>,
    pub last_updated: Option<String>,
    pub updated_by: Option<String>,
    pub html_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageUpdate {
    pub id: String,
    pub title: String,
    pub version: u64,
    pub space_key: String,
    pub html_content: String,
    pub minor_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRevision {
    pub id: String,
    pub title: String,
    pub version: u64,
    pub space: Space,
    pub last_updated: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    pub server_url: String,
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}
