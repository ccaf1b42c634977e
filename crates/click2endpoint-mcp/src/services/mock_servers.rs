//! Discover Postman mock servers that can stand in for the C2M API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ServiceError;

pub const POSTMAN_API_BASE: &str = "https://api.getpostman.com";

/// Names containing this marker are preferred when present.
const PREFERRED_MARKER: &str = "c2m";
const UNKNOWN_COLLECTION: &str = "Unknown Collection";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workspace {
    #[default]
    Personal,
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockServer {
    pub name: String,
    pub url: String,
    pub id: String,
    pub collection: String,
    pub workspace: Workspace,
}

#[async_trait]
pub trait MockServerDirectory: Send + Sync {
    /// `Ok(None)` means discovery is not configured; callers fall back to a default URL.
    async fn list(&self) -> Result<Option<Vec<MockServer>>, ServiceError>;
}

#[derive(Debug, Deserialize)]
pub struct CollectionSummary {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub mock_url: Option<String>,
    #[serde(default)]
    pub config: Option<JsonValue>,
}

impl MockSummary {
    fn url(&self) -> String {
        self.mock_url
            .clone()
            .or_else(|| {
                self.config
                    .as_ref()
                    .and_then(|c| c.get("mockUrl"))
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("https://{}.mock.pstmn.io", self.id))
    }
}

/// Join mocks to their collections, keeping only C2M ones when any exist.
pub fn assemble(
    collections: &[CollectionSummary],
    mocks: &[MockSummary],
    workspace: Workspace,
) -> Vec<MockServer> {
    let names: HashMap<&str, &str> = collections
        .iter()
        .map(|c| (c.uid.as_str(), c.name.as_str()))
        .collect();
    let all: Vec<MockServer> = mocks
        .iter()
        .map(|m| {
            let collection = m
                .collection
                .as_deref()
                .and_then(|uid| names.get(uid).copied())
                .unwrap_or(UNKNOWN_COLLECTION)
                .to_string();
            MockServer {
                name: format!("{} ({})", m.name, collection),
                url: m.url(),
                id: m.id.clone(),
                collection,
                workspace,
            }
        })
        .collect();

    let preferred: Vec<MockServer> = all
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(PREFERRED_MARKER)
                || s.collection.to_lowercase().contains(PREFERRED_MARKER)
        })
        .cloned()
        .collect();
    if preferred.is_empty() { all } else { preferred }
}

/// Postman API backed directory.
pub struct PostmanDirectory {
    client: reqwest::Client,
    api_key: Option<String>,
    workspace: Workspace,
    base_url: String,
}

impl PostmanDirectory {
    pub fn new(api_key: Option<String>, workspace: Workspace) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            workspace,
            base_url: POSTMAN_API_BASE.to_string(),
        }
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(
        &self,
        api_key: &str,
        resource: &'static str,
    ) -> Result<Vec<T>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, resource))
            .header("X-Api-Key", api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                context: resource,
                status: status.as_u16(),
                body,
            });
        }
        let mut data: JsonValue = response.json().await?;
        match data.get_mut(resource).map(JsonValue::take) {
            Some(list) => Ok(serde_json::from_value(list)?),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl MockServerDirectory for PostmanDirectory {
    async fn list(&self) -> Result<Option<Vec<MockServer>>, ServiceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no Postman API key; skipping mock discovery");
            return Ok(None);
        };
        let collections: Vec<CollectionSummary> = self.fetch(api_key, "collections").await?;
        let mocks: Vec<MockSummary> = self.fetch(api_key, "mocks").await?;
        let servers = assemble(&collections, &mocks, self.workspace);
        tracing::info!(
            "discovered {} mock server(s) from {} mock(s)",
            servers.len(),
            mocks.len()
        );
        Ok(Some(servers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collections() -> Vec<CollectionSummary> {
        serde_json::from_value(json!([
            {"uid": "u-1", "name": "C2M API v2"},
            {"uid": "u-2", "name": "Petstore"}
        ]))
        .unwrap()
    }

    #[test]
    fn prefers_c2m_mocks_and_resolves_urls() {
        let mocks: Vec<MockSummary> = serde_json::from_value(json!([
            {"id": "m1", "name": "Primary", "collection": "u-1", "mockUrl": "https://m1.example"},
            {"id": "m2", "name": "Pets", "collection": "u-2"},
            {"id": "m3", "name": "c2m-staging", "config": {"mockUrl": "https://cfg.example"}}
        ]))
        .unwrap();
        let servers = assemble(&collections(), &mocks, Workspace::Team);
        let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Primary (C2M API v2)", "c2m-staging (Unknown Collection)"]
        );
        assert_eq!(servers[0].url, "https://m1.example");
        assert_eq!(servers[1].url, "https://cfg.example");
        assert_eq!(servers[1].workspace, Workspace::Team);
    }

    #[test]
    fn falls_back_to_all_mocks_and_default_url() {
        let mocks: Vec<MockSummary> =
            serde_json::from_value(json!([{"id": "abc", "name": "Pets", "collection": "u-2"}]))
                .unwrap();
        let servers = assemble(&collections(), &mocks, Workspace::Personal);
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].url, "https://abc.mock.pstmn.io");
        assert_eq!(servers[0].collection, "Petstore");
    }

    #[tokio::test]
    async fn unconfigured_directory_returns_none() {
        let dir = PostmanDirectory::new(Some("  ".into()), Workspace::Personal);
        assert_eq!(dir.list().await.unwrap(), None);
    }
}
