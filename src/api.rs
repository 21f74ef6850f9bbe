// ABOUTME: Async HTTP client for the Notion pages and blocks API
// ABOUTME: Handles throttling, auth headers, and fail-fast errors

use crate::import::{Connector, DocumentService};
use crate::model::Block;
use crate::util::truncate_str;
use crate::{Error, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Default pacing between calls; Notion averages three requests per second.
const DEFAULT_THROTTLE_MS: (u64, u64) = (350, 500);

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    throttle_min: u64,
    throttle_max: u64,
}

impl NotionClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_BASE.into());

        Ok(NotionClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            throttle_min: DEFAULT_THROTTLE_MS.0,
            throttle_max: DEFAULT_THROTTLE_MS.1,
        })
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    async fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .header("Accept", "application/json")
            .header("User-Agent", "notion-md-import/0.1 (Rust)")
            .json(&body)
            .send()
            .await?;

        self.throttle().await;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(parsed) => (parsed.code, parsed.message.unwrap_or_default()),
                Err(_) => (None, text),
            };
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                code,
                message: truncate_str(&message, 200),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(
                endpoint,
                body = %truncate_str(&text, 500),
                "failed to parse response: {}",
                e
            );
            Error::Parse(e)
        })
    }
}

#[async_trait]
impl DocumentService for NotionClient {
    async fn create_page(&self, parent_id: &str, title: &str, children: &[Block]) -> Result<String> {
        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": {
                    "title": [{ "text": { "content": title } }]
                }
            },
            "children": children,
        });

        let page: CreatedPage = self.send(Method::POST, "/v1/pages", body).await?;
        Ok(page.id)
    }

    async fn append_children(&self, page_id: &str, children: &[Block]) -> Result<()> {
        let endpoint = format!("/v1/blocks/{}/children", page_id);
        let _: IgnoredAny = self
            .send(Method::PATCH, &endpoint, json!({ "children": children }))
            .await?;
        Ok(())
    }
}

/// Builds a [`NotionClient`] per credential for the importer.
#[derive(Debug, Clone, Default)]
pub struct NotionConnector {
    api_base: Option<String>,
    throttle_ms: Option<(u64, u64)>,
}

impl NotionConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_ms = Some((min_ms, max_ms));
        self
    }

    pub fn disable_throttle(self) -> Self {
        self.with_throttle(0, 0)
    }
}

impl Connector for NotionConnector {
    type Service = NotionClient;

    fn connect(&self, credential: &str) -> Result<NotionClient> {
        let client = NotionClient::new(credential.to_string(), self.api_base.clone())?;
        Ok(match self.throttle_ms {
            Some((min, max)) => client.with_throttle(min, max),
            None => client,
        })
    }
}
