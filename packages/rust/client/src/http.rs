//! `reqwest`-backed [`DocumentApi`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;

use blockscribe_shared::{
    ApiConfig, BlockRecord, BlockscribeError, DatabaseRecord, PageRecord, PaginatedList, Result,
};

use crate::{DocumentApi, QueryFilter};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("Blockscribe/", env!("CARGO_PKG_VERSION"));

/// Error body the API returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// HTTP client for a Notion-compatible REST API.
pub struct HttpDocumentApi {
    client: Client,
    base_url: Url,
    token: String,
    api_version: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpDocumentApi {
    /// Build a client from the `[api]` config section and a bearer token.
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlockscribeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            token: token.into(),
            api_version: config.api_version.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Append path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BlockscribeError::config(format!("base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
    }

    /// Send a request, retrying rate-limited responses, and decode the JSON body.
    async fn send<T: DeserializeOwned>(&self, build: impl Fn() -> RequestBuilder) -> Result<T> {
        let mut attempt = 0;

        loop {
            let response = self
                .authorized(build())
                .send()
                .await
                .map_err(|e| BlockscribeError::Network(e.to_string()))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                let delay = retry_after(&response)
                    .unwrap_or_else(|| backoff_delay(self.retry_backoff, attempt));
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
                    Ok(err) => (err.code, err.message),
                    Err(_) => (String::new(), body),
                };
                return Err(BlockscribeError::Api {
                    status: status.as_u16(),
                    code,
                    message,
                });
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| BlockscribeError::parse(format!("unexpected response body: {e}")));
        }
    }
}

/// Longest wait between rate-limit retries.
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Exponential backoff from `base`, capped at [`MAX_BACKOFF`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// `Retry-After` header in whole seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    #[instrument(skip_all, fields(collection_id = %collection_id, cursor = ?cursor))]
    async fn query_collection(
        &self,
        collection_id: &str,
        filter: &QueryFilter,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<PageRecord>> {
        let url = self.endpoint(&["databases", collection_id, "query"])?;

        let mut body = json!({
            "filter": filter.to_json(),
            "page_size": page_size,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        debug!("querying collection");
        self.send(|| self.client.post(url.clone()).json(&body)).await
    }

    #[instrument(skip_all, fields(block_id = %block_id, cursor = ?cursor))]
    async fn get_block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedList<BlockRecord>> {
        let mut url = self.endpoint(&["blocks", block_id, "children"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page_size", &page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("start_cursor", cursor);
            }
        }

        debug!("listing block children");
        self.send(|| self.client.get(url.clone())).await
    }

    #[instrument(skip_all, fields(page_id = %page_id))]
    async fn get_page(&self, page_id: &str) -> Result<PageRecord> {
        let url = self.endpoint(&["pages", page_id])?;
        self.send(|| self.client.get(url.clone())).await
    }

    #[instrument(skip_all, fields(database_id = %database_id))]
    async fn get_database(&self, database_id: &str) -> Result<DatabaseRecord> {
        let url = self.endpoint(&["databases", database_id])?;
        self.send(|| self.client.get(url.clone())).await
    }
}
