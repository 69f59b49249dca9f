//! HTTP client for the package registry

use crate::error::{RegistryError, RegistryResult};
use crate::retry::BackoffPolicy;
use chrono::{DateTime, Utc};
use packwatch_types::ServerRecord;
use semver::Version;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Server-side cap on the `limit` query parameter
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Registry client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Registry base URL (e.g. `https://registry.example.io`)
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Page size for listing requests, capped at [`MAX_PAGE_LIMIT`]
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Retry policy for 5xx and transport failures
    #[serde(default)]
    pub retry: BackoffPolicy,
}

impl RegistryConfig {
    /// Configuration pointing at the given base URL, defaults elsewhere
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: default_request_timeout(),
            page_limit: default_page_limit(),
            retry: BackoffPolicy::default(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    MAX_PAGE_LIMIT
}

/// Query parameters for a listing request
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Opaque pagination cursor from a previous page
    pub cursor: Option<String>,

    /// Page size override
    pub limit: Option<u32>,

    /// Only records modified after this instant (RFC3339 on the wire)
    pub updated_since: Option<DateTime<Utc>>,

    /// Server-side substring search over names
    pub search: Option<String>,

    /// Server-side version filter
    pub version: Option<String>,
}

/// One page of listing results
#[derive(Debug, Deserialize)]
pub struct ServerPage {
    #[serde(default)]
    pub servers: Vec<ServerRecord>,

    #[serde(default)]
    pub metadata: PageMetadata,
}

/// Pagination metadata attached to a listing page
#[derive(Debug, Default, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// HTTP client for the package registry
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    page_limit: u32,
    retry: BackoffPolicy,
}

impl RegistryClient {
    /// Create a new client from configuration
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit.min(MAX_PAGE_LIMIT),
            retry: config.retry,
        })
    }

    /// Fetch one page of server listings
    pub async fn list_servers(
        &self,
        cancel: &CancellationToken,
        query: &ListQuery,
    ) -> RegistryResult<ServerPage> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(cursor) = &query.cursor {
            params.push(("cursor", cursor.clone()));
        }
        let limit = query.limit.unwrap_or(self.page_limit).min(MAX_PAGE_LIMIT);
        params.push(("limit", limit.to_string()));
        if let Some(updated_since) = &query.updated_since {
            params.push(("updated_since", updated_since.to_rfc3339()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(version) = &query.version {
            params.push(("version", version.clone()));
        }

        let url = format!("{}/v0/servers", self.base_url);
        let response = self.get_with_retry(cancel, &url, &params).await?;
        Ok(response.json().await?)
    }

    /// Fetch every page of server listings matching the query
    pub async fn list_all_servers(
        &self,
        cancel: &CancellationToken,
        query: &ListQuery,
    ) -> RegistryResult<Vec<ServerRecord>> {
        let mut servers = Vec::new();
        let mut cursor = query.cursor.clone();

        loop {
            let page = self
                .list_servers(
                    cancel,
                    &ListQuery {
                        cursor: cursor.clone(),
                        ..query.clone()
                    },
                )
                .await?;
            servers.extend(page.servers);

            match page.metadata.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(servers)
    }

    /// Fetch a single server record by registry ID
    ///
    /// A 404 maps to [`RegistryError::NotFound`] so callers can tell absence
    /// apart from request failures.
    pub async fn get_server(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> RegistryResult<ServerRecord> {
        let url = format!("{}/v0/servers/{}", self.base_url, id);
        match self.get_with_retry(cancel, &url, &[]).await {
            Ok(response) => Ok(response.json().await?),
            Err(RegistryError::Client { status: 404, .. }) => Err(RegistryError::NotFound {
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Resolve the latest active version of a named server
    ///
    /// Pages through listings filtered server-side by `search`, keeps only
    /// records whose parsed name matches exactly and whose status is
    /// `active`, and picks the greatest parseable semantic version.
    /// Unparseable versions are skipped; a deprecated record never wins, no
    /// matter how its raw version string compares.
    pub async fn latest_active(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> RegistryResult<ServerRecord> {
        let query = ListQuery {
            search: Some(name.to_string()),
            ..Default::default()
        };
        let candidates = self.list_all_servers(cancel, &query).await?;

        let mut best: Option<(Version, ServerRecord)> = None;
        for record in candidates {
            if record.name != name || !record.status.is_active() {
                continue;
            }
            let version = match Version::parse(&record.version) {
                Ok(version) => version,
                Err(_) => {
                    tracing::debug!(
                        server = %record.name,
                        version = %record.version,
                        "Skipping unparseable version"
                    );
                    continue;
                }
            };
            if best.as_ref().map_or(true, |(v, _)| version > *v) {
                best = Some((version, record));
            }
        }

        best.map(|(_, record)| record)
            .ok_or_else(|| RegistryError::NoActiveVersion {
                name: name.to_string(),
            })
    }

    /// GET with linear retry on 5xx/transport failures
    ///
    /// 4xx responses surface immediately with the response body. Backoff
    /// sleeps race against the cancellation token, so cancellation aborts
    /// mid-backoff without waiting the delay out.
    async fn get_with_retry(
        &self,
        cancel: &CancellationToken,
        url: &str,
        params: &[(&str, String)],
    ) -> RegistryResult<reqwest::Response> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }

            let failure = match self.http.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let body = response.text().await.unwrap_or_default();
                    if status.is_client_error() {
                        return Err(RegistryError::Client {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    RegistryError::Server {
                        status: status.as_u16(),
                        body,
                    }
                }
                Err(e) => RegistryError::Transport(e),
            };

            if attempt >= max_attempts {
                return Err(RegistryError::Exhausted {
                    attempts: attempt,
                    source: Box::new(failure),
                });
            }

            let delay = self.retry.delay_after(attempt);
            tracing::warn!(
                url,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Registry request failed, backing off"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(RegistryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
