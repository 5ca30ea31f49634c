//! Wikipedia entity resolver
//!
//! Resolves a candidate name by exact page title through the MediaWiki query
//! API. Redirects are followed, so aliases such as "NYC" land on their
//! canonical page. Search suggestions are never used.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use relkg_core::{Entity, EntityResolver, RelkgError, Resolution, ResolverConfig, Result};
use reqwest::Client;
use serde::Deserialize;

/// Page property marking disambiguation pages
const DISAMBIGUATION_PROP: &str = "disambiguation";

/// Resolver backed by the MediaWiki API
pub struct WikipediaResolver {
    client: Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: HashMap<String, serde_json::Value>,
}

impl Page {
    fn into_resolution(self) -> Resolution {
        if self.missing || self.invalid || self.pageprops.contains_key(DISAMBIGUATION_PROP) {
            return Resolution::Absent;
        }
        if self.title.is_empty() {
            return Resolution::Absent;
        }
        let summary = self.extract.unwrap_or_default();
        Resolution::Resolved(Entity::new(
            self.title,
            self.fullurl.unwrap_or_default(),
            summary.trim(),
        ))
    }
}

impl WikipediaResolver {
    /// Create a resolver for the API at `api_url`
    pub fn new(
        api_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| RelkgError::Resolver(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Create from config
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn lookup(&self, title: &str) -> Result<Resolution> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("prop", "info|extracts|pageprops"),
                ("inprop", "url"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .send()
            .await
            .map_err(|e| RelkgError::Resolver(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelkgError::Resolver(format!("Wikipedia returned {status}")));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| RelkgError::Resolver(format!("Failed to parse response: {e}")))?;

        Ok(resolution_from(body))
    }
}

fn resolution_from(body: QueryResponse) -> Resolution {
    body.query
        .and_then(|q| q.pages.into_iter().next())
        .map(Page::into_resolution)
        .unwrap_or(Resolution::Absent)
}

#[async_trait]
impl EntityResolver for WikipediaResolver {
    async fn resolve(&self, candidate: &str) -> Resolution {
        let title = candidate.trim();
        if title.is_empty() {
            return Resolution::Absent;
        }

        match self.lookup(title).await {
            Ok(resolution) => {
                tracing::debug!(
                    candidate = title,
                    resolved = resolution.entity().map(|e| e.title.as_str()),
                    "Wikipedia lookup"
                );
                resolution
            }
            Err(e) => {
                tracing::warn!(candidate = title, error = %e, "Wikipedia lookup failed");
                Resolution::Absent
            }
        }
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}
