//! Evidence retrieval for claim verification.
//!
//! `SearchProvider` is the interface boundary to the web-search service;
//! `DuckDuckGoSearch` is the shipped implementation (instant answers API,
//! no key required). `SourceRetriever` sits on top and enforces the
//! pipeline contract: retrieval never fails, it just returns fewer (or
//! zero) sources, which later surfaces as an unverifiable claim rather
//! than a crashed report.

use crate::error::SearchError;
use crate::types::Source;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Trait for evidence-retrieval providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for candidate sources matching `query`.
    async fn search(&self, query: &str, num_results: usize)
    -> Result<Vec<Source>, SearchError>;
}

/// Search the web using the DuckDuckGo instant answers API.
///
/// Returns structured results with titles, snippets, and URLs. Privacy
/// friendly: queries go directly to DuckDuckGo, no API key involved.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout_secs: u64) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Verifact/0.3")
            .build()
            .map_err(|e| SearchError::Request {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Map the instant-answer payload to `Source` entries: the abstract
    /// first, then related topics. Missing fields are tolerated.
    fn parse_results(body: &serde_json::Value, num_results: usize) -> Vec<Source> {
        let mut sources = Vec::new();

        if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() {
                sources.push(Source {
                    title: body
                        .get("AbstractSource")
                        .and_then(|v| v.as_str())
                        .unwrap_or("DuckDuckGo Abstract")
                        .to_string(),
                    url: body
                        .get("AbstractURL")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    snippet: abstract_text.to_string(),
                });
            }
        }

        if let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
            for topic in topics {
                if sources.len() >= num_results {
                    break;
                }
                if let Some(text) = topic.get("Text").and_then(|v| v.as_str()) {
                    if text.is_empty() {
                        continue;
                    }
                    let url = topic
                        .get("FirstURL")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string();
                    // Topic text reads "Title - description"; use the lead
                    // fragment as the title.
                    let title = text.split(" - ").next().unwrap_or(text).to_string();
                    sources.push(Source {
                        title,
                        url,
                        snippet: text.to_string(),
                    });
                }
            }
        }

        sources.truncate(num_results);
        sources
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<Source>, SearchError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::Request {
                message: format!("Search request failed: {e}"),
            })?;

        let body: serde_json::Value = response.json().await.map_err(|e| SearchError::Parse {
            message: format!("Failed to parse search response: {e}"),
        })?;

        Ok(Self::parse_results(&body, num_results))
    }
}

/// A scripted search provider for tests.
pub struct MockSearch {
    results: std::sync::Mutex<std::collections::VecDeque<Result<Vec<Source>, SearchError>>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: std::sync::Mutex::new(std::collections::VecDeque::new()),
        }
    }

    /// Queue a result set for the next `search` call. When the queue runs
    /// dry, calls return an empty list.
    pub fn queue(&self, result: Result<Vec<Source>, SearchError>) {
        self.results.lock().unwrap().push_back(result);
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(
        &self,
        _query: &str,
        _num_results: usize,
    ) -> Result<Vec<Source>, SearchError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Retrieves evidence sources for a claim, absorbing provider failures.
pub struct SourceRetriever {
    provider: Arc<dyn SearchProvider>,
}

impl SourceRetriever {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Retrieve up to `limit` sources for `query`.
    ///
    /// On provider failure this returns an empty list; verifying a claim
    /// with zero sources is a handled case downstream.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<Source> {
        match self.provider.search(query, limit).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(query = %query, error = %e, "Evidence retrieval failed; proceeding with zero sources");
                Vec::new()
            }
        }
    }
}
