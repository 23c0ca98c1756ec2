use anyhow::{Context, Result};
use async_trait::async_trait;
use enrichor_core::{LookupClient, LookupError, LookupOutcome, NotFoundReason, normalize_name};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::rate_limit::RateLimiter;

/// Wikipedia lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Wiki root, without the `/w/api.php` or `/api/rest_v1` suffix
    #[serde(default = "LookupConfig::default_base_url")]
    pub base_url: String,

    /// User-Agent header. Wikimedia asks for a contact address in it.
    #[serde(default = "LookupConfig::default_user_agent")]
    pub user_agent: String,

    /// Search candidates to consider per name
    #[serde(default = "LookupConfig::default_search_limit")]
    pub search_limit: usize,

    /// HTTP request timeout (seconds)
    #[serde(default = "LookupConfig::default_timeout")]
    pub timeout: u64,
}

impl LookupConfig {
    fn default_base_url() -> String {
        "https://en.wikipedia.org".to_string()
    }

    fn default_user_agent() -> String {
        concat!(
            "enrichor/",
            env!("CARGO_PKG_VERSION"),
            " (https://github.com/enrichor/enrichor)"
        )
        .to_string()
    }

    const fn default_search_limit() -> usize {
        3
    }

    const fn default_timeout() -> u64 {
        20
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            user_agent: Self::default_user_agent(),
            search_limit: Self::default_search_limit(),
            timeout: Self::default_timeout(),
        }
    }
}

/// How an HTTP status should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Ok,
    Missing,
    Transient,
}

fn classify_status(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        200..=299 => StatusClass::Ok,
        408 | 425 | 429 | 500..=599 => StatusClass::Transient,
        _ => StatusClass::Missing,
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrls>,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

impl PageSummary {
    fn is_disambiguation(&self) -> bool {
        self.kind == "disambiguation"
    }

    fn page_url(&self) -> Option<&str> {
        self.content_urls
            .as_ref()
            .and_then(|urls| urls.desktop.as_ref())
            .map(|desktop| desktop.page.as_str())
    }

    fn source_label(&self) -> String {
        match self.page_url() {
            Some(url) => format!("Wikipedia: {} <{url}>", self.title),
            None => format!("Wikipedia: {}", self.title),
        }
    }
}

fn search_titles(response: SearchResponse) -> Vec<String> {
    response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default()
}

fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A search hit is only worth fetching if it mentions the surname.
fn plausible_title(name: &str, title: &str) -> bool {
    let Some(surname) = name.split_whitespace().next_back().map(fold) else {
        return false;
    };
    !surname.is_empty() && fold(title).contains(&surname)
}

/// Tracks why candidates were rejected so the most informative reason wins.
#[derive(Debug, Default)]
struct Rejections {
    too_short: Option<(usize, usize)>,
    ambiguous: bool,
}

impl Rejections {
    fn judge(&mut self, summary: PageSummary, min_length: usize) -> Option<LookupOutcome> {
        if summary.is_disambiguation() {
            debug!("Skipping disambiguation page {}", summary.title);
            self.ambiguous = true;
            return None;
        }
        let label = summary.source_label();
        match LookupOutcome::found(summary.extract, label).with_quality_gate(min_length) {
            LookupOutcome::NotFound(NotFoundReason::QualityReject { length, min_length }) => {
                debug!("Candidate {} too short ({length} chars)", summary.title);
                self.too_short = Some((length, min_length));
                None
            }
            outcome => Some(outcome),
        }
    }

    fn into_reason(self) -> NotFoundReason {
        match (self.too_short, self.ambiguous) {
            (Some((length, min_length)), _) => NotFoundReason::QualityReject { length, min_length },
            (None, true) => NotFoundReason::Ambiguous,
            (None, false) => NotFoundReason::NoMatch,
        }
    }
}

fn transient(e: &reqwest::Error) -> LookupError {
    LookupError::Transient(e.to_string())
}

/// Looks names up through the Wikipedia search API and page summaries.
pub struct WikipediaClient {
    client: Client,
    base: Url,
    config: LookupConfig,
    min_content_length: usize,
    limiter: RateLimiter,
}

impl WikipediaClient {
    pub fn new(
        config: LookupConfig,
        rate_limit: Duration,
        min_content_length: usize,
    ) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid lookup base_url: {}", config.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("Lookup base_url must be http or https: {}", config.base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "Creating WikipediaClient: base_url={}, rate_limit={:?}",
            base, rate_limit
        );
        Ok(Self {
            client,
            base,
            config,
            min_content_length,
            limiter: RateLimiter::new(rate_limit),
        })
    }

    fn search_url(&self, query: &str) -> Result<Url, LookupError> {
        let limit = self.config.search_limit.max(1).to_string();
        let mut url = self.endpoint(&["w", "api.php"])?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query)
            .append_pair("srlimit", &limit)
            .append_pair("srnamespace", "0")
            .append_pair("format", "json");
        Ok(url)
    }

    fn summary_url(&self, title: &str) -> Result<Url, LookupError> {
        let title = title.replace(' ', "_");
        self.endpoint(&["api", "rest_v1", "page", "summary", &title])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| LookupError::Transient(format!("Cannot extend base URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` under the rate limit. `Ok(None)` means the resource does not exist.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, LookupError> {
        self.limiter.wait().await;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| transient(&e))?;

        let status = response.status();
        match classify_status(status) {
            StatusClass::Ok => response.json::<T>().await.map(Some).map_err(|e| transient(&e)),
            StatusClass::Missing => {
                debug!("Upstream answered {status}, treating as missing");
                Ok(None)
            }
            StatusClass::Transient => Err(LookupError::Transient(format!("HTTP {status}"))),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, LookupError> {
        let url = self.search_url(query)?;
        Ok(self
            .get_json::<SearchResponse>(url)
            .await?
            .map(search_titles)
            .unwrap_or_default())
    }
}

#[async_trait]
impl LookupClient for WikipediaClient {
    async fn lookup(&self, name: &str) -> Result<LookupOutcome, LookupError> {
        let query = normalize_name(name);
        let titles = self.search(&query).await?;
        debug!("Search for {query:?} returned {} titles", titles.len());

        let mut rejections = Rejections::default();
        for title in titles.iter().filter(|t| plausible_title(&query, t)) {
            let url = self.summary_url(title)?;
            let Some(summary) = self.get_json::<PageSummary>(url).await? else {
                continue;
            };
            if let Some(outcome) = rejections.judge(summary, self.min_content_length) {
                return Ok(outcome);
            }
        }

        Ok(LookupOutcome::NotFound(rejections.into_reason()))
    }

    fn source_name(&self) -> &'static str {
        "wikipedia"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> WikipediaClient {
        let config = LookupConfig {
            base_url: base_url.to_string(),
            timeout: 2,
            ..LookupConfig::default()
        };
        WikipediaClient::new(config, Duration::from_millis(1), 20).unwrap()
    }

    fn summary(value: serde_json::Value) -> PageSummary {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lookup_config_default() {
        let config = LookupConfig::default();
        assert_eq!(config.base_url, "https://en.wikipedia.org");
        assert_eq!(config.search_limit, 3);
        assert_eq!(config.timeout, 20);
        assert!(config.user_agent.starts_with("enrichor/"));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::OK), StatusClass::Ok);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusClass::Missing);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), StatusClass::Missing);
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            StatusClass::Transient
        );
        assert_eq!(
            classify_status(StatusCode::REQUEST_TIMEOUT),
            StatusClass::Transient
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            StatusClass::Transient
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = LookupConfig {
            base_url: "not a url".to_string(),
            ..LookupConfig::default()
        };
        assert!(WikipediaClient::new(config.clone(), Duration::from_secs(1), 200).is_err());

        let config = LookupConfig {
            base_url: "ftp://example.org".to_string(),
            ..config
        };
        assert!(WikipediaClient::new(config, Duration::from_secs(1), 200).is_err());
    }

    #[test]
    fn test_urls() {
        let client = client("https://en.wikipedia.org/");

        let search = client.search_url("Ada Lovelace").unwrap();
        assert_eq!(search.path(), "/w/api.php");
        let pairs: Vec<(String, String)> = search.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("srsearch".to_string(), "Ada Lovelace".to_string())));
        assert!(pairs.contains(&("srlimit".to_string(), "3".to_string())));

        let page = client.summary_url("Ada Lovelace").unwrap();
        assert_eq!(page.path(), "/api/rest_v1/page/summary/Ada_Lovelace");

        let slashed = client.summary_url("AC/DC").unwrap();
        assert_eq!(slashed.path(), "/api/rest_v1/page/summary/AC%2FDC");
    }

    #[test]
    fn test_search_titles() {
        let response: SearchResponse = serde_json::from_value(json!({
            "batchcomplete": "",
            "query": {
                "searchinfo": { "totalhits": 2 },
                "search": [
                    { "ns": 0, "title": "Ada Lovelace", "pageid": 974 },
                    { "ns": 0, "title": "Lovelace (film)", "pageid": 1 }
                ]
            }
        }))
        .unwrap();
        assert_eq!(search_titles(response), vec!["Ada Lovelace", "Lovelace (film)"]);

        let empty: SearchResponse = serde_json::from_value(json!({ "batchcomplete": "" })).unwrap();
        assert!(search_titles(empty).is_empty());
    }

    #[test]
    fn test_plausible_title() {
        assert!(plausible_title("Ada Lovelace", "Ada Lovelace"));
        assert!(plausible_title("Ada Lovelace", "Lovelace (film)"));
        assert!(plausible_title("Seán O'Brien", "Seán O'Brien (footballer)"));
        assert!(!plausible_title("Ada Lovelace", "Analytical Engine"));
        assert!(!plausible_title("", "Anything"));
    }

    #[test]
    fn test_judge_accepts_long_extract() {
        let mut rejections = Rejections::default();
        let outcome = rejections.judge(
            summary(json!({
                "type": "standard",
                "title": "Ada Lovelace",
                "extract": "Augusta Ada King, Countess of Lovelace, was an English mathematician.",
                "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Ada_Lovelace" } }
            })),
            20,
        );

        assert_eq!(
            outcome,
            Some(LookupOutcome::found(
                "Augusta Ada King, Countess of Lovelace, was an English mathematician.",
                "Wikipedia: Ada Lovelace <https://en.wikipedia.org/wiki/Ada_Lovelace>",
            ))
        );
    }

    #[test]
    fn test_rejection_priority() {
        let mut rejections = Rejections::default();
        assert!(
            rejections
                .judge(
                    summary(json!({ "type": "disambiguation", "title": "John Smith" })),
                    20
                )
                .is_none()
        );
        assert_eq!(
            Rejections {
                too_short: None,
                ambiguous: true
            }
            .into_reason(),
            NotFoundReason::Ambiguous
        );

        assert!(
            rejections
                .judge(
                    summary(json!({ "type": "standard", "title": "John Smith (poet)", "extract": "A poet." })),
                    20
                )
                .is_none()
        );
        assert_eq!(
            rejections.into_reason(),
            NotFoundReason::QualityReject {
                length: 7,
                min_length: 20
            }
        );

        assert_eq!(Rejections::default().into_reason(), NotFoundReason::NoMatch);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transient() {
        let client = client("http://127.0.0.1:9");
        let err = client.lookup("Ada Lovelace").await.unwrap_err();
        assert!(matches!(err, LookupError::Transient(_)));
    }
}
