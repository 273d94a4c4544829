//! HTTP client utilities and the page-fetching capability.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::SourceError;

/// A request for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Raw response of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the content type is HTML or another text markup
    pub fn is_markup(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("xhtml") || ct.contains("text/xml")
            })
            .unwrap_or(false)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, SourceError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Capability to fetch a URL and return its raw content.
///
/// Discovery and acquisition receive a fetcher explicitly so tests can
/// substitute a scripted one.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError>;

    /// Fetch a URL with no extra headers
    async fn get(&self, url: &str) -> Result<FetchResponse, SourceError> {
        self.fetch(&FetchRequest::new(url)).await
    }
}

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Round-robin pool of browser user-agent strings
#[derive(Debug)]
pub struct UserAgentPool {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl UserAgentPool {
    pub fn new(agents: Vec<String>) -> Self {
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }

    /// Next user agent in rotation
    pub fn next_agent(&self) -> &str {
        if self.agents.is_empty() {
            return concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[index]
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string(),
        ])
    }
}

/// Shared HTTP client with sensible defaults and a rotating user agent
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    user_agents: Arc<UserAgentPool>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            user_agents: Arc::new(UserAgentPool::default()),
        })
    }

    /// Replace the user-agent pool
    pub fn user_agents(mut self, pool: UserAgentPool) -> Self {
        self.user_agents = Arc::new(pool);
        self
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, self.user_agents.next_agent());

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::InvalidRequest(format!("bad header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SourceError::InvalidRequest(format!("bad header value: {}", e)))?;
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read body of {}: {}", request.url, e)))?
            .to_vec();

        tracing::debug!(url = %request.url, status, bytes = body.len(), "fetched page");

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let pool = UserAgentPool::new(vec!["a".into(), "b".into()]);
        assert_eq!(pool.next_agent(), "a");
        assert_eq!(pool.next_agent(), "b");
        assert_eq!(pool.next_agent(), "a");
    }

    #[test]
    fn test_empty_pool_falls_back_to_crate_agent() {
        let pool = UserAgentPool::new(Vec::new());
        assert!(pool.next_agent().starts_with("journal-harvester/"));
    }

    #[test]
    fn test_markup_detection() {
        let html = FetchResponse {
            status: 200,
            content_type: Some("text/html; charset=UTF-8".into()),
            body: Vec::new(),
        };
        let pdf = FetchResponse {
            status: 200,
            content_type: Some("application/pdf".into()),
            body: Vec::new(),
        };
        assert!(html.is_markup());
        assert!(!pdf.is_markup());
        assert!(html.is_success());
    }
}
