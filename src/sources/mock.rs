//! Mock fetcher for testing purposes.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::sources::SourceError;
use crate::utils::{FetchRequest, FetchResponse, PageFetcher};

/// What the mock does when a route matches
#[derive(Debug, Clone)]
enum MockReply {
    Response(FetchResponse),
    Error(String),
    Panic(String),
}

#[derive(Debug)]
struct Route {
    pattern: String,
    reply: MockReply,
}

/// A fetcher for testing that answers from predefined routes.
///
/// A route matches when its pattern is a substring of the requested URL; the
/// first matching route wins. Unmatched URLs get a 404 unless a fallback
/// reply is set. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Mutex<Vec<Route>>,
    fallback: Mutex<Option<MockReply>>,
    requests: Mutex<Vec<FetchRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockFetcher {
    /// Create a new mock fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_route(&self, pattern: &str, reply: MockReply) {
        lock(&self.routes).push(Route {
            pattern: pattern.to_string(),
            reply,
        });
    }

    /// Answer URLs containing `pattern` with a response.
    pub fn respond(&self, pattern: &str, response: FetchResponse) {
        self.add_route(pattern, MockReply::Response(response));
    }

    /// Fail URLs containing `pattern` with a network error.
    pub fn fail(&self, pattern: &str, message: &str) {
        self.add_route(pattern, MockReply::Error(message.to_string()));
    }

    /// Panic while fetching URLs containing `pattern`.
    pub fn panic_on(&self, pattern: &str) {
        self.add_route(pattern, MockReply::Panic(pattern.to_string()));
    }

    /// Fail every unmatched URL with a network error.
    pub fn fail_always(&self) {
        *lock(&self.fallback) = Some(MockReply::Error("connection refused".to_string()));
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// URLs fetched so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.url.clone()).collect()
    }

    /// Build an HTML response.
    pub fn html(body: impl Into<String>) -> FetchResponse {
        Self::response(200, "text/html; charset=UTF-8", body.into().into_bytes())
    }

    /// Build a JSON response.
    pub fn json(body: impl Into<String>) -> FetchResponse {
        Self::response(200, "application/json", body.into().into_bytes())
    }

    /// Build a PDF response.
    pub fn pdf(body: Vec<u8>) -> FetchResponse {
        Self::response(200, "application/pdf", body)
    }

    /// Build an empty response with a status code.
    pub fn status(status: u16) -> FetchResponse {
        Self::response(status, "text/html", Vec::new())
    }

    fn response(status: u16, content_type: &str, body: Vec<u8>) -> FetchResponse {
        FetchResponse {
            status,
            content_type: Some(content_type.to_string()),
            body,
        }
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError> {
        lock(&self.requests).push(request.clone());

        let reply = {
            let routes = lock(&self.routes);
            routes
                .iter()
                .find(|route| request.url.contains(&route.pattern))
                .map(|route| route.reply.clone())
        }
        .or_else(|| lock(&self.fallback).clone());

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(message)) => Err(SourceError::Network(message)),
            Some(MockReply::Panic(pattern)) => panic!("mock fetcher panicked on '{}'", pattern),
            None => Ok(Self::status(404)),
        }
    }
}
