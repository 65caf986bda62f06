//! Breach API endpoints and the transport used to reach them

use crate::error::FetchError;
use crate::proxy::client::ProxyClientFactory;
use crate::proxy::models::ProxyDescriptor;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::error::Error as StdError;

/// Default password range endpoint; the 5-char hash prefix is appended
pub const DEFAULT_PASSWORD_RANGE_URL: &str = "https://api.pwnedpasswords.com/range/";

/// Default email search endpoint; the escaped address is appended
pub const DEFAULT_EMAIL_SEARCH_URL: &str = "https://haveibeenpwned.com/api/v2/unifiedsearch/";

/// Base URLs of the two breach endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub password_range: String,
    pub email_search: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            password_range: DEFAULT_PASSWORD_RANGE_URL.to_string(),
            email_search: DEFAULT_EMAIL_SEARCH_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password_range(mut self, url: String) -> Self {
        self.password_range = url;
        self
    }

    pub fn with_email_search(mut self, url: String) -> Self {
        self.email_search = url;
        self
    }

    pub fn range_url(&self, prefix: &str) -> String {
        format!("{}{}", self.password_range, prefix)
    }

    pub fn email_url(&self, email: &str) -> String {
        format!("{}{}", self.email_search, urlencoding::encode(email))
    }
}

/// Scan a range response (`SUFFIX:COUNT` per line) for an exact suffix.
/// Stops at the first match.
pub fn range_contains(body: &str, suffix: &str) -> bool {
    body.lines().any(|line| {
        let mut parts = line.trim().split(':');
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(candidate), Some(_), None) if candidate == suffix
        )
    })
}

/// Status line and, when requested and the status is 200, the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Option<String>,
}

impl HttpReply {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// Issues a single GET through a given proxy
#[async_trait]
pub trait BreachTransport: Send + Sync {
    async fn get(
        &self,
        proxy: &ProxyDescriptor,
        url: &str,
        read_body: bool,
    ) -> Result<HttpReply, FetchError>;
}

/// reqwest-backed transport; builds a fresh client per request
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    factory: ProxyClientFactory,
}

impl HttpTransport {
    pub fn new(factory: ProxyClientFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl BreachTransport for HttpTransport {
    async fn get(
        &self,
        proxy: &ProxyDescriptor,
        url: &str,
        read_body: bool,
    ) -> Result<HttpReply, FetchError> {
        let client = self.factory.build(proxy)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(error_chain(&e)))?;

        let status = response.status();
        if !read_body || status != StatusCode::OK {
            return Ok(HttpReply {
                status: status.as_u16(),
                body: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Read(error_chain(&e)))?;

        Ok(HttpReply {
            status: status.as_u16(),
            body: Some(body),
        })
    }
}

/// reqwest hides the useful part (refused, timed out, 407...) in the sources.
/// Causes whose text is already part of the message are not repeated.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
