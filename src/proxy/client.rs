//! One-shot HTTP clients tunnelled through an authenticated proxy

use crate::error::FetchError;
use crate::proxy::models::ProxyDescriptor;
use reqwest::header::HeaderValue;
use reqwest::{tls, Client, Proxy as ReqwestProxy};
use std::time::Duration;

/// Default dial timeout and TCP keepalive in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;

/// Default overall request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for proxied clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Dial timeout, also used as the TCP keepalive and idle bound
    pub connect_timeout: Duration,
    /// Timeout for the whole request, body included
    pub timeout: Duration,
    /// Verify certificates of the proxy and the upstream target
    pub verify_tls: bool,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builds a fresh client per request, each bound to a single proxy
#[derive(Debug, Clone, Default)]
pub struct ProxyClientFactory {
    config: ClientConfig,
}

impl ProxyClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Build a client whose every request goes through `proxy`.
    ///
    /// Credentials are sent as a `Proxy-Authorization: Basic` header on the
    /// `CONNECT` (or on the forwarded request for plain-HTTP targets). Unless
    /// `verify_tls` is set, certificate checks are disabled so intercepting
    /// proxies work; TLS 1.2 is the minimum either way.
    pub fn build(&self, proxy: &ProxyDescriptor) -> Result<Client, FetchError> {
        let auth = HeaderValue::from_str(&proxy.auth.header_value())
            .map_err(|e| FetchError::Setup(format!("proxy {}: {}", proxy, e)))?;

        let reqwest_proxy = ReqwestProxy::all(proxy.url())
            .map_err(|e| FetchError::Setup(format!("proxy {}: {}", proxy, e)))?
            .custom_http_auth(auth);

        Client::builder()
            .proxy(reqwest_proxy)
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .min_tls_version(tls::Version::TLS_1_2)
            .connect_timeout(self.config.connect_timeout)
            .tcp_keepalive(self.config.connect_timeout)
            .pool_idle_timeout(self.config.connect_timeout)
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| FetchError::Setup(format!("proxy {}: {}", proxy, e)))
    }
}
