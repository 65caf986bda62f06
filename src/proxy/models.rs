//! Proxy data models

use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

/// Proxy authentication credentials
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Value of the `Proxy-Authorization` header sent with `CONNECT`
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {}", token)
    }
}

impl fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated HTTP proxy. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    pub host: String,
    pub port: u16,
    pub auth: ProxyAuth,
}

impl ProxyDescriptor {
    pub fn new(host: String, port: u16, username: String, password: String) -> Self {
        Self {
            host,
            port,
            auth: ProxyAuth::new(username, password),
        }
    }

    /// Proxy URL without credentials; auth travels in a header instead
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the proxy string in HOST:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_simple_string())
    }
}
