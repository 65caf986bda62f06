//! Proxy module for parsing, selecting and tunnelling through proxies
//!
//! This module provides functionality for:
//! - Parsing authenticated proxies from HOST:PORT:USER:PASS lists
//! - Picking a proxy uniformly at random per request
//! - Building HTTP clients that tunnel through a chosen proxy

pub mod client;
pub mod models;
pub mod parser;
pub mod pool;

pub use client::{ClientConfig, ProxyClientFactory};
pub use models::{ProxyAuth, ProxyDescriptor};
pub use parser::{ParsedProxies, ProxyParser};
pub use pool::ProxyPool;
