//! Error types shared across the pipeline

use std::path::PathBuf;
use thiserror::Error;

/// A proxy line that could not be turned into a usable descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyParseError {
    #[error("expected host:port:username:password, got {fields} field(s)")]
    TooFewFields { fields: usize },

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("empty host")]
    EmptyHost,

    #[error("missing proxy credentials")]
    MissingCredentials,
}

/// Fatal errors that abort a run before any worker is launched
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to read proxy list {path:?}: {source}")]
    ProxyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable proxies in {path:?} ({skipped} malformed line(s) skipped)")]
    NoProxies { path: PathBuf, skipped: usize },

    #[error("failed to read input file {path:?}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no input file found (emails.txt, passwords.txt, both.txt) in {dir:?}")]
    NoInputs { dir: PathBuf },
}

/// Failure of a single proxied request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The client could not be built for the selected proxy
    #[error("client setup failed: {0}")]
    Setup(String),

    /// DNS, connect, TLS handshake, proxy authentication or timeout
    #[error("{0}")]
    Transport(String),

    /// The status line arrived but the body could not be read
    #[error("{0}")]
    Read(String),
}

/// Failure of an output destination
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("writer task for {name} aborted: {reason}")]
    Aborted { name: String, reason: String },
}
