//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use breach_sweep::breach::{BreachTransport, HttpReply, LookupKey};
use breach_sweep::error::{FetchError, SinkError};
use breach_sweep::pipeline::{ResultSink, SinkFactory, SinkId};
use breach_sweep::proxy::ProxyDescriptor;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RANGE_BASE: &str = "https://pwned.test/range/";
pub const EMAIL_BASE: &str = "https://pwned.test/search/";

/// Deterministic breach API: knows a set of pwned passwords and emails,
/// fails on demand, and tracks how many requests are in flight.
#[derive(Default)]
pub struct FakeBreachApi {
    pwned_passwords: Vec<String>,
    breached_emails: HashSet<String>,
    /// Items answered with this status on whichever endpoint they hit
    status_overrides: HashMap<String, u16>,
    /// Items answered with a transport error on either endpoint
    unreachable: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requests: AtomicUsize,
}

impl FakeBreachApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pwned_password(mut self, password: &str) -> Self {
        self.pwned_passwords.push(password.to_string());
        self
    }

    pub fn with_breached_email(mut self, email: &str) -> Self {
        self.breached_emails.insert(email.to_string());
        self
    }

    pub fn with_status(mut self, item: &str, status: u16) -> Self {
        self.status_overrides.insert(item.to_string(), status);
        self
    }

    pub fn with_unreachable(mut self, item: &str) -> Self {
        self.unreachable.insert(item.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn answer(&self, url: &str) -> Result<HttpReply, FetchError> {
        if let Some(prefix) = url.strip_prefix(RANGE_BASE) {
            let has_prefix = |password: &String| LookupKey::derive(password).prefix == prefix;

            if self.unreachable.iter().any(has_prefix) {
                return Err(FetchError::Transport("proxy refused".to_string()));
            }
            if let Some((_, &status)) = self.status_overrides.iter().find(|(p, _)| has_prefix(*p)) {
                return Ok(HttpReply { status, body: None });
            }

            let mut body = String::from("00000000000000000000000000000000000:1\r\n");
            for password in self.pwned_passwords.iter().filter(|p| has_prefix(*p)) {
                body.push_str(&format!("{}:42\r\n", LookupKey::derive(password).suffix));
            }
            return Ok(HttpReply {
                status: 200,
                body: Some(body),
            });
        }

        if let Some(escaped) = url.strip_prefix(EMAIL_BASE) {
            let email = urlencoding::decode(escaped)
                .map(|e| e.into_owned())
                .unwrap_or_default();
            if self.unreachable.contains(&email) {
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            let status = self
                .status_overrides
                .get(&email)
                .copied()
                .unwrap_or(if self.breached_emails.contains(&email) { 200 } else { 404 });
            return Ok(HttpReply { status, body: None });
        }

        Ok(HttpReply {
            status: 404,
            body: None,
        })
    }
}

#[async_trait]
impl BreachTransport for FakeBreachApi {
    async fn get(
        &self,
        _proxy: &ProxyDescriptor,
        url: &str,
        _read_body: bool,
    ) -> Result<HttpReply, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.answer(url);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Lines collected per sink, in receipt order
pub type Collected = Arc<Mutex<HashMap<SinkId, Vec<String>>>>;

/// In-memory sinks; one sink can be slowed down on close
#[derive(Default)]
pub struct MemorySinks {
    pub lines: Collected,
    pub finished: Arc<Mutex<HashSet<SinkId>>>,
    slow: Option<(SinkId, Duration)>,
    failing: Option<SinkId>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_sink(mut self, sink: SinkId, delay: Duration) -> Self {
        self.slow = Some((sink, delay));
        self
    }

    pub fn with_failing_sink(mut self, sink: SinkId) -> Self {
        self.failing = Some(sink);
        self
    }

    pub fn lines(&self, sink: SinkId) -> Vec<String> {
        let mut lines = self
            .lines
            .lock()
            .unwrap()
            .get(&sink)
            .cloned()
            .unwrap_or_default();
        lines.sort();
        lines
    }

    pub fn is_finished(&self, sink: SinkId) -> bool {
        self.finished.lock().unwrap().contains(&sink)
    }
}

#[async_trait]
impl SinkFactory for MemorySinks {
    async fn open(&self, sink: SinkId) -> Result<Box<dyn ResultSink>, SinkError> {
        if self.failing == Some(sink) {
            return Err(SinkError::Open {
                path: sink.file_name().into(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.lines.lock().unwrap().entry(sink).or_default();

        let delay = match self.slow {
            Some((slow, delay)) if slow == sink => delay,
            _ => Duration::ZERO,
        };
        Ok(Box::new(MemorySink {
            sink,
            delay,
            lines: self.lines.clone(),
            finished: self.finished.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemorySink {
    sink: SinkId,
    delay: Duration,
    lines: Collected,
    finished: Arc<Mutex<HashSet<SinkId>>>,
    closed: AtomicBool,
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        assert!(!self.closed.load(Ordering::SeqCst), "write after finish");
        self.lines
            .lock()
            .unwrap()
            .entry(self.sink)
            .or_default()
            .push(line.to_string());
        Ok(())
    }

    async fn finish(&mut self) -> io::Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.closed.store(true, Ordering::SeqCst);
        self.finished.lock().unwrap().insert(self.sink);
        Ok(())
    }
}

pub fn test_proxy() -> ProxyDescriptor {
    ProxyDescriptor::new(
        "127.0.0.1".to_string(),
        3128,
        "user".to_string(),
        "pass".to_string(),
    )
}

pub fn write_lines(path: &std::path::Path, lines: &[&str]) {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).unwrap();
}
