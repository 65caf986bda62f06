//! Run orchestration: load inputs, start writers, fan out workers, and
//! tear everything down behind a completion barrier.
//!
//! Lifecycle: `Init → InputsLoaded → WritersStarted → WorkersLaunched →
//! AwaitingWorkers → ChannelsClosing → AwaitingWriters → Done`.
//! No channel is closed before every worker has been joined, and the run
//! does not return before every writer has reported.

use crate::breach::api::{ApiEndpoints, BreachTransport, HttpTransport};
use crate::breach::worker::WorkerContext;
use crate::error::{SetupError, SinkError};
use crate::pipeline::input::InputItems;
use crate::pipeline::outcome::OutcomeKind;
use crate::pipeline::router::{ResultRouter, RoutingTable};
use crate::pipeline::writer::{FileSinkFactory, ResultWriter, SinkFactory, WriterReport};
use crate::proxy::client::{ClientConfig, ProxyClientFactory};
use crate::proxy::pool::ProxyPool;
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of requests in flight
const DEFAULT_CONCURRENCY: usize = 100;

/// Default proxy list file name
const DEFAULT_PROXIES_FILE: &str = "proxies.txt";

/// Where a run reads from and writes to, and how hard it pushes
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Relative paths are resolved against `input_dir`
    pub proxies_file: PathBuf,
    pub concurrency: usize,
    pub client: ClientConfig,
    pub endpoints: ApiEndpoints,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            proxies_file: PathBuf::from(DEFAULT_PROXIES_FILE),
            concurrency: DEFAULT_CONCURRENCY,
            client: ClientConfig::default(),
            endpoints: ApiEndpoints::default(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_dir(mut self, dir: PathBuf) -> Self {
        self.input_dir = dir;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_proxies_file(mut self, path: PathBuf) -> Self {
        self.proxies_file = path;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn proxies_path(&self) -> PathBuf {
        if self.proxies_file.is_absolute() {
            self.proxies_file.clone()
        } else {
            self.input_dir.join(&self.proxies_file)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    InputsLoaded,
    WritersStarted,
    WorkersLaunched,
    AwaitingWorkers,
    ChannelsClosing,
    AwaitingWriters,
    Done,
}

/// Tally of worker outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub clean: usize,
    pub compromised: usize,
    pub breached: usize,
    pub failed: usize,
    /// Workers that panicked instead of producing a result
    pub lost: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: OutcomeKind) {
        match outcome {
            OutcomeKind::Clean => self.clean += 1,
            OutcomeKind::Compromised => self.compromised += 1,
            OutcomeKind::Breached => self.breached += 1,
            OutcomeKind::Failure => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.clean + self.compromised + self.breached + self.failed + self.lost
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub workers: usize,
    pub outcomes: OutcomeCounts,
    pub writers: Vec<WriterReport>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Every writer flushed its sink
    pub fn is_success(&self) -> bool {
        self.writers.iter().all(WriterReport::is_success)
    }

    pub fn failed_writers(&self) -> impl Iterator<Item = &WriterReport> {
        self.writers.iter().filter(|w| !w.is_success())
    }
}

/// Drives one run from input files to output files
pub struct Orchestrator {
    config: RunConfig,
    transport: Arc<dyn BreachTransport>,
    sinks: Arc<dyn SinkFactory>,
    state: RunState,
}

impl Orchestrator {
    /// Real HTTP transport and file sinks in `config.output_dir`
    pub fn new(config: RunConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(ProxyClientFactory::new(
            config.client.clone(),
        )));
        let sinks = Arc::new(FileSinkFactory::new(config.output_dir.clone()));

        Self {
            config,
            transport,
            sinks,
            state: RunState::Init,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn BreachTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sinks(mut self, sinks: Arc<dyn SinkFactory>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Load inputs and execute the run
    pub async fn run(&mut self) -> Result<RunReport, SetupError> {
        let (pool, items) = self.load()?;
        Ok(self.execute(pool, items).await)
    }

    /// Load the proxy pool and scan the input directory
    pub fn load(&mut self) -> Result<(ProxyPool, InputItems), SetupError> {
        let pool = ProxyPool::load(self.config.proxies_path())?;
        let items = InputItems::load_dir(&self.config.input_dir)?;
        self.transition(RunState::InputsLoaded);
        Ok((pool, items))
    }

    /// Fan out one worker per check and wait for every writer
    pub async fn execute(&mut self, pool: ProxyPool, items: InputItems) -> RunReport {
        let start = Instant::now();
        let table = RoutingTable::for_categories(&items.active_categories());
        let capacity = items.total_checks();
        let (router, receivers) = ResultRouter::new(table, capacity);

        // Writers first so channels are always being drained
        let writers: Vec<_> = receivers
            .into_iter()
            .map(|(sink, rx)| (sink, ResultWriter::new(sink, self.sinks.clone()).spawn(rx)))
            .collect();
        self.transition(RunState::WritersStarted);

        let context = Arc::new(WorkerContext::new(
            pool,
            self.transport.clone(),
            self.config.endpoints.clone(),
        ));
        let router = Arc::new(router);
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut workers = JoinSet::new();

        info!(
            workers = capacity,
            concurrency = self.config.concurrency.max(1),
            "launching workers"
        );

        for category in items.active_categories() {
            for item in items.get(category) {
                for &kind in category.checks() {
                    // Holding the permit for the task's lifetime bounds in-flight requests
                    let permit = semaphore.clone().acquire_owned().await.ok();
                    let context = context.clone();
                    let router = router.clone();
                    let item = item.clone();

                    workers.spawn(async move {
                        let _permit = permit;
                        let result = context.check(kind, &item).await;
                        router.route(category, &result).await;
                        result.outcome()
                    });
                }
            }
        }
        self.transition(RunState::WorkersLaunched);

        self.transition(RunState::AwaitingWorkers);
        let mut outcomes = OutcomeCounts::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => outcomes.record(outcome),
                Err(e) => {
                    warn!(error = %e, "worker task did not complete");
                    outcomes.lost += 1;
                }
            }
        }

        self.transition(RunState::ChannelsClosing);
        drop(context);
        match Arc::try_unwrap(router) {
            Ok(router) => router.close(),
            // Unreachable once every worker is joined; dropping still closes
            Err(router) => drop(router),
        }

        self.transition(RunState::AwaitingWriters);
        let (sinks, handles): (Vec<_>, Vec<_>) = writers.into_iter().unzip();
        let writer_reports: Vec<WriterReport> = join_all(handles)
            .await
            .into_iter()
            .zip(sinks)
            .map(|(joined, sink)| match joined {
                Ok(report) => report,
                Err(e) => WriterReport {
                    sink,
                    lines_written: 0,
                    error: Some(
                        SinkError::Aborted {
                            name: sink.to_string(),
                            reason: e.to_string(),
                        }
                        .to_string(),
                    ),
                },
            })
            .collect();

        self.transition(RunState::Done);
        RunReport {
            workers: capacity,
            outcomes,
            writers: writer_reports,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}
