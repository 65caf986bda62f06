//! Writers draining result channels into durable sinks

use crate::error::SinkError;
use crate::pipeline::router::SinkId;
use async_trait::async_trait;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Line-oriented output destination
#[async_trait]
pub trait ResultSink: Send {
    async fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush everything written so far
    async fn finish(&mut self) -> io::Result<()>;
}

/// Opens the sink behind a [`SinkId`]
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn open(&self, sink: SinkId) -> Result<Box<dyn ResultSink>, SinkError>;
}

/// Creates (truncating) one text file per sink inside a directory
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    dir: PathBuf,
}

impl FileSinkFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, sink: SinkId) -> PathBuf {
        self.dir.join(sink.file_name())
    }
}

#[async_trait]
impl SinkFactory for FileSinkFactory {
    async fn open(&self, sink: SinkId) -> Result<Box<dyn ResultSink>, SinkError> {
        let path = self.path_for(sink);
        let file = File::create(&path)
            .await
            .map_err(|source| SinkError::Open { path, source })?;
        Ok(Box::new(FileSink {
            writer: BufWriter::new(file),
        }))
    }
}

struct FileSink {
    writer: BufWriter<File>,
}

#[async_trait]
impl ResultSink for FileSink {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}

/// Completion signal of one writer
#[derive(Debug, Clone, Serialize)]
pub struct WriterReport {
    pub sink: SinkId,
    pub lines_written: usize,
    pub error: Option<String>,
}

impl WriterReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drains one channel into one sink
pub struct ResultWriter {
    sink: SinkId,
    factory: Arc<dyn SinkFactory>,
}

impl ResultWriter {
    pub fn new(sink: SinkId, factory: Arc<dyn SinkFactory>) -> Self {
        Self { sink, factory }
    }

    /// Start draining on a background task; the handle is the completion signal
    pub fn spawn(self, rx: mpsc::Receiver<String>) -> JoinHandle<WriterReport> {
        tokio::spawn(self.drain(rx))
    }

    /// Write every line until the channel is closed and empty, then flush.
    ///
    /// A write failure is recorded and draining continues so the channel
    /// still empties; the first error is reported.
    pub async fn drain(self, mut rx: mpsc::Receiver<String>) -> WriterReport {
        let name = self.sink.file_name();
        let mut report = WriterReport {
            sink: self.sink,
            lines_written: 0,
            error: None,
        };

        let mut sink = match self.factory.open(self.sink).await {
            Ok(sink) => sink,
            Err(e) => {
                error!(sink = name, error = %e, "failed to open sink");
                report.error = Some(e.to_string());
                return report;
            }
        };

        while let Some(line) = rx.recv().await {
            match sink.write_line(&line).await {
                Ok(()) => report.lines_written += 1,
                Err(source) => {
                    let e = SinkError::Write {
                        name: name.to_string(),
                        source,
                    };
                    error!(sink = name, error = %e, "write failed");
                    report.error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Err(source) = sink.finish().await {
            let e = SinkError::Write {
                name: name.to_string(),
                source,
            };
            error!(sink = name, error = %e, "flush failed");
            report.error.get_or_insert_with(|| e.to_string());
        }

        if report.is_success() {
            info!(sink = name, lines = report.lines_written, "file written");
        }
        report
    }
}
