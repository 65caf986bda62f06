//! Fan-out/fan-in pipeline from input lists to categorized output files

pub mod input;
pub mod orchestrator;
pub mod outcome;
pub mod router;
pub mod writer;

pub use input::InputItems;
pub use orchestrator::{Orchestrator, OutcomeCounts, RunConfig, RunReport, RunState};
pub use outcome::{Category, ClassifiedResult, CredentialKind, FailureCause, OutcomeKind};
pub use router::{ResultRouter, RoutingTable, SinkId};
pub use writer::{FileSinkFactory, ResultSink, ResultWriter, SinkFactory, WriterReport};
