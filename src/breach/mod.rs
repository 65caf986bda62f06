//! Breach lookups: key derivation, the remote API and per-item workers

pub mod api;
pub mod key;
pub mod worker;

pub use api::{ApiEndpoints, BreachTransport, HttpReply, HttpTransport};
pub use key::LookupKey;
pub use worker::WorkerContext;
