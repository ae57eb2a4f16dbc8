//! Observability — structured logging for the ALE stack
//!
//! Thin layer over the `tracing` ecosystem. The protocol modules emit
//! events (state transitions, channel hops, retransmissions, persistence
//! activity); this module owns subscriber setup so hosts get consistent
//! output whether they want a compact console log or JSON for ingestion.

mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
