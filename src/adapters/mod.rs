//! Reference collaborator implementations.
//!
//! Small, dependency-light adapters for tests, demos and single-process
//! deployments. Production systems usually bring their own graph source and
//! redaction policy.

mod events;
mod graph;
mod shield;
mod tokenizer;

pub use events::TracingEventSink;
pub use graph::StaticGraph;
pub use shield::{KeyMaskShield, PassThroughShield, REDACTED};
pub use tokenizer::WordTokenizer;
