//! # gacs-pack
//!
//! Deterministic, content-addressed context packs.
//!
//! A context pack answers one question:
//!
//! > Given a subject, an intent and a role, which content may be handed to a
//! > model, and under what immutable id?
//!
//! ## Core Contract
//!
//! 1. Fetch raw sections from a graph source
//! 2. Redact them for the requesting role and intent
//! 3. Keep the highest-priority sections that fit the token budget
//! 4. Freeze the result into a [`Snapshot`] whose SHA-256 is the [`ContextPackId`]
//! 5. Persist it, then announce it
//!
//! ## Architecture
//!
//! ```text
//! BuildRequest → ContextEngine → GraphSource → PiiShield → TokenBudgeter → Snapshot
//!                                                                            ↓
//!                                                     SnapshotStore → EventSink
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same sections + same policy version + same meta → identical pack id
//! - Object keys are serialized in byte order, with no whitespace
//! - Lineage is deduplicated in first-occurrence order
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use gacs_pack::adapters::{KeyMaskShield, StaticGraph, WordTokenizer};
//! use gacs_pack::{BuildRequest, ContextEngine, InMemorySnapshotStore, PackConfig, Section};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemorySnapshotStore::new());
//! let engine = ContextEngine::new(
//!     PackConfig::builder()
//!         .graph(StaticGraph::new(vec![Section::new("demo", "Demographics", "Patient data")]))
//!         .pii_shield(KeyMaskShield::new(["ssn"]))
//!         .tokenizer(WordTokenizer::new()?)
//!         .shared_store(store.clone())
//!         .build(),
//! );
//!
//! let (id, view) = engine
//!     .build(&BuildRequest::new(123, "Patient", "care_gap_analysis", "provider", 8000))
//!     .await?;
//! assert_eq!(id.as_str().len(), 64);
//! assert_eq!(view.policy_version, "v1");
//! assert!(store.get(&id).is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod budget;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod lineage;
pub mod logging;
pub mod ports;
pub mod snapshot;
pub mod store;
pub mod types;

/// Policy version stamped into snapshots when none is configured.
pub const DEFAULT_POLICY_VERSION: &str = "v1";

// Re-exports
pub use budget::TokenBudgeter;
pub use canonical::{canonical_hash_hex, sha256_hex, to_canonical_bytes, to_canonical_string, CanonicalError};
pub use config::{PackConfig, PackConfigBuilder, PackSettings, POLICY_VERSION_ENV};
pub use engine::{BuildRequest, Collaborator, ContextEngine, PackError};
pub use ports::{BoxError, EventSink, GraphSource, PackEvent, PiiShield, SnapshotStore, Tokenizer};
pub use snapshot::{Snapshot, SnapshotView};
pub use store::{InMemorySnapshotStore, StoredPack};
#[cfg(feature = "postgres")]
pub use store::{PostgresSnapshotStore, PostgresStoreConfig, PostgresStoreError};
pub use types::{
    ContextPackId, Meta, MetaValue, PackIdError, RawContext, Section, SubjectId,
    DEFAULT_SECTION_WEIGHT,
};
