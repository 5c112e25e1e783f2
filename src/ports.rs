//! Collaborator ports.
//!
//! The engine composes five collaborators, each behind a trait. Graph
//! traversal, persistence and event delivery are async because they are
//! typically I/O bound; redaction and token accounting are pure.
//!
//! All fallible methods return [`BoxError`] so the engine can propagate
//! collaborator failures without rewriting them.

use async_trait::async_trait;
use serde::Serialize;

use crate::budget::greedy_prefix;
use crate::snapshot::Snapshot;
use crate::types::{ContextPackId, Meta, RawContext, Section, SubjectId};

/// Boxed error returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Source of raw context sections, usually a knowledge graph.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Build the unredacted context for a subject.
    async fn build_context(
        &self,
        subject_id: &SubjectId,
        subject_type: &str,
        intent: &str,
        role: &str,
    ) -> Result<RawContext, BoxError>;
}

/// Role- and intent-aware redaction policy.
///
/// Implementations may mask, alter or drop sections. They should not reorder
/// sections unless the policy itself requires it.
pub trait PiiShield: Send + Sync {
    /// Return a redacted copy of `context`.
    fn redact(&self, context: &RawContext, role: &str, intent: &str) -> Result<RawContext, BoxError>;
}

/// Token accounting for the budgeter.
pub trait Tokenizer: Send + Sync {
    /// Count tokens in a piece of text.
    fn count_tokens(&self, text: &str) -> usize;

    /// Token cost of a whole section. Defaults to the cost of its body.
    fn section_cost(&self, section: &Section) -> usize {
        self.count_tokens(&section.body)
    }

    /// Keep a prefix of `sections` (already sorted by priority) within budget.
    ///
    /// The default is greedy prefix selection: sections are kept while the
    /// running cost stays within `budget_tokens`, stopping at the first one
    /// that would exceed it.
    fn truncate_sections(
        &self,
        sections: Vec<Section>,
        budget_tokens: usize,
    ) -> Result<Vec<Section>, BoxError> {
        Ok(greedy_prefix(sections, budget_tokens, |s| self.section_cost(s)))
    }
}

/// Persistence for built snapshots.
///
/// `save` must be an idempotent upsert keyed by `id`: concurrent builds of the
/// same content will save the same id more than once.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot under its content address.
    async fn save(&self, id: &ContextPackId, snapshot: &Snapshot, meta: &Meta) -> Result<(), BoxError>;
}

/// Optional fire-and-forget sink for lifecycle events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver an event. Failures are logged by the engine and otherwise ignored.
    async fn emit(&self, event: &PackEvent) -> Result<(), BoxError>;
}

/// Lifecycle events emitted after a pack is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PackEvent {
    /// A pack was built and saved.
    ContextBuilt {
        /// Pack id.
        id: ContextPackId,
        /// Build intent.
        intent: String,
        /// Requesting role.
        role: String,
        /// Subject id.
        subject_id: SubjectId,
        /// Subject type.
        subject_type: String,
    },
    /// The budget excluded some sections.
    ContextTruncated {
        /// Pack id.
        id: ContextPackId,
        /// Sections kept.
        kept: usize,
        /// Sections dropped by the budget.
        dropped: usize,
        /// Budget the pack was built under.
        budget_tokens: usize,
    },
    /// Redaction altered or removed sections.
    PiiRedacted {
        /// Pack id.
        id: ContextPackId,
        /// Requesting role.
        role: String,
        /// Build intent.
        intent: String,
        /// Sections whose content changed.
        altered: usize,
        /// Sections removed entirely.
        dropped: usize,
    },
}

impl PackEvent {
    /// Event name, e.g. `context_built`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContextBuilt { .. } => "context_built",
            Self::ContextTruncated { .. } => "context_truncated",
            Self::PiiRedacted { .. } => "pii_redacted",
        }
    }

    /// Id of the pack this event refers to.
    pub fn id(&self) -> &ContextPackId {
        match self {
            Self::ContextBuilt { id, .. }
            | Self::ContextTruncated { id, .. }
            | Self::PiiRedacted { id, .. } => id,
        }
    }
}
