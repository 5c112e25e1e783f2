//! Context pack engine.
//!
//! Orchestrates one build:
//!
//! ```text
//! GraphSource → PiiShield → TokenBudgeter (→ Tokenizer) → Snapshot → SnapshotStore → EventSink
//! ```
//!
//! Steps run strictly in that order, each awaited before the next. The first
//! collaborator failure aborts the build and is returned as-is; nothing is
//! retried. Event delivery happens only after a successful save and never
//! fails the build.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::budget::TokenBudgeter;
use crate::canonical::CanonicalError;
use crate::config::PackConfig;
use crate::ports::{BoxError, EventSink, PackEvent};
use crate::snapshot::{Snapshot, SnapshotView};
use crate::types::{ContextPackId, Meta, MetaValue, RawContext, Section, SubjectId};

/// Collaborator a failure or missing wiring refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    /// Graph source.
    Graph,
    /// Redaction policy.
    PiiShield,
    /// Tokenizer.
    Tokenizer,
    /// Snapshot store.
    Store,
    /// Event sink.
    Events,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::PiiShield => write!(f, "pii_shield"),
            Self::Tokenizer => write!(f, "tokenizer"),
            Self::Store => write!(f, "store"),
            Self::Events => write!(f, "events"),
        }
    }
}

/// Error type for engine builds.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// A required collaborator is not wired.
    #[error("Collaborator not configured: {0}")]
    NotConfigured(Collaborator),
    /// A collaborator returned an error.
    #[error("{stage} failed: {source}")]
    Collaborator {
        /// Which collaborator failed.
        stage: Collaborator,
        /// The collaborator's own error, unmodified.
        #[source]
        source: BoxError,
    },
    /// The snapshot could not be canonically serialized.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

impl PackError {
    fn collaborator(stage: Collaborator, source: BoxError) -> Self {
        Self::Collaborator { stage, source }
    }

    /// Collaborator the error refers to, if any.
    pub fn stage(&self) -> Option<Collaborator> {
        match self {
            Self::NotConfigured(c) => Some(*c),
            Self::Collaborator { stage, .. } => Some(*stage),
            Self::Canonical(_) => None,
        }
    }

    /// Recover the collaborator's original error.
    pub fn into_source(self) -> Option<BoxError> {
        match self {
            Self::Collaborator { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parameters of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// Subject the pack is about.
    pub subject_id: SubjectId,
    /// Subject type (e.g. "Patient").
    pub subject_type: String,
    /// Purpose of the pack (e.g. "care_gap_analysis").
    pub intent: String,
    /// Role of the requester (e.g. "provider").
    pub role: String,
    /// Token ceiling for packed sections.
    pub budget_tokens: usize,
    /// Extra meta entries. Required keys override these.
    pub extra_meta: Meta,
}

impl BuildRequest {
    /// Create a new build request.
    pub fn new(
        subject_id: impl Into<SubjectId>,
        subject_type: impl Into<String>,
        intent: impl Into<String>,
        role: impl Into<String>,
        budget_tokens: usize,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_type: subject_type.into(),
            intent: intent.into(),
            role: role.into(),
            budget_tokens,
            extra_meta: Meta::new(),
        }
    }

    /// Attach an extra meta entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.extra_meta.insert(key.into(), value.into());
        self
    }

    /// Snapshot meta: extras plus the required build keys.
    pub fn meta(&self) -> Meta {
        let mut meta = self.extra_meta.clone();
        meta.insert("intent".into(), self.intent.as_str().into());
        meta.insert("role".into(), self.role.as_str().into());
        meta.insert("subject_id".into(), self.subject_id.clone().into());
        meta.insert("subject_type".into(), self.subject_type.as_str().into());
        meta
    }
}

/// Builds, persists and announces context packs.
///
/// Cloning is cheap; clones share the same read-only configuration.
#[derive(Debug, Clone)]
pub struct ContextEngine {
    config: Arc<PackConfig>,
}

impl ContextEngine {
    /// Create an engine over a configuration.
    pub fn new(config: PackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Build a context pack, returning its id and view.
    pub async fn build(&self, request: &BuildRequest) -> Result<(ContextPackId, SnapshotView), PackError> {
        let span = info_span!(
            "context_pack.build",
            intent = %request.intent,
            role = %request.role,
            subject_type = %request.subject_type,
        );
        self.build_inner(request).instrument(span).await
    }

    async fn build_inner(&self, request: &BuildRequest) -> Result<(ContextPackId, SnapshotView), PackError> {
        let cfg = &*self.config;
        let graph = cfg.graph.as_deref().ok_or(PackError::NotConfigured(Collaborator::Graph))?;
        let shield = cfg
            .pii_shield
            .as_deref()
            .ok_or(PackError::NotConfigured(Collaborator::PiiShield))?;
        let tokenizer = cfg
            .tokenizer
            .as_deref()
            .ok_or(PackError::NotConfigured(Collaborator::Tokenizer))?;
        let store = cfg.store.as_deref().ok_or(PackError::NotConfigured(Collaborator::Store))?;

        // 1. Raw context from the graph
        let raw = graph
            .build_context(&request.subject_id, &request.subject_type, &request.intent, &request.role)
            .await
            .map_err(|e| PackError::collaborator(Collaborator::Graph, e))?;
        debug!(sections = raw.len(), "Raw context fetched");

        // 2. Redaction
        let redacted = shield
            .redact(&raw, &request.role, &request.intent)
            .map_err(|e| PackError::collaborator(Collaborator::PiiShield, e))?;
        let delta = RedactionDelta::between(&raw, &redacted);
        drop(raw);
        debug!(
            sections = redacted.len(),
            altered = delta.altered,
            dropped = delta.dropped,
            "Context redacted"
        );

        // 3. Budget packing
        let available = redacted.len();
        let packed = TokenBudgeter::new(tokenizer)
            .pack(redacted, request.budget_tokens)
            .map_err(|e| PackError::collaborator(Collaborator::Tokenizer, e))?;
        debug!(
            kept = packed.len(),
            available,
            budget_tokens = request.budget_tokens,
            "Sections packed"
        );

        // 4-5. Snapshot and content address
        let snapshot = Snapshot::new(packed, cfg.resolved_policy_version(), request.meta());
        let id = snapshot.stable_hash()?;

        // 6. Persist
        store
            .save(&id, &snapshot, snapshot.meta())
            .await
            .map_err(|e| PackError::collaborator(Collaborator::Store, e))?;

        info!(
            context_pack_id = %id,
            sections = snapshot.sections().len(),
            policy_version = snapshot.policy_version(),
            "Context pack built"
        );

        // 7. Notify
        if let Some(events) = cfg.events.as_deref() {
            let kept = snapshot.sections().len();
            for event in lifecycle_events(&id, request, kept, available, &delta) {
                emit_advisory(events, &event).await;
            }
        }

        // 8. Return
        Ok((id, snapshot.to_view()))
    }
}

/// Changes made by redaction, matched by section key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RedactionDelta {
    altered: usize,
    dropped: usize,
}

impl RedactionDelta {
    fn between(raw: &RawContext, redacted: &RawContext) -> Self {
        let after: BTreeMap<&str, &Section> = redacted
            .sections
            .iter()
            .map(|s| (s.key.as_str(), s))
            .collect();

        raw.sections.iter().fold(Self::default(), |mut delta, before| {
            match after.get(before.key.as_str()) {
                None => delta.dropped += 1,
                Some(s) if *s != before => delta.altered += 1,
                Some(_) => {}
            }
            delta
        })
    }

    fn is_empty(&self) -> bool {
        self.altered == 0 && self.dropped == 0
    }
}

fn lifecycle_events(
    id: &ContextPackId,
    request: &BuildRequest,
    kept: usize,
    available: usize,
    delta: &RedactionDelta,
) -> Vec<PackEvent> {
    let mut events = vec![PackEvent::ContextBuilt {
        id: id.clone(),
        intent: request.intent.clone(),
        role: request.role.clone(),
        subject_id: request.subject_id.clone(),
        subject_type: request.subject_type.clone(),
    }];

    if kept < available {
        events.push(PackEvent::ContextTruncated {
            id: id.clone(),
            kept,
            dropped: available - kept,
            budget_tokens: request.budget_tokens,
        });
    }

    if !delta.is_empty() {
        events.push(PackEvent::PiiRedacted {
            id: id.clone(),
            role: request.role.clone(),
            intent: request.intent.clone(),
            altered: delta.altered,
            dropped: delta.dropped,
        });
    }

    events
}

async fn emit_advisory(events: &dyn EventSink, event: &PackEvent) {
    if let Err(e) = events.emit(event).await {
        warn!(
            event = event.name(),
            context_pack_id = %event.id(),
            error = %e,
            "Event emission failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{GraphSource, PiiShield, SnapshotStore, Tokenizer};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct OneSectionGraph;

    #[async_trait]
    impl GraphSource for OneSectionGraph {
        async fn build_context(
            &self,
            _subject_id: &SubjectId,
            _subject_type: &str,
            _intent: &str,
            _role: &str,
        ) -> Result<RawContext, BoxError> {
            Ok(RawContext::new(vec![Section::new("demo", "Demographics", "Patient data...")
                .with_weight(1.0)
                .with_lineage(["patient:123", "demographics"])]))
        }
    }

    struct PassThrough;

    impl PiiShield for PassThrough {
        fn redact(&self, context: &RawContext, _role: &str, _intent: &str) -> Result<RawContext, BoxError> {
            Ok(context.clone())
        }
    }

    struct PerSection(usize);

    impl Tokenizer for PerSection {
        fn count_tokens(&self, _text: &str) -> usize {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(ContextPackId, Meta)>>,
    }

    #[async_trait]
    impl SnapshotStore for Arc<RecordingStore> {
        async fn save(&self, id: &ContextPackId, _snapshot: &Snapshot, meta: &Meta) -> Result<(), BoxError> {
            self.saved.lock().push((id.clone(), meta.clone()));
            Ok(())
        }
    }

    fn request() -> BuildRequest {
        BuildRequest::new(123, "Patient", "care_gap_analysis", "provider", 8000)
    }

    #[test]
    fn test_request_meta_required_keys_win() {
        let meta = request()
            .with_meta("intent", "spoofed")
            .with_meta("tenant", "acme")
            .meta();
        assert_eq!(meta["intent"], MetaValue::from("care_gap_analysis"));
        assert_eq!(meta["subject_id"], MetaValue::Integer(123));
        assert_eq!(meta["tenant"], MetaValue::from("acme"));
        assert_eq!(meta.len(), 5);
    }

    #[test]
    fn test_redaction_delta() {
        let raw = RawContext::new(vec![
            Section::new("a", "", "keep"),
            Section::new("b", "", "secret"),
            Section::new("c", "", "gone"),
        ]);
        let redacted = RawContext::new(vec![
            Section::new("a", "", "keep"),
            Section::new("b", "", "[REDACTED]"),
        ]);
        let delta = RedactionDelta::between(&raw, &redacted);
        assert_eq!(delta, RedactionDelta { altered: 1, dropped: 1 });
        assert!(RedactionDelta::between(&raw, &raw).is_empty());
    }

    #[test]
    fn test_error_exposes_source() {
        let err = PackError::collaborator(Collaborator::Graph, "boom".into());
        assert_eq!(err.stage(), Some(Collaborator::Graph));
        assert_eq!(err.to_string(), "graph failed: boom");
        assert_eq!(err.into_source().unwrap().to_string(), "boom");
    }

    #[tokio::test]
    async fn test_build_returns_id_and_view() {
        let store = Arc::new(RecordingStore::default());
        let engine = ContextEngine::new(
            PackConfig::builder()
                .graph(OneSectionGraph)
                .pii_shield(PassThrough)
                .tokenizer(PerSection(10))
                .store(Arc::clone(&store))
                .build(),
        );

        let (id, view) = engine.build(&request()).await.unwrap();

        assert_eq!(id.as_str().len(), 64);
        assert_eq!(view.policy_version, "v1");
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.lineage, ["patient:123", "demographics"]);
        assert_eq!(view.meta["subject_type"], MetaValue::from("Patient"));

        let saved = store.saved.lock();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, id);
        assert_eq!(saved[0].1, view.meta);
    }

    #[tokio::test]
    async fn test_missing_store_fails_before_graph() {
        let engine = ContextEngine::new(
            PackConfig::builder()
                .graph(OneSectionGraph)
                .pii_shield(PassThrough)
                .tokenizer(PerSection(10))
                .build(),
        );
        let err = engine.build(&request()).await.unwrap_err();
        assert!(matches!(err, PackError::NotConfigured(Collaborator::Store)));
    }

    #[tokio::test]
    async fn test_identical_builds_share_id() {
        let engine = ContextEngine::new(
            PackConfig::builder()
                .graph(OneSectionGraph)
                .pii_shield(PassThrough)
                .tokenizer(PerSection(10))
                .store(Arc::new(RecordingStore::default()))
                .build(),
        );
        let (id1, _) = engine.build(&request()).await.unwrap();
        let (id2, _) = engine.build(&request()).await.unwrap();
        assert_eq!(id1, id2);
    }
}
