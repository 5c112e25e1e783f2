//! Engine configuration.
//!
//! A [`PackConfig`] holds the collaborator wiring and policy version for one
//! engine. It is built once, then treated as read-only; there is no global
//! configuration.
//!
//! ## Environment
//!
//! [`PackSettings::from_env`] reads:
//! - `GACS_PACK_POLICY_VERSION`: policy version stamped into snapshots (default: `v1`)

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ports::{EventSink, GraphSource, PiiShield, SnapshotStore, Tokenizer};
use crate::DEFAULT_POLICY_VERSION;

/// Environment variable for the policy version.
pub const POLICY_VERSION_ENV: &str = "GACS_PACK_POLICY_VERSION";

/// File- or environment-sourced settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSettings {
    /// Policy version; `None` resolves to [`DEFAULT_POLICY_VERSION`].
    #[serde(default)]
    pub policy_version: Option<String>,
}

impl PackSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let policy_version = std::env::var(POLICY_VERSION_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        if policy_version.is_none() {
            tracing::debug!(
                env = POLICY_VERSION_ENV,
                default = DEFAULT_POLICY_VERSION,
                "Policy version not set in environment, using default"
            );
        }

        Self { policy_version }
    }
}

/// Collaborator wiring and policy for a [`ContextEngine`](crate::ContextEngine).
#[derive(Clone, Default)]
pub struct PackConfig {
    pub(crate) graph: Option<Arc<dyn GraphSource>>,
    pub(crate) pii_shield: Option<Arc<dyn PiiShield>>,
    pub(crate) tokenizer: Option<Arc<dyn Tokenizer>>,
    pub(crate) store: Option<Arc<dyn SnapshotStore>>,
    pub(crate) events: Option<Arc<dyn EventSink>>,
    pub(crate) policy_version: Option<String>,
}

impl PackConfig {
    /// Start building a configuration.
    pub fn builder() -> PackConfigBuilder {
        PackConfigBuilder::default()
    }

    /// Configured policy version, or [`DEFAULT_POLICY_VERSION`].
    pub fn resolved_policy_version(&self) -> &str {
        self.policy_version.as_deref().unwrap_or(DEFAULT_POLICY_VERSION)
    }

    /// Whether an event sink is wired.
    pub fn has_events(&self) -> bool {
        self.events.is_some()
    }
}

impl fmt::Debug for PackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackConfig")
            .field("graph", &self.graph.is_some())
            .field("pii_shield", &self.pii_shield.is_some())
            .field("tokenizer", &self.tokenizer.is_some())
            .field("store", &self.store.is_some())
            .field("events", &self.events.is_some())
            .field("policy_version", &self.policy_version)
            .finish()
    }
}

/// Builder for [`PackConfig`].
#[derive(Default)]
pub struct PackConfigBuilder {
    config: PackConfig,
    explicit_policy_version: bool,
}

impl PackConfigBuilder {
    /// Set the graph source.
    pub fn graph(mut self, graph: impl GraphSource + 'static) -> Self {
        self.config.graph = Some(Arc::new(graph));
        self
    }

    /// Set the redaction policy.
    pub fn pii_shield(mut self, shield: impl PiiShield + 'static) -> Self {
        self.config.pii_shield = Some(Arc::new(shield));
        self
    }

    /// Set the tokenizer.
    pub fn tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.config.tokenizer = Some(Arc::new(tokenizer));
        self
    }

    /// Set the snapshot store.
    pub fn store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.config.store = Some(Arc::new(store));
        self
    }

    /// Set a shared snapshot store, e.g. one the caller also reads from.
    pub fn shared_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.config.store = Some(store);
        self
    }

    /// Set the event sink.
    pub fn events(mut self, events: impl EventSink + 'static) -> Self {
        self.config.events = Some(Arc::new(events));
        self
    }

    /// Set a shared event sink.
    pub fn shared_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.config.events = Some(events);
        self
    }

    /// Set the policy version. Takes precedence over [`settings`](Self::settings).
    pub fn policy_version(mut self, version: impl Into<String>) -> Self {
        self.config.policy_version = Some(version.into());
        self.explicit_policy_version = true;
        self
    }

    /// Apply loaded settings.
    pub fn settings(mut self, settings: PackSettings) -> Self {
        if !self.explicit_policy_version {
            self.config.policy_version = settings.policy_version;
        }
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> PackConfig {
        self.config
    }
}
