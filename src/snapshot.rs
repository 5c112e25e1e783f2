//! Immutable context pack snapshot with stable hashing.
//!
//! A [`Snapshot`] holds the packed sections, the policy version and the
//! metadata of one build. Its [`stable_hash`](Snapshot::stable_hash) is the
//! SHA-256 of the canonical JSON of its view, and serves as the
//! [`ContextPackId`].
//!
//! ## Determinism Guarantees
//!
//! - Equal `(sections, policy_version, meta)` → identical canonical bytes
//! - Meta is a `BTreeMap`, and canonical serialization re-sorts keys anyway
//! - Lineage is derived from sections, never stored independently

use serde::{Deserialize, Serialize};

use crate::canonical::{self, CanonicalError};
use crate::lineage;
use crate::types::{ContextPackId, Meta, MetaValue, Section};

/// An immutable packed context.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    sections: Vec<Section>,
    policy_version: String,
    meta: Meta,
}

/// Serializable view of a snapshot, including derived lineage.
///
/// This is the output artifact returned to callers and persisted by stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotView {
    /// Packed sections in priority order.
    pub sections: Vec<Section>,
    /// Policy version the pack was built under.
    pub policy_version: String,
    /// Build metadata.
    pub meta: Meta,
    /// Deduplicated provenance across sections.
    pub lineage: Vec<String>,
}

/// Borrowed form of [`SnapshotView`] used for hashing without cloning.
#[derive(Serialize)]
struct CanonicalView<'a> {
    sections: &'a [Section],
    policy_version: &'a str,
    meta: &'a Meta,
    lineage: Vec<String>,
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(sections: Vec<Section>, policy_version: impl Into<String>, meta: Meta) -> Self {
        Self {
            sections,
            policy_version: policy_version.into(),
            meta,
        }
    }

    /// Create a snapshot with empty metadata.
    pub fn without_meta(sections: Vec<Section>, policy_version: impl Into<String>) -> Self {
        Self::new(sections, policy_version, Meta::new())
    }

    /// Packed sections.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Policy version.
    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    /// Build metadata.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Aggregated lineage of the packed sections.
    pub fn lineage(&self) -> Vec<String> {
        lineage::from_sections(&self.sections)
    }

    /// Owned view with derived lineage.
    pub fn to_view(&self) -> SnapshotView {
        SnapshotView {
            sections: self.sections.clone(),
            policy_version: self.policy_version.clone(),
            meta: self.meta.clone(),
            lineage: self.lineage(),
        }
    }

    /// Canonical JSON bytes of the view.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CanonicalError> {
        self.check_finite()?;
        canonical::to_canonical_bytes(&CanonicalView {
            sections: &self.sections,
            policy_version: &self.policy_version,
            meta: &self.meta,
            lineage: self.lineage(),
        })
    }

    /// Canonical JSON of the view as a string.
    pub fn canonical_json(&self) -> Result<String, CanonicalError> {
        let bytes = self.canonical_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// SHA-256 of the canonical bytes.
    pub fn stable_hash(&self) -> Result<ContextPackId, CanonicalError> {
        let bytes = self.canonical_bytes()?;
        Ok(ContextPackId::from_digest(&canonical::sha256(&bytes)))
    }

    fn check_finite(&self) -> Result<(), CanonicalError> {
        for section in &self.sections {
            if let Some(weight) = section.weight {
                if !weight.is_finite() {
                    return Err(CanonicalError::NonFiniteNumber {
                        field: format!("sections[{}].weight", section.key),
                    });
                }
            }
        }
        for (key, value) in &self.meta {
            if let MetaValue::Float(x) = value {
                if !x.is_finite() {
                    return Err(CanonicalError::NonFiniteNumber {
                        field: format!("meta.{}", key),
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Snapshot> for SnapshotView {
    fn from(snapshot: Snapshot) -> Self {
        let lineage = snapshot.lineage();
        Self {
            sections: snapshot.sections,
            policy_version: snapshot.policy_version,
            meta: snapshot.meta,
            lineage,
        }
    }
}
