//! Section and raw context types.

use serde::{Deserialize, Serialize};

/// Weight applied to a section that carries no explicit weight.
pub const DEFAULT_SECTION_WEIGHT: f64 = 1.0;

/// Atomic content unit of a context pack.
///
/// Optional fields are omitted from serialization when absent, so an absent
/// weight and an explicit `1.0` hash differently but sort identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Key, unique within one build.
    pub key: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Section content.
    #[serde(default)]
    pub body: String,
    /// Priority weight (higher = more important).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Ordered provenance trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<Vec<String>>,
    /// Ordered entity references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<String>>,
}

impl Section {
    /// Create a section with no weight, lineage or refs.
    pub fn new(key: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            body: body.into(),
            weight: None,
            lineage: None,
            refs: None,
        }
    }

    /// Set the priority weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the provenance trail.
    pub fn with_lineage(mut self, lineage: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.lineage = Some(lineage.into_iter().map(Into::into).collect());
        self
    }

    /// Set the entity references.
    pub fn with_refs(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.refs = Some(refs.into_iter().map(Into::into).collect());
        self
    }

    /// Weight used for ordering, falling back to [`DEFAULT_SECTION_WEIGHT`].
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(DEFAULT_SECTION_WEIGHT)
    }

    /// Lineage entries, empty when absent.
    pub fn lineage_entries(&self) -> &[String] {
        self.lineage.as_deref().unwrap_or_default()
    }
}

/// Unredacted output of a graph source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContext {
    /// Sections in source order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl RawContext {
    /// Create a context from sections.
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the context has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Look up a section by key.
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }
}

impl From<Vec<Section>> for RawContext {
    fn from(sections: Vec<Section>) -> Self {
        Self { sections }
    }
}
