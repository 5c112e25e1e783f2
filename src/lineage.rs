//! Lineage aggregation across pack sections.
//!
//! Each section may carry a provenance trail tracing back through the
//! knowledge graph. The aggregate is the concatenation of every trail in
//! section order, with duplicates removed at their first occurrence.
//!
//! ```rust
//! use gacs_pack::{lineage, Section};
//!
//! let sections = vec![
//!     Section::new("demographics", "", "").with_lineage(["patient:123", "demographics"]),
//!     Section::new("conditions", "", "").with_lineage(["patient:123", "conditions", "icd10:E11"]),
//! ];
//!
//! assert_eq!(
//!     lineage::from_sections(&sections),
//!     ["patient:123", "demographics", "conditions", "icd10:E11"],
//! );
//! ```

use std::collections::HashSet;

use crate::types::Section;

/// Aggregate unique lineage entries across sections, in first-seen order.
pub fn from_sections(sections: &[Section]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();

    for entry in sections.iter().flat_map(Section::lineage_entries) {
        if seen.insert(entry.as_str()) {
            out.push(entry.clone());
        }
    }

    out
}

/// Like [`from_sections`], treating absent input as empty.
pub fn from_optional(sections: Option<&[Section]>) -> Vec<String> {
    sections.map(from_sections).unwrap_or_default()
}
