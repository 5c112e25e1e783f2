//! Reference redaction policies.

use std::collections::BTreeSet;

use crate::ports::{BoxError, PiiShield};
use crate::types::RawContext;

/// Replacement text for masked content.
pub const REDACTED: &str = "[REDACTED]";

/// Shield that returns the context unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughShield;

impl PiiShield for PassThroughShield {
    fn redact(&self, context: &RawContext, _role: &str, _intent: &str) -> Result<RawContext, BoxError> {
        Ok(context.clone())
    }
}

/// Masks the body of selected section keys unless the role is allowed.
///
/// Section order, keys, titles and lineage are preserved; only bodies change.
#[derive(Debug, Clone, Default)]
pub struct KeyMaskShield {
    masked_keys: BTreeSet<String>,
    allowed_roles: BTreeSet<String>,
}

impl KeyMaskShield {
    /// Shield masking the given section keys for every role.
    pub fn new(masked_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            masked_keys: masked_keys.into_iter().map(Into::into).collect(),
            allowed_roles: BTreeSet::new(),
        }
    }

    /// Let `role` see masked sections in the clear.
    pub fn allow_role(mut self, role: impl Into<String>) -> Self {
        self.allowed_roles.insert(role.into());
        self
    }

    /// Whether `role` bypasses masking.
    pub fn is_allowed(&self, role: &str) -> bool {
        self.allowed_roles.contains(role)
    }
}

impl PiiShield for KeyMaskShield {
    fn redact(&self, context: &RawContext, role: &str, _intent: &str) -> Result<RawContext, BoxError> {
        if self.is_allowed(role) {
            return Ok(context.clone());
        }

        let sections = context
            .sections
            .iter()
            .map(|section| {
                let mut section = section.clone();
                if self.masked_keys.contains(&section.key) {
                    section.body = REDACTED.to_string();
                }
                section
            })
            .collect();

        Ok(RawContext::new(sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Section;

    fn context() -> RawContext {
        RawContext::new(vec![
            Section::new("demographics", "Demographics", "Patient: John Doe"),
            Section::new("ssn", "SSN", "123-45-6789").with_lineage(["patient:123"]),
        ])
    }

    #[test]
    fn test_pass_through() {
        let out = PassThroughShield.redact(&context(), "provider", "care_gap").unwrap();
        assert_eq!(out, context());
    }

    #[test]
    fn test_masks_configured_keys() {
        let shield = KeyMaskShield::new(["ssn"]).allow_role("admin");
        let out = shield.redact(&context(), "provider", "care_gap").unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.section("demographics").unwrap().body, "Patient: John Doe");
        let ssn = out.section("ssn").unwrap();
        assert_eq!(ssn.body, REDACTED);
        assert_eq!(ssn.title, "SSN");
        assert_eq!(ssn.lineage_entries(), ["patient:123"]);
    }

    #[test]
    fn test_allowed_role_sees_clear_text() {
        let shield = KeyMaskShield::new(["ssn"]).allow_role("admin");
        let out = shield.redact(&context(), "admin", "care_gap").unwrap();
        assert_eq!(out, context());
    }
}
