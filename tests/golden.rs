//! Golden tests for context pack hashing.
//!
//! These tests pin the canonical form and the resulting pack ids. Any change
//! to them changes every persisted content address.

use gacs_pack::{canonical_hash_hex, sha256_hex, ContextPackId, Meta, Section, Snapshot};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn care_gap_meta() -> Meta {
    let mut meta = Meta::new();
    meta.insert("subject_type".into(), "Patient".into());
    meta.insert("subject_id".into(), 123i64.into());
    meta.insert("role".into(), "provider".into());
    meta.insert("intent".into(), "care_gap_analysis".into());
    meta
}

fn care_gap_snapshot() -> Snapshot {
    Snapshot::new(
        vec![
            Section::new("demographics", "Demographics", "Patient: John Doe")
                .with_weight(2.0)
                .with_lineage(["patient:123", "demographics"]),
            Section::new("labs", "Labs", "A1C 7.2")
                .with_lineage(["patient:123", "labs"])
                .with_refs(["obs:1"]),
        ],
        "v1",
        care_gap_meta(),
    )
}

const CARE_GAP_CANONICAL: &str = concat!(
    r#"{"lineage":["patient:123","demographics","labs"],"#,
    r#""meta":{"intent":"care_gap_analysis","role":"provider","subject_id":123,"subject_type":"Patient"},"#,
    r#""policy_version":"v1","#,
    r#""sections":["#,
    r#"{"body":"Patient: John Doe","key":"demographics","lineage":["patient:123","demographics"],"title":"Demographics","weight":2.0},"#,
    r#"{"body":"A1C 7.2","key":"labs","lineage":["patient:123","labs"],"refs":["obs:1"],"title":"Labs"}"#,
    r#"]}"#
);

const CARE_GAP_ID: &str = "c4fe10f26f26778cfd9a216452285fecc657e1993ad001458ef351001920932c";

// ─────────────────────────────────────────────────────────────────────────────
// Golden Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_canonical_form() {
    assert_eq!(care_gap_snapshot().canonical_json().unwrap(), CARE_GAP_CANONICAL);
}

#[test]
fn golden_pack_id() {
    let id = care_gap_snapshot().stable_hash().unwrap();
    assert_eq!(id.as_str(), CARE_GAP_ID);
    assert_eq!(sha256_hex(CARE_GAP_CANONICAL.as_bytes()), CARE_GAP_ID);
}

#[test]
fn golden_minimal_snapshot() {
    let mut meta = Meta::new();
    meta.insert("intent".into(), "care_gap".into());
    meta.insert("role".into(), "provider".into());
    let snapshot = Snapshot::new(
        vec![Section::new("demographics", "Demographics", "Patient: John Doe").with_weight(1.0)],
        "v1",
        meta,
    );
    assert_eq!(
        snapshot.stable_hash().unwrap().as_str(),
        "156ea95bb9b30288b2850c94111d87a628a1dc143e084fa58c8c85309b973de5"
    );
}

#[test]
fn golden_float_weights() {
    let snapshot = Snapshot::without_meta(
        vec![
            Section::new("a", "A", "x").with_weight(1e21),
            Section::new("b", "B", "y").with_weight(1e-7),
            Section::new("c", "C", "z").with_weight(0.1),
        ],
        "v1",
    );
    assert_eq!(
        snapshot.canonical_json().unwrap(),
        concat!(
            r#"{"lineage":[],"meta":{},"policy_version":"v1","sections":["#,
            r#"{"body":"x","key":"a","title":"A","weight":1e21},"#,
            r#"{"body":"y","key":"b","title":"B","weight":1e-7},"#,
            r#"{"body":"z","key":"c","title":"C","weight":0.1}]}"#
        )
    );
    assert_eq!(
        snapshot.stable_hash().unwrap().as_str(),
        "eeffce1025ed17fc66273076f82b8c8b52ad3900d9fcb76e26d75c575d99dc61"
    );
}

#[test]
fn golden_view_hash_matches_snapshot_hash() {
    let snapshot = care_gap_snapshot();
    let via_view = canonical_hash_hex(&snapshot.to_view()).unwrap();
    assert_eq!(via_view, snapshot.stable_hash().unwrap().as_str());
}

#[test]
fn golden_id_parses() {
    let id = ContextPackId::parse(CARE_GAP_ID).unwrap();
    assert_eq!(id, care_gap_snapshot().stable_hash().unwrap());
}

#[test]
fn determinism_across_runs() {
    let expected = care_gap_snapshot().stable_hash().unwrap();
    for _ in 0..100 {
        assert_eq!(care_gap_snapshot().stable_hash().unwrap(), expected);
    }
}

#[test]
fn policy_version_bump_changes_id() {
    let v1 = care_gap_snapshot();
    let v2 = Snapshot::new(v1.sections().to_vec(), "v2", v1.meta().clone());
    assert_ne!(v1.stable_hash().unwrap(), v2.stable_hash().unwrap());
}

#[test]
fn numeric_and_text_subject_ids_differ() {
    let numeric = care_gap_snapshot();
    let mut meta = care_gap_meta();
    meta.insert("subject_id".into(), "123".into());
    let text = Snapshot::new(numeric.sections().to_vec(), "v1", meta);
    assert_ne!(numeric.stable_hash().unwrap(), text.stable_hash().unwrap());
}
