//! Token budgeting for context packs.
//!
//! The budgeter orders sections by priority and hands the ordered list to a
//! [`Tokenizer`], which decides what fits.
//!
//! ## Algorithm
//!
//! 1. Stable sort by weight, descending (missing weight = 1.0)
//! 2. Ties keep their source order
//! 3. Delegate to [`Tokenizer::truncate_sections`]
//!
//! The default truncation is a greedy prefix: the first section that would
//! push the running cost past the budget ends the pack, even if a later,
//! cheaper section would fit.

use crate::ports::{BoxError, Tokenizer};
use crate::types::{RawContext, Section};

/// Packs sections within a token budget, prioritizing by weight.
pub struct TokenBudgeter<'a> {
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> TokenBudgeter<'a> {
    /// Create a budgeter over a tokenizer.
    pub fn new(tokenizer: &'a dyn Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Sort `context` by priority and truncate it to `budget_tokens`.
    pub fn pack(&self, context: RawContext, budget_tokens: usize) -> Result<Vec<Section>, BoxError> {
        let sorted = sort_by_priority(context.sections);
        self.tokenizer.truncate_sections(sorted, budget_tokens)
    }
}

/// Stable sort by effective weight, highest first.
///
/// `f64::total_cmp` gives NaN weights a fixed position instead of an
/// inconsistent comparison. `-0.0` is folded into `0.0` first, so the two
/// tie.
pub fn sort_by_priority(mut sections: Vec<Section>) -> Vec<Section> {
    sections.sort_by(|a, b| priority(b).total_cmp(&priority(a)));
    sections
}

fn priority(section: &Section) -> f64 {
    let weight = section.effective_weight();
    if weight == 0.0 {
        0.0
    } else {
        weight
    }
}

/// Keep the longest prefix of `sections` whose total cost fits `budget_tokens`.
pub fn greedy_prefix<F>(sections: Vec<Section>, budget_tokens: usize, cost: F) -> Vec<Section>
where
    F: Fn(&Section) -> usize,
{
    let mut used: usize = 0;
    let mut kept = Vec::with_capacity(sections.len());

    for section in sections {
        let next = used.saturating_add(cost(&section));
        if next > budget_tokens {
            break;
        }
        used = next;
        kept.push(section);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Charges a fixed cost per section.
    struct FixedCost(usize);

    impl Tokenizer for FixedCost {
        fn count_tokens(&self, _text: &str) -> usize {
            self.0
        }
    }

    fn keys(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.key.as_str()).collect()
    }

    fn weighted(key: &str, weight: f64) -> Section {
        Section::new(key, key.to_uppercase(), "...").with_weight(weight)
    }

    #[test]
    fn test_pack_prioritizes_by_weight() {
        let ctx = RawContext::new(vec![weighted("a", 2.0), weighted("b", 1.0), weighted("c", 3.0)]);
        let tokenizer = FixedCost(10);
        let packed = TokenBudgeter::new(&tokenizer).pack(ctx, 25).unwrap();
        assert_eq!(keys(&packed), ["c", "a"]);
    }

    #[test]
    fn test_missing_weight_sorts_as_one() {
        let ctx = RawContext::new(vec![
            weighted("low", 0.5),
            Section::new("default", "", "..."),
            weighted("explicit", 1.0),
            weighted("high", 1.5),
        ]);
        let tokenizer = FixedCost(1);
        let packed = TokenBudgeter::new(&tokenizer).pack(ctx, 100).unwrap();
        assert_eq!(keys(&packed), ["high", "default", "explicit", "low"]);
    }

    #[test]
    fn test_ties_keep_source_order_under_budget() {
        let ctx = RawContext::new(vec![
            weighted("first", 1.0),
            weighted("second", 1.0),
            weighted("third", 1.0),
            weighted("fourth", 1.0),
        ]);
        let tokenizer = FixedCost(10);
        let packed = TokenBudgeter::new(&tokenizer).pack(ctx, 25).unwrap();
        assert_eq!(keys(&packed), ["first", "second"]);
    }

    #[test]
    fn test_empty_context() {
        let tokenizer = FixedCost(10);
        let packed = TokenBudgeter::new(&tokenizer).pack(RawContext::default(), 100).unwrap();
        assert!(packed.is_empty());
    }

    #[test]
    fn test_zero_budget() {
        let ctx = RawContext::new(vec![weighted("a", 1.0)]);
        let tokenizer = FixedCost(1);
        let packed = TokenBudgeter::new(&tokenizer).pack(ctx, 0).unwrap();
        assert!(packed.is_empty());
    }

    #[test]
    fn test_greedy_prefix_does_not_skip_ahead() {
        let sections = vec![weighted("a", 3.0), weighted("b", 2.0), weighted("c", 1.0)];
        let costs = |s: &Section| match s.key.as_str() {
            "a" => 5,
            "b" => 10,
            _ => 1,
        };
        let kept = greedy_prefix(sections, 8, costs);
        assert_eq!(keys(&kept), ["a"]);
    }

    #[test]
    fn test_greedy_prefix_exact_fit() {
        let sections = vec![weighted("a", 1.0), weighted("b", 1.0)];
        let kept = greedy_prefix(sections, 20, |_| 10);
        assert_eq!(keys(&kept), ["a", "b"]);
    }

    #[test]
    fn test_oversize_first_section_yields_empty() {
        let sections = vec![weighted("huge", 9.0), weighted("tiny", 1.0)];
        let kept = greedy_prefix(sections, 5, |s| if s.key == "huge" { 100 } else { 1 });
        assert!(kept.is_empty());
    }

    #[test]
    fn test_nan_weight_sorts_deterministically() {
        let sections = vec![weighted("a", 1.0), weighted("nan", f64::NAN), weighted("b", 2.0)];
        let first = sort_by_priority(sections.clone());
        let second = sort_by_priority(sections);
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(keys(&first), ["nan", "b", "a"]);
    }

    #[test]
    fn test_signed_zero_weights_tie() {
        let sections = vec![weighted("neg", -0.0), weighted("pos", 0.0), weighted("neg2", -0.0)];
        assert_eq!(keys(&sort_by_priority(sections)), ["neg", "pos", "neg2"]);
    }

    proptest! {
        #[test]
        fn prop_greedy_prefix_within_budget(
            costs in prop::collection::vec(0usize..20, 0..12),
            budget in 0usize..100,
        ) {
            let sections: Vec<Section> = costs
                .iter()
                .enumerate()
                .map(|(i, c)| Section::new(format!("s{}", i), "", "x".repeat(*c)))
                .collect();
            let kept = greedy_prefix(sections.clone(), budget, |s| s.body.len());

            let total: usize = kept.iter().map(|s| s.body.len()).sum();
            prop_assert!(total <= budget);
            // Kept sections are a prefix of the input.
            prop_assert_eq!(&sections[..kept.len()], kept.as_slice());
            // The next section, if any, would have exceeded the budget.
            if let Some(next) = sections.get(kept.len()) {
                prop_assert!(total + next.body.len() > budget);
            }
        }

        #[test]
        fn prop_sort_is_stable(weights in prop::collection::vec(0u8..4, 0..16)) {
            let sections: Vec<Section> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| Section::new(format!("{}", i), "", "").with_weight(f64::from(*w)))
                .collect();
            let sorted = sort_by_priority(sections);

            for pair in sorted.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.effective_weight() >= b.effective_weight());
                if a.effective_weight() == b.effective_weight() {
                    let ia: usize = a.key.parse().unwrap();
                    let ib: usize = b.key.parse().unwrap();
                    prop_assert!(ia < ib);
                }
            }
        }
    }
}
