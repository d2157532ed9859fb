//! Property-based tests for the ranking engine: purity, shuffle
//! invariance, prefix filtering and the dispreference laws.
use javelin_completion::{
    Candidate, ExpressionSource, FormattingPreferences, RankingInput, TailPolicy,
};
use javelin_completion::ranker::rank;
use javelin_syntax::TypeRef;
use itertools::Itertools;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn kw(text: &str) -> Candidate {
    Candidate::keyword(text, TailPolicy::None)
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}"
}

/// Same-length distinct labels can never be prefixes of one another, which
/// keeps the usage key fully decisive for the shuffle property below.
fn same_length_labels() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::hash_set("[a-z]{6}", 2..12)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
}

proptest! {
    /// Ranking is a pure function: identical inputs give identical output.
    #[test]
    fn prop_rank_is_deterministic(
        labels in proptest::collection::vec(label_strategy(), 1..20),
        prefix in "[a-z]{0,3}",
    ) {
        let candidates: Vec<Candidate> = labels.iter().map(|l| kw(l)).collect();
        let input = RankingInput::new(prefix);
        let prefs = FormattingPreferences::default();
        let first = rank(candidates.clone(), &input, &prefs);
        let second = rank(candidates, &input, &prefs);
        prop_assert_eq!(first, second);
    }

    /// With every pair of candidates distinguished by usage count, the
    /// ranked output does not depend on input order at all.
    #[test]
    fn prop_shuffled_input_ranks_identically(
        labels in same_length_labels().prop_shuffle(),
    ) {
        let mut sorted = labels.clone();
        sorted.sort();
        let usage: HashMap<String, u64> = sorted
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i as u64 + 1))
            .collect();
        let input = RankingInput::new("").with_usage(usage);
        let prefs = FormattingPreferences::default();

        let from_sorted: Vec<String> = rank(
            sorted.iter().map(|l| kw(l)).collect(),
            &input,
            &prefs,
        )
        .into_iter()
        .map(|c| c.display)
        .collect();
        let from_shuffled: Vec<String> = rank(
            labels.iter().map(|l| kw(l)).collect(),
            &input,
            &prefs,
        )
        .into_iter()
        .map(|c| c.display)
        .collect();
        prop_assert_eq!(from_sorted, from_shuffled);
    }

    /// Every ranked candidate matches the typed prefix at least
    /// case-insensitively; nothing else survives.
    #[test]
    fn prop_only_prefix_matches_survive(
        labels in proptest::collection::vec(label_strategy(), 0..20),
        prefix in "[a-z]{1,4}",
    ) {
        let candidates: Vec<Candidate> = labels.iter().map(|l| kw(l)).collect();
        let input = RankingInput::new(prefix.clone());
        let prefs = FormattingPreferences::default();
        for candidate in rank(candidates, &input, &prefs) {
            prop_assert!(
                candidate.display.to_lowercase().starts_with(&prefix),
                "{} does not match prefix {}",
                candidate.display,
                prefix
            );
        }
    }

    /// With no prefix relations in play, usage counts order the output in
    /// strictly descending runs.
    #[test]
    fn prop_usage_orders_unrelated_candidates(
        labels in same_length_labels(),
    ) {
        let usage: HashMap<String, u64> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), (i as u64 + 1) * 3))
            .collect();
        let input = RankingInput::new("").with_usage(usage.clone());
        let prefs = FormattingPreferences::default();
        let ranked = rank(labels.iter().map(|l| kw(l)).collect(), &input, &prefs);
        for (a, b) in ranked.iter().tuple_windows() {
            prop_assert!(usage[&a.display] > usage[&b.display]);
        }
    }

    /// Ranking never invents or drops matching candidates.
    #[test]
    fn prop_rank_preserves_matching_set(
        labels in proptest::collection::hash_set(label_strategy(), 1..20),
    ) {
        let candidates: Vec<Candidate> = labels.iter().map(|l| kw(l)).collect();
        let input = RankingInput::new("");
        let prefs = FormattingPreferences::default();
        let ranked: HashSet<String> = rank(candidates, &input, &prefs)
            .into_iter()
            .map(|c| c.display)
            .collect();
        prop_assert_eq!(ranked, labels);
    }
}

#[test]
fn test_dispreference_law_local_after_longer_field() {
    let ty = TypeRef::named("String");
    let local = Candidate::expression("aaa", ExpressionSource::Variable, ty.clone()).local();
    let field = Candidate::expression("aabbb", ExpressionSource::Field, ty);
    let input = RankingInput::new("aa");
    let prefs = FormattingPreferences::default();

    // Both presentation orders agree: the local sinks below the field.
    for candidates in [
        vec![local.clone(), field.clone()],
        vec![field.clone(), local.clone()],
    ] {
        let ranked = rank(candidates, &input, &prefs);
        assert_eq!(ranked[0].display, "aabbb");
        assert_eq!(ranked[1].display, "aaa");
    }
}

#[test]
fn test_overload_duplicates_keep_stable_order() {
    let ty = TypeRef::named("Square");
    let three = Candidate::expression("new Square()", ExpressionSource::Constructor, ty.clone())
        .with_param_count(3);
    let one = Candidate::expression("new Square()", ExpressionSource::Constructor, ty)
        .with_param_count(1);
    let input = RankingInput::new("");
    let prefs = FormattingPreferences::default();
    let ranked = rank(vec![three, one], &input, &prefs);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].param_count, Some(1));
    assert_eq!(ranked[1].param_count, Some(3));
}
