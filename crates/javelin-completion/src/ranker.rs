//! Deterministic ranking engine
//!
//! Merged keyword and smart-type candidates pass through one multi-key
//! comparator. Earlier keys dominate; later keys break ties; candidates not
//! distinguished by any key keep their generation order (the sort is
//! stable). Ranking is a pure function of its inputs — usage counts are
//! snapshotted into [`RankingInput`] before the sort so re-running it yields
//! the same sequence.
use crate::config::{CaseMode, FormattingPreferences};
use crate::types::{Candidate, GrammarSite};
use javelin_syntax::TypeRef;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

/// Per-invocation facts the comparator keys on
#[derive(Debug, Clone, Default)]
pub struct RankingInput {
    /// Identifier prefix already typed before the cursor.
    pub prefix: String,
    /// Grammar site; `AfterNew` flips the implementation-preference key.
    pub site: Option<GrammarSite>,
    /// Expected types at the cursor, for the exact-type key.
    pub expected: Vec<TypeRef>,
    /// Usage counts snapshotted from the store at invocation time.
    pub usage: HashMap<String, u64>,
}

impl RankingInput {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_site(mut self, site: GrammarSite) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_expected(mut self, expected: Vec<TypeRef>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_usage(mut self, usage: HashMap<String, u64>) -> Self {
        self.usage = usage;
        self
    }

    fn count_of(&self, key: &str) -> u64 {
        self.usage.get(key).copied().unwrap_or(0)
    }
}

/// How well a candidate's text matches the typed prefix, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CaseMatch {
    Exact,
    Relaxed,
}

/// Rank `candidates` against the typed prefix and preferences.
///
/// Candidates that do not match the prefix even case-insensitively are
/// dropped; everything else is ordered by the comparator chain.
pub fn rank(
    candidates: Vec<Candidate>,
    input: &RankingInput,
    prefs: &FormattingPreferences,
) -> Vec<Candidate> {
    let mut matched: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| matches_prefix_relaxed(&c.display, &input.prefix))
        .collect();

    matched.sort_by(|a, b| compare(a, b, input, prefs));
    trace!(ranked = matched.len(), prefix = %input.prefix, "ranking done");
    matched
}

fn compare(
    a: &Candidate,
    b: &Candidate,
    input: &RankingInput,
    prefs: &FormattingPreferences,
) -> Ordering {
    case_class(a, input, prefs)
        .cmp(&case_class(b, input, prefs))
        .then_with(|| length_and_usage(a, b, input))
        .then_with(|| type_class(a, input).cmp(&type_class(b, input)))
        .then_with(|| param_count(a).cmp(&param_count(b)))
        .then_with(|| a.declared_in_current_scope.cmp(&b.declared_in_current_scope))
        .then_with(|| implementation_class(a, input).cmp(&implementation_class(b, input)))
        .then_with(|| hump_count(&a.display, prefs).cmp(&hump_count(&b.display, prefs)))
}

/// Key 1: case-match class under the configured case mode.
fn case_class(candidate: &Candidate, input: &RankingInput, prefs: &FormattingPreferences) -> CaseMatch {
    let text = &candidate.display;
    let prefix = &input.prefix;
    if prefix.is_empty() {
        return CaseMatch::Exact;
    }
    match prefs.case_sensitivity {
        CaseMode::Insensitive => CaseMatch::Exact,
        CaseMode::Sensitive => {
            if text.starts_with(prefix.as_str()) {
                CaseMatch::Exact
            } else {
                CaseMatch::Relaxed
            }
        }
        CaseMode::FirstLetter => {
            let first_matches = text.chars().next() == prefix.chars().next();
            if first_matches {
                CaseMatch::Exact
            } else {
                CaseMatch::Relaxed
            }
        }
    }
}

/// Key 2: a candidate whose text is a proper prefix of another's always
/// precedes it; among candidates not related by prefix, higher accumulated
/// usage wins.
fn length_and_usage(a: &Candidate, b: &Candidate, input: &RankingInput) -> Ordering {
    let (ta, tb) = (&a.display, &b.display);
    if ta != tb {
        if tb.starts_with(ta.as_str()) {
            return Ordering::Less;
        }
        if ta.starts_with(tb.as_str()) {
            return Ordering::Greater;
        }
    }
    input
        .count_of(&b.usage_key)
        .cmp(&input.count_of(&a.usage_key))
}

/// Key 3: exact expected-type match outranks boxing/widening or untyped.
fn type_class(candidate: &Candidate, input: &RankingInput) -> u8 {
    if candidate.is_expected_default {
        return 0;
    }
    match &candidate.result_type {
        Some(ty) if input.expected.iter().any(|e| e == ty) => 0,
        _ => 1,
    }
}

/// Key 4: among callables rendered identically, fewer required parameters
/// first. Non-callables carry no count and tie at zero.
fn param_count(candidate: &Candidate) -> usize {
    candidate.param_count.unwrap_or(0)
}

/// Key 6: implementations of an offered base type sink below it, except
/// after `new`, where concrete implementations are what the user wants.
fn implementation_class(candidate: &Candidate, input: &RankingInput) -> u8 {
    let promoted = input.site == Some(GrammarSite::AfterNew);
    match (candidate.implementation_of_offered_base, promoted) {
        (true, true) => 0,
        (false, _) => 1,
        (true, false) => 2,
    }
}

/// Key 7: name-segment ("hump") count, fewer first. A configured field
/// prefix is stripped before counting so `m_value` and `value` segment
/// alike.
fn hump_count(text: &str, prefs: &FormattingPreferences) -> usize {
    let stripped = if !prefs.field_name_prefix.is_empty() {
        text.strip_prefix(prefs.field_name_prefix.as_str())
            .unwrap_or(text)
    } else {
        text
    };
    let mut humps = 0;
    let mut prev_boundary = true;
    for c in stripped.chars() {
        if c == '_' || c == '.' {
            prev_boundary = true;
            continue;
        }
        if prev_boundary || c.is_ascii_uppercase() {
            humps += 1;
        }
        prev_boundary = false;
    }
    humps
}

fn matches_prefix_relaxed(text: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    text.len() >= prefix.len()
        && text
            .chars()
            .zip(prefix.chars())
            .all(|(t, p)| t.eq_ignore_ascii_case(&p))
}
