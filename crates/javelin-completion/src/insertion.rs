//! Selection/insertion protocol
//!
//! Turns an accepted candidate into a single [`TextEdit`]. Tail punctuation
//! and bracket pairing honor the formatting preferences snapshot taken at
//! invocation time, and every rule is idempotent against punctuation that is
//! already present in the buffer: accepting a call candidate in front of an
//! existing `(...)` must not duplicate the parens, and re-accepting the same
//! candidate over its own previous insertion changes nothing but the caret.
use crate::config::FormattingPreferences;
use crate::types::{Candidate, FinalizationMode, TailPolicy, TextEdit};
use tracing::trace;

/// The buffer slice an acceptance operates on
#[derive(Debug, Clone, Copy)]
pub struct InsertionPoint<'a> {
    /// Buffer snapshot.
    pub text: &'a str,
    /// Cursor offset.
    pub offset: usize,
    /// Length of the already-typed prefix ending at the cursor.
    pub prefix_len: usize,
}

/// Produce the edit for accepting `candidate` under `mode`.
pub fn apply(
    candidate: &Candidate,
    mode: FinalizationMode,
    prefs: &FormattingPreferences,
    point: InsertionPoint<'_>,
) -> TextEdit {
    let start = point.offset.saturating_sub(point.prefix_len);
    let mut end = point.offset.min(point.text.len());

    if mode == FinalizationMode::Replace {
        end += reference_run_len(&point.text[end..]);
    }

    let mut new_text = candidate.insertion.clone();
    let mut caret = new_text.len();
    let remainder = &point.text[end..];

    match candidate.tail {
        TailPolicy::None => {}
        TailPolicy::Space => {
            // Absorb an existing separator so re-acceptance does not
            // accumulate whitespace.
            new_text.push(' ');
            if remainder.starts_with(' ') {
                end += 1;
            }
            caret = new_text.len();
        }
        TailPolicy::Comma => {
            if !remainder.trim_start().starts_with(',') {
                new_text.push(',');
            }
            caret = new_text.len();
        }
        TailPolicy::Semicolon => {
            if !remainder.trim_start().starts_with(';') {
                new_text.push(';');
            }
            caret = new_text.len();
        }
        TailPolicy::ParenPair => {
            caret = append_paren_pair(candidate, prefs, remainder, &mut new_text);
        }
        TailPolicy::StatementEnd => {
            caret = new_text.len();
            end = complete_statement(point.text, end, &mut new_text);
            caret = new_text.len().max(caret);
        }
    }

    if mode == FinalizationMode::CompleteStatement
        && candidate.tail != TailPolicy::StatementEnd
    {
        end = complete_statement(point.text, end, &mut new_text);
        caret = new_text.len();
    }

    trace!(start, end, caret, "insertion edit built");
    TextEdit {
        start,
        end,
        new_text,
        caret: start + caret,
    }
}

/// Append a call paren pair, honoring pairing and spacing preferences.
/// Returns the caret position relative to the inserted text.
fn append_paren_pair(
    candidate: &Candidate,
    prefs: &FormattingPreferences,
    remainder: &str,
    new_text: &mut String,
) -> usize {
    // Parens already typed by the user stay; the caret lands before them.
    if remainder.trim_start().starts_with('(') {
        return new_text.len();
    }
    if !prefs.auto_insert_pair_bracket {
        return new_text.len();
    }
    if prefs.space_before_parens {
        new_text.push(' ');
    }
    new_text.push('(');
    let needs_arguments = candidate.param_count.unwrap_or(0) > 0;
    if prefs.space_within_call_parens && needs_arguments {
        new_text.push(' ');
        let caret = new_text.len();
        new_text.push_str(" )");
        return caret;
    }
    if needs_arguments {
        let caret = new_text.len();
        new_text.push(')');
        return caret;
    }
    new_text.push(')');
    new_text.len()
}

/// Absorb the run of closing brackets after the edit, re-emit it, and make
/// sure the statement ends with a terminator. Absorbing keeps the whole
/// operation a single edit and keeps it idempotent.
fn complete_statement(text: &str, mut end: usize, new_text: &mut String) -> usize {
    let remainder = &text[end..];
    let closer_run: String = remainder
        .chars()
        .take_while(|&c| matches!(c, ')' | ']'))
        .collect();
    end += closer_run.len();
    new_text.push_str(&closer_run);
    if !text[end..].trim_start().starts_with(';') {
        new_text.push(';');
    } else {
        // Absorb the existing terminator so the caret still lands past it.
        end += text[end..].len() - text[end..].trim_start().len();
        end += 1;
        new_text.push(';');
    }
    end
}

/// Length of the identifier/dot chain starting at the front of `text`.
fn reference_run_len(text: &str) -> usize {
    text.char_indices()
        .take_while(|&(_, c)| c.is_alphanumeric() || c == '_' || c == '.')
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}
