//! Completion engine façade
//!
//! Composes the classifier, keyword table, smart-type generator and ranking
//! engine into the caller-facing surface: `request_completion` produces the
//! ranked candidate list, `accept` finalizes one candidate into a text edit
//! and records its usage, `cancel_handle` hands out the cooperative
//! cancellation flag. The engine owns no per-request state; everything it
//! assembles for one request dies with that request, except the usage
//! history.
use crate::classifier;
use crate::config::FormattingPreferences;
use crate::history::{UsageHistory, UsageStore};
use crate::insertion::{self, InsertionPoint};
use crate::keywords;
use crate::ranker::{self, RankingInput};
use crate::smart;
use crate::types::{
    Candidate, CancellationFlag, CompletionResponse, CompletionScope, FinalizationMode,
    GrammarSite, Narrowing, TailPolicy, TextEdit,
};
use javelin_syntax::{NodeId, NodeKind, SyntaxPosition, SyntaxTree, TypeModel, TypeRef};
use std::collections::HashMap;
use tracing::debug;

pub struct CompletionEngine {
    prefs: FormattingPreferences,
    history: UsageHistory,
    cancel: CancellationFlag,
}

impl CompletionEngine {
    pub fn new() -> Self {
        Self::with_preferences(FormattingPreferences::default())
    }

    pub fn with_preferences(prefs: FormattingPreferences) -> Self {
        Self {
            prefs,
            history: UsageHistory::new(),
            cancel: CancellationFlag::new(),
        }
    }

    /// Replace the in-memory usage history (e.g. one loaded from disk).
    pub fn with_history(mut self, history: UsageHistory) -> Self {
        self.history = history;
        self
    }

    pub fn preferences(&self) -> &FormattingPreferences {
        &self.prefs
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    /// Flag a caller raises to abandon the in-flight request.
    pub fn cancel_handle(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Run one completion request at `offset`.
    ///
    /// Returns `None` when the position offers no completion, `Cancelled`
    /// when the flag was raised (no state is modified), and otherwise the
    /// ranked candidates with a preselect hint when exactly one unambiguous
    /// candidate remains. A caller superseding a request raises the flag
    /// from [`CompletionEngine::cancel_handle`] and calls
    /// [`CancellationFlag::reset`] before issuing the next request.
    pub fn request_completion(
        &self,
        tree: &dyn SyntaxTree,
        model: &dyn TypeModel,
        offset: usize,
    ) -> CompletionResponse {
        let Some(node) = tree.node_at(offset) else {
            return CompletionResponse::None;
        };
        let position = SyntaxPosition { node, offset };
        let context = classifier::classify(tree, model, position, &self.cancel);
        if self.cancel.is_cancelled() {
            return CompletionResponse::Cancelled;
        }
        if context.site == GrammarSite::NoCompletion {
            return CompletionResponse::None;
        }

        let scope = assemble_scope(tree, model, position);
        let mut candidates = keywords::keywords_for(&context);

        let expected = model.expected_types_at(offset);
        if let Some(expected) = &expected {
            candidates.extend(smart::generate(model, expected, &scope, &self.cancel));
        }
        if self.cancel.is_cancelled() {
            return CompletionResponse::Cancelled;
        }

        // An opening paren already follows the cursor; call candidates must
        // not bring their own pair.
        if context.flags.bracket_present {
            for candidate in &mut candidates {
                if candidate.tail == TailPolicy::ParenPair {
                    candidate.tail = TailPolicy::None;
                }
            }
        }

        let input = RankingInput::new(scope.prefix.clone())
            .with_site(context.site)
            .with_expected(expected.map(|e| e.types).unwrap_or_default())
            .with_usage(self.usage_snapshot(&candidates));
        let items = ranker::rank(candidates, &input, &self.prefs);
        debug!(site = ?context.site, items = items.len(), "completion request served");

        let preselect = items.len() == 1;
        CompletionResponse::Candidates { items, preselect }
    }

    /// Finalize an accepted candidate. The usage counter is incremented
    /// here and only here — cancelled and abandoned requests never touch it.
    pub fn accept(
        &self,
        candidate: &Candidate,
        mode: FinalizationMode,
        point: InsertionPoint<'_>,
    ) -> TextEdit {
        self.history.increment(&candidate.usage_key);
        insertion::apply(candidate, mode, &self.prefs, point)
    }

    fn usage_snapshot(&self, candidates: &[Candidate]) -> HashMap<String, u64> {
        candidates
            .iter()
            .map(|c| (c.usage_key.clone(), self.history.count_of(&c.usage_key)))
            .collect()
    }
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Gather the scope facts the generator and ranker need from the tree.
fn assemble_scope(
    tree: &dyn SyntaxTree,
    _model: &dyn TypeModel,
    position: SyntaxPosition,
) -> CompletionScope {
    let mut scope = CompletionScope {
        prefix: typed_prefix(tree.source(), position.offset),
        ..Default::default()
    };

    let mut chain = vec![position.node];
    chain.extend(tree.ancestors_of(position.node));

    for (i, &node) in chain.iter().enumerate() {
        match tree.kind_of(node) {
            NodeKind::ClassDecl | NodeKind::InterfaceDecl | NodeKind::EnumDecl
                if scope.enclosing_class.is_none() =>
            {
                scope.enclosing_class = tree
                    .child_of_kind(node, NodeKind::Identifier)
                    .map(|id| tree.text_of(id).to_string());
            }
            NodeKind::VariableDecl | NodeKind::FieldDecl if scope.defining_name.is_none() => {
                if let Some(name) = declared_name(tree, node, position.offset) {
                    scope.defining_name = Some(name);
                }
            }
            NodeKind::SwitchBlock => {
                scope.existing_case_labels = case_labels(tree, node);
            }
            NodeKind::CastExpr if scope.already_cast_to.is_none() => {
                scope.already_cast_to = tree
                    .child_of_kind(node, NodeKind::CastType)
                    .map(|t| TypeRef::named(tree.text_of(t).trim()));
            }
            NodeKind::IfStatement => {
                let inner = i.checked_sub(1).and_then(|j| chain.get(j)).copied();
                if let Some(narrowing) = narrowing_from_if(tree, node, inner) {
                    scope.narrowings.push(narrowing);
                }
            }
            _ => {}
        }
    }

    if let Some(defining) = scope.defining_name.clone() {
        collect_aliases(tree, &chain, &defining, &mut scope);
    }

    scope
}

/// Identifier run ending at `offset`.
fn typed_prefix(source: &str, offset: usize) -> String {
    let upto = &source[..offset.min(source.len())];
    let start = upto
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c.is_alphanumeric() || c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(upto.len());
    upto[start..].to_string()
}

/// The name a declaration introduces, but only when the cursor sits in its
/// initializer (to the right of the name).
fn declared_name(tree: &dyn SyntaxTree, decl: NodeId, offset: usize) -> Option<String> {
    let name = tree.child_of_kind(decl, NodeKind::Identifier)?;
    if offset > tree.range_of(name).end {
        Some(tree.text_of(name).to_string())
    } else {
        None
    }
}

fn case_labels(tree: &dyn SyntaxTree, switch_block: NodeId) -> Vec<String> {
    tree.children_of(switch_block)
        .into_iter()
        .filter(|&child| tree.kind_of(child) == NodeKind::CaseLabel)
        .map(|label| {
            tree.text_of(label)
                .trim()
                .trim_start_matches("case")
                .trim_end_matches(':')
                .trim()
                .to_string()
        })
        .filter(|label| !label.is_empty())
        .collect()
}

/// A variable declared from the defining name (directly or through another
/// alias) must also be excluded from its own initializer's suggestions.
fn collect_aliases(
    tree: &dyn SyntaxTree,
    chain: &[NodeId],
    defining: &str,
    scope: &mut CompletionScope,
) {
    let Some(&block) = chain
        .iter()
        .find(|&&node| tree.kind_of(node) == NodeKind::Block)
    else {
        return;
    };
    let declarations: Vec<(String, String)> = tree
        .children_of(block)
        .into_iter()
        .filter(|&child| tree.kind_of(child) == NodeKind::VariableDecl)
        .filter_map(|decl| {
            let name = tree.child_of_kind(decl, NodeKind::Identifier)?;
            let text = tree.text_of(decl);
            let init = text.split_once('=')?.1.trim().trim_end_matches(';').trim();
            Some((tree.text_of(name).to_string(), init.to_string()))
        })
        .collect();

    // Fixpoint over the declaration list: an alias of an alias is excluded.
    let mut changed = true;
    while changed {
        changed = false;
        for (name, init) in &declarations {
            if scope.excluded_names.contains(name) || name == defining {
                continue;
            }
            if init == defining || scope.excluded_names.contains(init) {
                scope.excluded_names.insert(name.clone());
                changed = true;
            }
        }
    }
}

/// Narrowing fact from an enclosing if, if the cursor branch can rely on it.
///
/// The rule is deliberately asymmetric: the then-branch narrows on exactly
/// `x instanceof T`, the else-branch narrows on exactly `!(x instanceof T)`,
/// and any compound condition narrows nothing on either side.
fn narrowing_from_if(
    tree: &dyn SyntaxTree,
    if_stmt: NodeId,
    inner: Option<NodeId>,
) -> Option<Narrowing> {
    let inner = inner?;
    let condition = tree.child_of_kind(if_stmt, NodeKind::Condition)?;
    let text = strip_outer_parens(tree.text_of(condition).trim());
    if text.contains("&&") || text.contains("||") {
        return None;
    }

    match tree.kind_of(inner) {
        NodeKind::ThenBranch => parse_instanceof(text),
        NodeKind::ElseClause => {
            let negated = text.strip_prefix('!')?;
            parse_instanceof(strip_outer_parens(negated.trim()))
        }
        _ => None,
    }
}

fn strip_outer_parens(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
    {
        // Only strip when the parens actually wrap the whole expression.
        let mut depth = 0i32;
        for c in inner.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return trimmed;
                    }
                }
                _ => {}
            }
        }
        return inner.trim();
    }
    trimmed
}

/// Exactly `<identifier> instanceof <identifier>`, nothing more.
fn parse_instanceof(text: &str) -> Option<Narrowing> {
    let (lhs, rhs) = text.split_once(" instanceof ")?;
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    let is_ident = |s: &str| {
        !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
    };
    if is_ident(lhs) && is_ident(rhs) {
        Some(Narrowing {
            symbol: lhs.to_string(),
            ty: TypeRef::named(rhs),
        })
    } else {
        None
    }
}
