//! Position classifier
//!
//! Walks the ancestor chain of the node at the cursor outward and applies a
//! fixed rule table keyed by node kind until a grammar context matches.
//! Classification never fails on partial or malformed syntax: it degrades to
//! the most specific matching context, falls back to `FileScope` at the
//! root, and uses the `NoCompletion` sentinel for positions with no
//! recognizable enclosing construct (inside string literals, comments, or
//! nested error runs). Formatting preferences play no role here;
//! classification and formatting are independent concerns.
use crate::types::{CancellationFlag, ContextFlags, GrammarContext, GrammarSite};
use javelin_syntax::{NodeId, NodeKind, SyntaxPosition, SyntaxTree, TypeModel};
use std::collections::HashSet;
use tracing::trace;

/// Classify the grammar context at `position`.
///
/// The type model is consulted only for the `super` reachability flag (a
/// superclass with at least one accessible further ancestor must exist for
/// `super` to be offered).
pub fn classify(
    tree: &dyn SyntaxTree,
    model: &dyn TypeModel,
    position: SyntaxPosition,
    cancel: &CancellationFlag,
) -> GrammarContext {
    let node = position.node;
    let offset = position.offset;
    let kind = tree.kind_of(node);

    if matches!(
        kind,
        NodeKind::StringLiteral
            | NodeKind::CharLiteral
            | NodeKind::LineComment
            | NodeKind::BlockComment
    ) {
        return GrammarContext::new(GrammarSite::NoCompletion);
    }

    // A nested error run means the token stream around the cursor has no
    // recognizable shape at all.
    if kind == NodeKind::Error {
        if let Some(parent) = tree.parent_of(node) {
            if tree.kind_of(parent) == NodeKind::Error {
                return GrammarContext::new(GrammarSite::NoCompletion);
            }
        }
    }

    let mut chain = vec![node];
    chain.extend(tree.ancestors_of(node));
    let on_chain: HashSet<NodeId> = chain.iter().copied().collect();
    let flags = compute_flags(tree, model, &chain, offset);

    for &current in &chain {
        if cancel.is_cancelled() {
            return GrammarContext::new(GrammarSite::NoCompletion);
        }
        let current_kind = tree.kind_of(current);
        trace!(?current_kind, "classifier ancestor step");
        match current_kind {
            NodeKind::ExtendsList => {
                return GrammarContext::with_flags(GrammarSite::ExtendsClause, flags)
            }
            NodeKind::ImplementsList => {
                return GrammarContext::with_flags(GrammarSite::ImplementsClause, flags)
            }
            // Keyword completion is suppressed entirely in type-parameter
            // and cast-type positions.
            NodeKind::TypeParameterList | NodeKind::CastType => {
                return GrammarContext::with_flags(GrammarSite::TypeParameterList, flags)
            }
            NodeKind::ParameterList => {
                return GrammarContext::with_flags(GrammarSite::MethodParamList, flags)
            }
            NodeKind::ArgumentList => {
                let site = match tree.parent_of(current).map(|p| tree.kind_of(p)) {
                    Some(NodeKind::Annotation) => GrammarSite::AnnotationValue,
                    _ => GrammarSite::MethodBody,
                };
                let mut flags = flags;
                flags.in_argument_position = true;
                return GrammarContext::with_flags(site, flags);
            }
            NodeKind::NewExpr => return GrammarContext::with_flags(GrammarSite::AfterNew, flags),
            NodeKind::SwitchBlock => {
                return GrammarContext::with_flags(GrammarSite::SwitchCase, flags)
            }
            NodeKind::ClassBody | NodeKind::InterfaceBody | NodeKind::EnumBody => {
                return GrammarContext::with_flags(GrammarSite::ClassBody, flags)
            }
            NodeKind::TryStatement => {
                if let Some(site) = try_continuation(tree, current, offset) {
                    return GrammarContext::with_flags(site, flags);
                }
            }
            NodeKind::Block => {
                return GrammarContext::with_flags(
                    classify_statement_start(tree, current, offset, &on_chain),
                    flags,
                )
            }
            NodeKind::ClassDecl | NodeKind::InterfaceDecl | NodeKind::EnumDecl => {
                return GrammarContext::with_flags(
                    classify_type_header(tree, current, offset),
                    flags,
                )
            }
            NodeKind::SourceFile => {
                return GrammarContext::with_flags(
                    classify_file_scope(tree, current, offset, &on_chain),
                    flags,
                )
            }
            _ => {}
        }
    }

    GrammarContext::with_flags(GrammarSite::FileScope, flags)
}

/// Cursor inside a try statement but past its body: the handler-clause
/// position between the body and any clause that follows. `None` when the
/// cursor is still inside the body or a clause (deeper rules decide then).
fn try_continuation(
    tree: &dyn SyntaxTree,
    try_stmt: NodeId,
    offset: usize,
) -> Option<GrammarSite> {
    let body = tree.child_of_kind(try_stmt, NodeKind::Block)?;
    if offset <= tree.range_of(body).end {
        return None;
    }
    let past_catch = tree
        .child_of_kind(try_stmt, NodeKind::CatchClause)
        .is_some_and(|c| offset > tree.range_of(c).end);
    if past_catch {
        Some(GrammarSite::AfterCatch)
    } else {
        Some(GrammarSite::AfterTry)
    }
}

/// Statement-start classification inside a block: the nearest completed
/// left neighbor decides whether we are continuing a `try`/`if` under
/// construction.
fn classify_statement_start(
    tree: &dyn SyntaxTree,
    block: NodeId,
    offset: usize,
    on_chain: &HashSet<NodeId>,
) -> GrammarSite {
    let Some(mut left) = left_neighbor(tree, block, offset, on_chain) else {
        return GrammarSite::MethodBody;
    };
    // Error recovery often wraps the half-typed word; look through it.
    if tree.kind_of(left) == NodeKind::Error {
        match tree.prev_sibling(left) {
            Some(prev) => left = prev,
            None => return GrammarSite::MethodBody,
        }
    }
    match tree.kind_of(left) {
        NodeKind::TryStatement if !tree.has_child_of_kind(left, NodeKind::FinallyClause) => {
            if tree.has_child_of_kind(left, NodeKind::CatchClause) {
                GrammarSite::AfterCatch
            } else {
                GrammarSite::AfterTry
            }
        }
        NodeKind::IfStatement if !tree.has_child_of_kind(left, NodeKind::ElseClause) => {
            GrammarSite::AfterIf
        }
        _ => GrammarSite::MethodBody,
    }
}

/// Inside a type declaration header. After the type's simple name the legal
/// keywords are the clause introducers; before it this is still a
/// declaration-start position.
fn classify_type_header(tree: &dyn SyntaxTree, decl: NodeId, offset: usize) -> GrammarSite {
    if let Some(name) = tree.child_of_kind(decl, NodeKind::Identifier) {
        if offset > tree.range_of(name).end {
            return GrammarSite::AfterTypeName;
        }
    }
    GrammarSite::DeclarationStart
}

/// Top level of the file. Directly after an annotation application only
/// declaration-start keywords remain.
fn classify_file_scope(
    tree: &dyn SyntaxTree,
    file: NodeId,
    offset: usize,
    on_chain: &HashSet<NodeId>,
) -> GrammarSite {
    if let Some(left) = left_neighbor(tree, file, offset, on_chain) {
        if tree.kind_of(left) == NodeKind::Annotation {
            return GrammarSite::DeclarationStart;
        }
    }
    GrammarSite::FileScope
}

/// Last non-trivia child of `container` that ends at or before `offset` and
/// does not lie on the cursor's own ancestor chain.
fn left_neighbor(
    tree: &dyn SyntaxTree,
    container: NodeId,
    offset: usize,
    on_chain: &HashSet<NodeId>,
) -> Option<NodeId> {
    tree.children_of(container)
        .into_iter()
        .filter(|&child| !tree.kind_of(child).is_trivia())
        .filter(|child| !on_chain.contains(child))
        .filter(|&child| tree.range_of(child).end <= offset)
        .last()
}

fn compute_flags(
    tree: &dyn SyntaxTree,
    model: &dyn TypeModel,
    chain: &[NodeId],
    offset: usize,
) -> ContextFlags {
    let mut flags = ContextFlags::default();

    for &node in chain {
        match tree.kind_of(node) {
            NodeKind::SourceFile => {
                flags.package_declared = tree.has_child_of_kind(node, NodeKind::PackageDecl);
            }
            NodeKind::MethodDecl | NodeKind::FieldDecl => {
                if has_modifier(tree, node, "static") {
                    flags.in_static_context = true;
                }
            }
            NodeKind::InterfaceDecl => {
                flags.in_interface = true;
            }
            NodeKind::ClassDecl | NodeKind::EnumDecl => {
                if let Some(name) = tree.child_of_kind(node, NodeKind::Identifier) {
                    let class_name = tree.text_of(name);
                    flags.has_deep_super = model
                        .type_def(class_name)
                        .and_then(|def| def.superclass.as_deref())
                        .is_some_and(|superclass| superclass != "Object");
                }
            }
            _ => {}
        }
    }

    flags.bracket_present = tree.source()[offset.min(tree.source_len())..]
        .trim_start_matches(' ')
        .starts_with('(');

    flags
}

fn has_modifier(tree: &dyn SyntaxTree, decl: NodeId, text: &str) -> bool {
    tree.children_of(decl)
        .into_iter()
        .filter(|&child| tree.kind_of(child) == NodeKind::Modifier)
        .any(|child| tree.text_of(child) == text)
}
