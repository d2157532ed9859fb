//! Smart-type candidate generator
//!
//! Searches the visible symbol/type model for expressions, constructors,
//! literals and constants assignable to the expected type at the cursor.
//! Each policy below is independent; unresolvable symbols are skipped, never
//! errors. Output order is generation order — the ranking engine owns the
//! final sequence and relies on this order being stable for tie-breaking.
use crate::types::{
    Candidate, CancellationFlag, CompletionScope, ExpressionSource, LiteralKind, TailPolicy,
};
use javelin_syntax::{
    ExpectedTypeContext, MemberKind, Symbol, SymbolKind, TypeDef, TypeKind, TypeModel, TypeRef,
    TypeRole,
};
use std::collections::HashSet;
use tracing::debug;

/// Dedup key: insertion text, rendered result type, parameter count.
/// Callables rendering identically but differing in arity stay distinct.
type SeenKey = (String, Option<String>, Option<usize>);

/// Raw type names treated as collection interfaces for the empty-value rule.
const COLLECTION_TYPES: &[(&str, &str)] = &[
    ("List", "emptyList"),
    ("Set", "emptySet"),
    ("Map", "emptyMap"),
    ("Collection", "emptyList"),
    ("Iterable", "emptyList"),
];

/// Generate expression/literal candidates satisfying `expected`.
///
/// `scope` carries the facts the engine assembled from the syntax tree:
/// narrowings, exclusions, existing case labels, an already-applied cast.
pub fn generate(
    model: &dyn TypeModel,
    expected: &ExpectedTypeContext,
    scope: &CompletionScope,
    cancel: &CancellationFlag,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut seen: HashSet<SeenKey> = HashSet::new();

    for ty in &expected.types {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        boolean_literals(ty, &mut out, &mut seen);
        if expected.role == TypeRole::SwitchLabel {
            switch_labels(model, ty, scope, &mut out, &mut seen);
            continue;
        }
        constant_members(model, ty, &mut out, &mut seen);
        empty_values(model, ty, &mut out, &mut seen);
        visible_expressions(model, ty, scope, cancel, &mut out, &mut seen);
        constructors(model, ty, cancel, &mut out, &mut seen);
    }

    if cancel.is_cancelled() {
        return Vec::new();
    }
    debug!(candidates = out.len(), role = ?expected.role, "smart-type generation done");
    out
}

/// Deduplicate on [`SeenKey`]. Overloaded callables that render identically
/// but differ in parameter count are deliberate duplicates and pass through;
/// a candidate equal in arity too is a true repeat and is dropped.
fn push_unique(out: &mut Vec<Candidate>, seen: &mut HashSet<SeenKey>, candidate: Candidate) {
    let key = (
        candidate.insertion.clone(),
        candidate.result_type.as_ref().map(|t| t.to_string()),
        candidate.param_count,
    );
    if seen.insert(key) {
        out.push(candidate);
    }
}

/// Boolean expected type offers both literals, alphabetical.
fn boolean_literals(
    ty: &TypeRef,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    if matches!(ty.erasure(), "boolean" | "Boolean") && !ty.is_array() {
        for text in ["false", "true"] {
            push_unique(
                out,
                seen,
                Candidate::literal(text, LiteralKind::Bool, Some(ty.clone())),
            );
        }
    }
}

/// Switch-label position: unqualified enum constants or int constants
/// declared in the target type, minus labels already used on other arms.
fn switch_labels(
    model: &dyn TypeModel,
    ty: &TypeRef,
    scope: &CompletionScope,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    let Some(def) = model.type_def(ty.erasure()) else {
        return;
    };
    if !matches!(def.kind, TypeKind::Enum) && !def.constants().any(|_| true) {
        return;
    }
    for member in def.constants() {
        if scope.existing_case_labels.iter().any(|l| l == &member.name) {
            continue;
        }
        let candidate = Candidate::expression(
            member.name.clone(),
            ExpressionSource::Constant,
            member.ty.clone(),
        )
        .with_tail(TailPolicy::None);
        push_unique(out, seen, candidate);
    }
}

/// Enum / constant-bearing expected type: offer each applicable constant,
/// qualified by the declaring type's simple name unless it is statically
/// imported, in declared member order.
fn constant_members(
    model: &dyn TypeModel,
    ty: &TypeRef,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    let Some(def) = model.type_def(ty.erasure()) else {
        return;
    };
    if !matches!(def.kind, TypeKind::Enum) && !def.constants().any(|_| true) {
        return;
    }
    let imported = model.has_static_import(&def.name);
    for member in def.constants() {
        if !model.is_assignable(&member.ty, ty) {
            continue;
        }
        let qualified = format!("{}.{}", def.name, member.name);
        let mut candidate =
            Candidate::expression(qualified, ExpressionSource::Constant, member.ty.clone());
        if imported {
            candidate = candidate.with_insertion(member.name.clone());
        }
        candidate.usage_key = member.name.clone();
        push_unique(out, seen, candidate);
    }
}

/// Canonical empty values: `Collections.emptyList()` for collection
/// interfaces, `new T[0]` for arrays. A zero-length array construction and a
/// one-element constructor stay distinct entries when both apply.
fn empty_values(
    model: &dyn TypeModel,
    ty: &TypeRef,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    if let TypeRef::Array(element) = ty {
        let text = format!("new {}[0]", element);
        let mut candidate =
            Candidate::expression(text, ExpressionSource::Constructor, ty.clone());
        candidate.usage_key = format!("new {}[]", element.erasure());
        push_unique(out, seen, candidate);
        return;
    }
    if let Some(&(_, factory)) = COLLECTION_TYPES
        .iter()
        .find(|&&(name, _)| name == ty.erasure())
    {
        let imported = model.has_static_import("Collections");
        let display = format!("Collections.{factory}()");
        let mut candidate =
            Candidate::expression(display, ExpressionSource::MethodCall, ty.clone())
                .with_param_count(0);
        if imported {
            candidate = candidate.with_insertion(format!("{factory}()"));
        }
        candidate.usage_key = factory.to_string();
        push_unique(out, seen, candidate);
    }
}

/// Visible symbols assignable to the expected type, with instanceof
/// narrowing and cast insertion applied.
fn visible_expressions(
    model: &dyn TypeModel,
    ty: &TypeRef,
    scope: &CompletionScope,
    cancel: &CancellationFlag,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    for symbol in model.visible_symbols() {
        if cancel.is_cancelled() {
            return;
        }
        if is_excluded(&symbol, scope) {
            continue;
        }
        let effective = narrowed_type(&symbol, scope);
        if model.is_assignable(&effective, ty) {
            push_unique(out, seen, symbol_candidate(&symbol, &effective));
        } else if model.is_related(&effective, ty) {
            cast_candidate(&symbol, ty, scope, out, seen);
        }
    }
}

fn is_excluded(symbol: &Symbol, scope: &CompletionScope) -> bool {
    if scope.defining_name.as_deref() == Some(symbol.name.as_str()) {
        return true;
    }
    scope.excluded_names.contains(&symbol.name)
}

/// An instanceof test covering the cursor upgrades the symbol's apparent
/// type for the duration of the branch.
fn narrowed_type(symbol: &Symbol, scope: &CompletionScope) -> TypeRef {
    scope
        .narrowings
        .iter()
        .find(|n| n.symbol == symbol.name)
        .map(|n| n.ty.clone())
        .unwrap_or_else(|| symbol.ty.clone())
}

fn symbol_candidate(symbol: &Symbol, effective: &TypeRef) -> Candidate {
    let source = match symbol.kind {
        SymbolKind::Local | SymbolKind::Parameter => ExpressionSource::Variable,
        SymbolKind::Field => ExpressionSource::Field,
        SymbolKind::Method { .. } => ExpressionSource::MethodCall,
        SymbolKind::Type => ExpressionSource::TypeName,
    };
    let mut candidate =
        Candidate::expression(symbol.name.clone(), source, effective.clone());
    if let SymbolKind::Method { param_count } = symbol.kind {
        candidate = candidate
            .with_tail(TailPolicy::ParenPair)
            .with_param_count(param_count);
    }
    if symbol.declared_in_current_scope {
        candidate = candidate.local();
    }
    candidate
}

/// Related but not assignable: offer the expression behind a downcast,
/// unless the expression is already explicitly cast to a compatible type.
fn cast_candidate(
    symbol: &Symbol,
    ty: &TypeRef,
    scope: &CompletionScope,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    if matches!(symbol.kind, SymbolKind::Type | SymbolKind::Method { .. }) {
        return;
    }
    if scope.already_cast_to.as_ref() == Some(ty) {
        return;
    }
    let text = format!("(({}) {})", ty, symbol.name);
    let mut candidate = Candidate::expression(text, ExpressionSource::Cast, ty.clone());
    candidate.usage_key = symbol.name.clone();
    if symbol.declared_in_current_scope {
        candidate = candidate.local();
    }
    push_unique(out, seen, candidate);
}

/// Constructor suggestions. An abstract expected type is never offered as a
/// `new` target itself; its known concrete inheritors surface instead,
/// flagged as implementations so the ranking engine can place them.
fn constructors(
    model: &dyn TypeModel,
    ty: &TypeRef,
    cancel: &CancellationFlag,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    if ty.is_array() {
        return;
    }
    let Some(def) = model.type_def(ty.erasure()) else {
        return;
    };
    if matches!(def.kind, TypeKind::Enum | TypeKind::Annotation | TypeKind::Primitive) {
        return;
    }
    if def.is_concrete_class() {
        push_constructors(def, ty, false, out, seen);
        return;
    }
    for inheritor in model.inheritors_of(&def.name) {
        if cancel.is_cancelled() {
            return;
        }
        let Some(inheritor_def) = model.type_def(&inheritor) else {
            continue;
        };
        if inheritor_def.is_concrete_class() {
            push_constructors(
                inheritor_def,
                &TypeRef::named(inheritor_def.name.clone()),
                true,
                out,
                seen,
            );
        }
    }
}

/// One candidate per declared constructor; a type with none still gets the
/// implicit zero-argument form.
fn push_constructors(
    def: &TypeDef,
    result: &TypeRef,
    implementation: bool,
    out: &mut Vec<Candidate>,
    seen: &mut HashSet<SeenKey>,
) {
    let declared: Vec<usize> = def
        .members
        .iter()
        .filter_map(|m| match m.kind {
            MemberKind::Constructor { param_count } => Some(param_count),
            _ => None,
        })
        .collect();
    let param_counts = if declared.is_empty() { vec![0] } else { declared };

    for param_count in param_counts {
        let text = format!("new {}()", def.name);
        let mut candidate =
            Candidate::expression(text, ExpressionSource::Constructor, result.clone())
                .with_tail(TailPolicy::ParenPair)
                .with_param_count(param_count);
        candidate.usage_key = format!("new {}", def.name);
        if implementation {
            candidate = candidate.implementation();
        }
        push_unique(out, seen, candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Narrowing;
    use javelin_syntax::{Member, ModelBuilder};

    fn expect(ty: TypeRef, role: TypeRole) -> ExpectedTypeContext {
        ExpectedTypeContext::single(ty, role)
    }

    fn shapes() -> ModelBuilder {
        ModelBuilder::new()
            .ty(TypeDef {
                name: "Object".to_string(),
                kind: TypeKind::Class { is_abstract: false },
                superclass: None,
                interfaces: Vec::new(),
                members: Vec::new(),
            })
            .ty(TypeDef {
                name: "Shape".to_string(),
                kind: TypeKind::Class { is_abstract: true },
                superclass: Some("Object".to_string()),
                interfaces: Vec::new(),
                members: Vec::new(),
            })
            .ty(TypeDef {
                name: "Circle".to_string(),
                kind: TypeKind::Class { is_abstract: false },
                superclass: Some("Shape".to_string()),
                interfaces: Vec::new(),
                members: Vec::new(),
            })
            .ty(TypeDef {
                name: "Square".to_string(),
                kind: TypeKind::Class { is_abstract: false },
                superclass: Some("Shape".to_string()),
                interfaces: Vec::new(),
                members: vec![Member::constructor(2, TypeRef::named("Square"))],
            })
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.display.as_str()).collect()
    }

    #[test]
    fn test_boolean_literals_alphabetical() {
        let model = ModelBuilder::new().build();
        let out = generate(
            &model,
            &expect(TypeRef::named("boolean"), TypeRole::AssignmentRhs),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert_eq!(texts(&out), vec!["false", "true"]);
    }

    #[test]
    fn test_abstract_type_surfaces_concrete_inheritors() {
        let model = shapes().build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Shape"), TypeRole::AssignmentRhs),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        let names = texts(&out);
        assert!(!names.contains(&"new Shape()"));
        assert!(names.contains(&"new Circle()"));
        assert!(names.contains(&"new Square()"));
        assert!(out
            .iter()
            .filter(|c| c.display.starts_with("new "))
            .all(|c| c.implementation_of_offered_base));
    }

    #[test]
    fn test_concrete_type_offers_itself() {
        let model = shapes().build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Circle"), TypeRole::AssignmentRhs),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert!(texts(&out).contains(&"new Circle()"));
    }

    #[test]
    fn test_declared_constructor_param_count_carried() {
        let model = shapes().build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Square"), TypeRole::AssignmentRhs),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        let square = out.iter().find(|c| c.display == "new Square()").unwrap();
        assert_eq!(square.param_count, Some(2));
    }

    #[test]
    fn test_repeated_expected_type_adds_no_duplicates() {
        let model = shapes()
            .ty(TypeDef {
                name: "Box".to_string(),
                kind: TypeKind::Class { is_abstract: false },
                superclass: Some("Object".to_string()),
                interfaces: Vec::new(),
                members: vec![
                    Member::constructor(1, TypeRef::named("Box")),
                    Member::constructor(3, TypeRef::named("Box")),
                ],
            })
            .build();
        let expected = ExpectedTypeContext {
            types: vec![TypeRef::named("Box"), TypeRef::named("Box")],
            role: TypeRole::AssignmentRhs,
        };
        let out = generate(
            &model,
            &expected,
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        // One entry per declared overload, none repeated for the second
        // occurrence of the same expected type.
        let arities: Vec<Option<usize>> = out
            .iter()
            .filter(|c| c.display == "new Box()")
            .map(|c| c.param_count)
            .collect();
        assert_eq!(arities, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_assignable_symbols_offered() {
        let model = shapes()
            .symbol(Symbol::local("c", TypeRef::named("Circle")))
            .symbol(Symbol::field("name", TypeRef::named("String")))
            .build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Shape"), TypeRole::Argument(0)),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        let names = texts(&out);
        assert!(names.contains(&"c"));
        assert!(!names.contains(&"name"));
    }

    #[test]
    fn test_self_reference_excluded_transitively() {
        let model = shapes()
            .symbol(Symbol::local("c", TypeRef::named("Circle")))
            .symbol(Symbol::local("alias", TypeRef::named("Circle")))
            .build();
        let mut scope = CompletionScope {
            defining_name: Some("c".to_string()),
            ..Default::default()
        };
        scope.excluded_names.insert("alias".to_string());
        let out = generate(
            &model,
            &expect(TypeRef::named("Shape"), TypeRole::AssignmentRhs),
            &scope,
            &CancellationFlag::new(),
        );
        let names = texts(&out);
        assert!(!names.contains(&"c"));
        assert!(!names.contains(&"alias"));
    }

    #[test]
    fn test_narrowed_variable_matches_exactly() {
        let model = shapes()
            .symbol(Symbol::local("s", TypeRef::named("Shape")))
            .build();
        let scope = CompletionScope {
            narrowings: vec![Narrowing {
                symbol: "s".to_string(),
                ty: TypeRef::named("Circle"),
            }],
            ..Default::default()
        };
        let out = generate(
            &model,
            &expect(TypeRef::named("Circle"), TypeRole::Argument(0)),
            &scope,
            &CancellationFlag::new(),
        );
        let s = out.iter().find(|c| c.display == "s").unwrap();
        assert_eq!(s.result_type, Some(TypeRef::named("Circle")));
    }

    #[test]
    fn test_cast_offered_for_related_types() {
        let model = shapes()
            .symbol(Symbol::local("s", TypeRef::named("Shape")))
            .build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Circle"), TypeRole::Argument(0)),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert!(texts(&out).contains(&"((Circle) s)"));
    }

    #[test]
    fn test_no_cast_when_already_cast() {
        let model = shapes()
            .symbol(Symbol::local("s", TypeRef::named("Shape")))
            .build();
        let scope = CompletionScope {
            already_cast_to: Some(TypeRef::named("Circle")),
            ..Default::default()
        };
        let out = generate(
            &model,
            &expect(TypeRef::named("Circle"), TypeRole::Argument(0)),
            &scope,
            &CancellationFlag::new(),
        );
        assert!(!texts(&out).contains(&"((Circle) s)"));
    }

    #[test]
    fn test_no_cast_for_unrelated_types() {
        let model = shapes()
            .symbol(Symbol::local("c", TypeRef::named("Circle")))
            .build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Square"), TypeRole::Argument(0)),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert!(out.iter().all(|c| c.kind
            != crate::types::CandidateKind::Expression(ExpressionSource::Cast)));
    }

    #[test]
    fn test_switch_labels_exclude_existing_arms() {
        let color = TypeDef {
            name: "Color".to_string(),
            kind: TypeKind::Enum,
            superclass: None,
            interfaces: Vec::new(),
            members: vec![
                Member::constant("RED", TypeRef::named("Color")),
                Member::constant("GREEN", TypeRef::named("Color")),
                Member::constant("BLUE", TypeRef::named("Color")),
            ],
        };
        let model = ModelBuilder::new().ty(color).build();
        let scope = CompletionScope {
            existing_case_labels: vec!["GREEN".to_string()],
            ..Default::default()
        };
        let out = generate(
            &model,
            &expect(TypeRef::named("Color"), TypeRole::SwitchLabel),
            &scope,
            &CancellationFlag::new(),
        );
        assert_eq!(texts(&out), vec!["RED", "BLUE"]);
    }

    #[test]
    fn test_enum_constants_qualified_unless_imported() {
        let color = TypeDef {
            name: "Color".to_string(),
            kind: TypeKind::Enum,
            superclass: None,
            interfaces: Vec::new(),
            members: vec![Member::constant("RED", TypeRef::named("Color"))],
        };
        let model = ModelBuilder::new().ty(color.clone()).build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Color"), TypeRole::AnnotationMember),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        let red = out.iter().find(|c| c.display == "Color.RED").unwrap();
        assert_eq!(red.insertion, "Color.RED");

        let model = ModelBuilder::new().ty(color).static_import("Color").build();
        let out = generate(
            &model,
            &expect(TypeRef::named("Color"), TypeRole::AnnotationMember),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        let red = out.iter().find(|c| c.display == "Color.RED").unwrap();
        assert_eq!(red.insertion, "RED");
    }

    #[test]
    fn test_empty_collection_and_array_stay_distinct() {
        let model = ModelBuilder::new().build();
        let list = generate(
            &model,
            &expect(
                TypeRef::generic("List", vec![TypeRef::named("String")]),
                TypeRole::ReturnValue,
            ),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert!(texts(&list).contains(&"Collections.emptyList()"));

        let array = generate(
            &model,
            &expect(
                TypeRef::array_of(TypeRef::named("String")),
                TypeRole::ReturnValue,
            ),
            &CompletionScope::default(),
            &CancellationFlag::new(),
        );
        assert!(texts(&array).contains(&"new String[0]"));
    }

    #[test]
    fn test_cancellation_yields_empty() {
        let model = shapes()
            .symbol(Symbol::local("s", TypeRef::named("Shape")))
            .build();
        let flag = CancellationFlag::new();
        flag.cancel();
        let out = generate(
            &model,
            &expect(TypeRef::named("Shape"), TypeRole::AssignmentRhs),
            &CompletionScope::default(),
            &flag,
        );
        assert!(out.is_empty());
    }
}
