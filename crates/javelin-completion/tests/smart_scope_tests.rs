//! End-to-end tests of scope assembly feeding the smart-type generator:
//! switch-label exclusion, self-reference exclusion, constructor promotion
//! after `new`.
use javelin_completion::{CompletionEngine, CompletionResponse};
use javelin_syntax::{
    ExpectedTypeContext, Member, ModelBuilder, NodeKind, Symbol, TreeBuilder, TypeDef, TypeKind,
    TypeRef, TypeRole,
};

fn displays(response: &CompletionResponse) -> Vec<String> {
    match response {
        CompletionResponse::Candidates { items, .. } => {
            items.iter().map(|c| c.display.clone()).collect()
        }
        other => panic!("expected candidates, got {other:?}"),
    }
}

#[test]
fn test_switch_labels_skip_existing_arms() {
    let source = "void run() { switch (c) { case RED:  } }";
    let mut b = TreeBuilder::new(source);
    let file = b.root(NodeKind::SourceFile);
    let method = b.child(file, NodeKind::MethodDecl, 0..40);
    let block = b.child(method, NodeKind::Block, 11..40);
    let switch_stmt = b.child(block, NodeKind::SwitchStatement, 13..38);
    let switch_block = b.child(switch_stmt, NodeKind::SwitchBlock, 24..38);
    b.child(switch_block, NodeKind::CaseLabel, 26..35);
    let tree = b.build();
    let offset = 36;

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
    let model = ModelBuilder::new()
        .ty(color)
        .expect_at(
            offset,
            ExpectedTypeContext::single(TypeRef::named("Color"), TypeRole::SwitchLabel),
        )
        .build();
    let engine = CompletionEngine::new();
    let names = displays(&engine.request_completion(&tree, &model, offset));
    // Unused constants outrank the label keywords on exact expected type.
    assert_eq!(names, vec!["GREEN", "BLUE", "case", "default"]);
}

#[test]
fn test_defining_name_excluded_transitively() {
    let source = "void run() { int bbb = aaa; int aaa = a }";
    let mut b = TreeBuilder::new(source);
    let file = b.root(NodeKind::SourceFile);
    let method = b.child(file, NodeKind::MethodDecl, 0..41);
    let block = b.child(method, NodeKind::Block, 11..41);
    let first = b.child(block, NodeKind::VariableDecl, 13..27);
    b.child(first, NodeKind::Identifier, 17..20);
    let second = b.child(block, NodeKind::VariableDecl, 28..39);
    b.child(second, NodeKind::Identifier, 32..35);
    b.child(second, NodeKind::Identifier, 38..39);
    let tree = b.build();
    let offset = 39;

    let int = TypeRef::named("int");
    let model = ModelBuilder::new()
        .symbol(Symbol::local("aaa", int.clone()))
        .symbol(Symbol::local("bbb", int.clone()))
        .expect_at(
            offset,
            ExpectedTypeContext::single(int, TypeRole::AssignmentRhs),
        )
        .build();
    let engine = CompletionEngine::new();
    let names = displays(&engine.request_completion(&tree, &model, offset));
    // `aaa` is being declared; `bbb` was initialized from it.
    assert!(!names.contains(&"aaa".to_string()));
    assert!(!names.contains(&"bbb".to_string()));
}

#[test]
fn test_after_new_promotes_concrete_inheritors() {
    let source = "Shape s = new ";
    let mut b = TreeBuilder::new(source);
    let file = b.root(NodeKind::SourceFile);
    let var = b.child(file, NodeKind::VariableDecl, 0..14);
    b.child(var, NodeKind::Identifier, 6..7);
    b.child(var, NodeKind::NewExpr, 10..14);
    let tree = b.build();
    let offset = 14;

    let model = ModelBuilder::new()
        .ty(TypeDef {
            name: "Shape".to_string(),
            kind: TypeKind::Class { is_abstract: true },
            superclass: None,
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
        .expect_at(
            offset,
            ExpectedTypeContext::single(TypeRef::named("Shape"), TypeRole::AssignmentRhs),
        )
        .build();
    let engine = CompletionEngine::new();
    let names = displays(&engine.request_completion(&tree, &model, offset));
    assert!(names.contains(&"new Circle()".to_string()));
    assert!(!names.contains(&"new Shape()".to_string()));
}
