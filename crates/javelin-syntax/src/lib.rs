//! Javelin syntax and resolution contracts
//!
//! This crate defines the two collaborator interfaces the completion engine
//! consumes and deliberately does not implement itself:
//!
//! 1. **Syntax tree query** ([`SyntaxTree`]): locate the node at an offset,
//!    walk its ancestor chain, and read node text. The engine never parses;
//!    whatever front end owns the buffer supplies the tree.
//! 2. **Type/resolution model** ([`TypeModel`]): visible symbols, type
//!    definitions, assignability, and known inheritors.
//!
//! Both interfaces ship with in-memory implementations ([`ArenaTree`] built
//! through [`TreeBuilder`], [`InMemoryModel`] built through [`ModelBuilder`])
//! so that the engine's tests, and embedders without a real front end, can
//! construct cursor states directly.
//!
//! # Example
//!
//! ```
//! use javelin_syntax::{NodeKind, TreeBuilder};
//!
//! let source = "class Foo {  }";
//! let mut builder = TreeBuilder::new(source);
//! let root = builder.root(NodeKind::SourceFile);
//! let class = builder.child(root, NodeKind::ClassDecl, 0..source.len());
//! builder.child(class, NodeKind::ClassBody, 10..source.len());
//! let tree = builder.build();
//!
//! use javelin_syntax::SyntaxTree;
//! let node = tree.node_at(12).unwrap();
//! assert_eq!(tree.kind_of(node), NodeKind::ClassBody);
//! ```
pub mod model;
pub mod tree;

pub use model::{
    ExpectedTypeContext, InMemoryModel, Member, MemberKind, ModelBuilder, Symbol, SymbolKind,
    TypeDef, TypeKind, TypeModel, TypeRef, TypeRole,
};
pub use tree::{ArenaTree, NodeId, NodeKind, SyntaxPosition, SyntaxTree, TreeBuilder};
