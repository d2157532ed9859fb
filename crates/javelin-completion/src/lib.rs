//! Context-sensitive completion candidate engine.
//!
//! Given a cursor position inside a partially written program, the engine
//! classifies the grammar site, looks up the keywords legal there, generates
//! expression/literal candidates satisfying the expected type, ranks the
//! merged set with a deterministic multi-key comparator, and finalizes an
//! accepted candidate into a single text edit.
//!
//! The syntax tree and the type/resolution model are external collaborators
//! behind the traits in [`javelin_syntax`]; the engine never parses or
//! infers types itself.
//!
//! ```
//! use javelin_completion::{CompletionEngine, CompletionResponse};
//! use javelin_syntax::{ModelBuilder, NodeKind, TreeBuilder};
//!
//! let mut b = TreeBuilder::new("  ");
//! b.root(NodeKind::SourceFile);
//! let tree = b.build();
//! let model = ModelBuilder::new().build();
//!
//! let engine = CompletionEngine::new();
//! match engine.request_completion(&tree, &model, 1) {
//!     CompletionResponse::Candidates { items, .. } => {
//!         assert_eq!(items[0].display, "package");
//!     }
//!     other => panic!("unexpected response: {other:?}"),
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod engine;
pub mod history;
pub mod insertion;
pub mod keywords;
pub mod ranker;
pub mod smart;
pub mod types;

pub use config::{CaseMode, ConfigFormat, ConfigLoader, FormattingPreferences};
pub use engine::CompletionEngine;
pub use history::{UsageHistory, UsageRecord, UsageStore};
pub use insertion::InsertionPoint;
pub use ranker::RankingInput;
pub use types::{
    Candidate, CandidateKind, CancellationFlag, CompletionError, CompletionResponse,
    CompletionResult, CompletionScope, ContextFlags, ExpressionSource, FinalizationMode,
    GrammarContext, GrammarSite, LiteralKind, Narrowing, TailPolicy, TextEdit,
};
