//! Core data contracts of the completion engine
//!
//! Everything here is created fresh per completion invocation and discarded
//! afterwards; only the usage-frequency store (see `history`) survives
//! across invocations.
use javelin_syntax::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Errors the completion subsystem can produce
///
/// Classification misses, unresolvable symbols and cancellation are *not*
/// errors (they degrade to empty results or a distinguished response);
/// what remains is configuration and persistence plumbing.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type CompletionResult<T> = Result<T, CompletionError>;

/// Cooperative cancellation flag shared between the engine and its caller
///
/// The classifier and generator check it between ancestor-walk steps and
/// symbol-model queries; a raised flag turns the in-flight request into a
/// [`CompletionResponse::Cancelled`] without touching persisted state.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arm the flag for a new request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// The grammar site a cursor position classifies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammarSite {
    /// Top level of a source file.
    FileScope,
    /// Declaration-start position (e.g. right after an annotation): type
    /// declaration keywords only, no `package`/`import`.
    DeclarationStart,
    /// Inside a class, interface or enum body.
    ClassBody,
    /// Inside an `extends` clause.
    ExtendsClause,
    /// Inside an `implements` clause.
    ImplementsClause,
    /// Directly after a simple name in a type header, where
    /// `extends`/`implements`/`instanceof` are legal.
    AfterTypeName,
    /// Inside a type-parameter list or a cast type: keyword completion is
    /// suppressed entirely here.
    TypeParameterList,
    /// Inside a method parameter list.
    MethodParamList,
    /// Statement or expression position inside a method body.
    MethodBody,
    /// Directly after a `try` block with no `finally` attached yet.
    AfterTry,
    /// Directly after a `catch` block (more handlers may follow).
    AfterCatch,
    /// Directly after an `if` statement with no `else` branch yet.
    AfterIf,
    /// Directly after the `new` keyword.
    AfterNew,
    /// Label position inside a `switch` block.
    SwitchCase,
    /// Value position inside an annotation application.
    AnnotationValue,
    /// No recognizable construct; keyword and smart-type generation both
    /// short-circuit to empty.
    NoCompletion,
}

/// Auxiliary facts the classifier attaches to a site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    /// Cursor is inside a static method or initializer.
    pub in_static_context: bool,
    /// Enclosing type declaration is an interface.
    pub in_interface: bool,
    /// An opening bracket already follows the cursor.
    pub bracket_present: bool,
    /// The enclosing class has a superclass other than `Object`, so `super`
    /// reaches an accessible further ancestor.
    pub has_deep_super: bool,
    /// The file already has a package declaration.
    pub package_declared: bool,
    /// Cursor sits in an argument position (`default`/`null` suppressed).
    pub in_argument_position: bool,
}

/// Classification result for one completion invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarContext {
    pub site: GrammarSite,
    pub flags: ContextFlags,
}

impl GrammarContext {
    pub fn new(site: GrammarSite) -> Self {
        Self {
            site,
            flags: ContextFlags::default(),
        }
    }

    pub fn with_flags(site: GrammarSite, flags: ContextFlags) -> Self {
        Self { site, flags }
    }
}

/// What punctuation acceptance appends after the candidate text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailPolicy {
    None,
    Space,
    Semicolon,
    Comma,
    /// A call/declaration parenthesis pair; pairing obeys
    /// `auto_insert_pair_bracket`.
    ParenPair,
    /// Statement terminator plus bracket balancing.
    StatementEnd,
}

/// Where an expression candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionSource {
    Variable,
    Field,
    MethodCall,
    Constructor,
    Constant,
    Cast,
    TypeName,
}

/// Kind of literal candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Bool,
    Null,
    EmptyCollection,
    EmptyArray,
}

/// Discriminant of the candidate union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    Keyword,
    Expression(ExpressionSource),
    Literal(LiteralKind),
}

/// One proposed completion entry
///
/// Display and insertion text may differ (`ElementType.FIELD` shown,
/// `FIELD` inserted when statically imported). Ranking attributes ride along
/// so the ranking engine never has to re-derive them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub display: String,
    pub insertion: String,
    pub kind: CandidateKind,
    pub result_type: Option<TypeRef>,
    pub tail: TailPolicy,
    /// Required parameter count for callable candidates.
    pub param_count: Option<usize>,
    /// Declared in the innermost scope; deliberately dispreferred.
    pub declared_in_current_scope: bool,
    /// Concrete implementation of a base type that is itself offered.
    pub implementation_of_offered_base: bool,
    /// Promoted as the recommended default for the expected type.
    pub is_expected_default: bool,
    /// Key under which usage counts accumulate.
    pub usage_key: String,
}

impl Candidate {
    pub fn keyword(text: &str, tail: TailPolicy) -> Self {
        Self {
            display: text.to_string(),
            insertion: text.to_string(),
            kind: CandidateKind::Keyword,
            result_type: None,
            tail,
            param_count: None,
            declared_in_current_scope: false,
            implementation_of_offered_base: false,
            is_expected_default: false,
            usage_key: text.to_string(),
        }
    }

    pub fn expression(text: impl Into<String>, source: ExpressionSource, ty: TypeRef) -> Self {
        let text = text.into();
        Self {
            display: text.clone(),
            insertion: text.clone(),
            kind: CandidateKind::Expression(source),
            result_type: Some(ty),
            tail: TailPolicy::None,
            param_count: None,
            declared_in_current_scope: false,
            implementation_of_offered_base: false,
            is_expected_default: false,
            usage_key: text,
        }
    }

    pub fn literal(text: impl Into<String>, kind: LiteralKind, ty: Option<TypeRef>) -> Self {
        let text = text.into();
        Self {
            display: text.clone(),
            insertion: text.clone(),
            kind: CandidateKind::Literal(kind),
            result_type: ty,
            tail: TailPolicy::None,
            param_count: None,
            declared_in_current_scope: false,
            implementation_of_offered_base: false,
            is_expected_default: false,
            usage_key: text,
        }
    }

    pub fn with_insertion(mut self, insertion: impl Into<String>) -> Self {
        self.insertion = insertion.into();
        self
    }

    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_param_count(mut self, count: usize) -> Self {
        self.param_count = Some(count);
        self
    }

    pub fn local(mut self) -> Self {
        self.declared_in_current_scope = true;
        self
    }

    pub fn implementation(mut self) -> Self {
        self.implementation_of_offered_base = true;
        self
    }

    pub fn expected_default(mut self) -> Self {
        self.is_expected_default = true;
        self
    }
}

/// How much surrounding text acceptance overwrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationMode {
    /// Replace only the already-typed prefix.
    Normal,
    /// Additionally overwrite the following reference-chain run.
    Replace,
    /// Additionally terminate the statement and balance brackets.
    CompleteStatement,
}

/// A single buffer mutation produced by accepting a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Byte range of the buffer being replaced.
    pub start: usize,
    pub end: usize,
    pub new_text: String,
    /// Caret position after the edit, in post-edit coordinates.
    pub caret: usize,
}

impl TextEdit {
    /// Apply the edit to a buffer snapshot (test/debug convenience).
    pub fn apply_to(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.new_text.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.new_text);
        out.push_str(&text[self.end..]);
        out
    }
}

/// Narrowing fact established by an enclosing `instanceof` test
#[derive(Debug, Clone, PartialEq)]
pub struct Narrowing {
    pub symbol: String,
    pub ty: TypeRef,
}

/// Scope facts the engine assembles for the smart-type generator
#[derive(Debug, Clone, Default)]
pub struct CompletionScope {
    /// Identifier prefix already typed before the cursor.
    pub prefix: String,
    /// Simple name of the enclosing type declaration.
    pub enclosing_class: Option<String>,
    /// Name being declared at the cursor (its own initializer must never
    /// suggest it).
    pub defining_name: Option<String>,
    /// Names excluded from suggestion, including transitive aliases of the
    /// defining name.
    pub excluded_names: HashSet<String>,
    /// Labels already present on other `case` arms of the enclosing switch.
    pub existing_case_labels: Vec<String>,
    /// Active instanceof narrowings covering the cursor.
    pub narrowings: Vec<Narrowing>,
    /// Type the expression at the cursor is already explicitly cast to.
    pub already_cast_to: Option<TypeRef>,
}

/// Outcome of a completion request
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResponse {
    /// Ranked candidates; `preselect` signals a sole unambiguous candidate
    /// the embedder may insert without showing a list.
    Candidates {
        items: Vec<Candidate>,
        preselect: bool,
    },
    /// The position offers no completion (NoCompletion context).
    None,
    /// The request was superseded; no state was modified.
    Cancelled,
}
