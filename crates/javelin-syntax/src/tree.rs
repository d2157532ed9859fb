//! Syntax tree query contract and the in-memory arena implementation
//!
//! The completion engine only ever *reads* the tree: it resolves the node at
//! the cursor offset, walks ancestors outward, and inspects node kinds, text
//! and siblings. Parsing, error recovery and incremental updates all belong
//! to the front end that owns the buffer.
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Identifier of a node inside a [`SyntaxTree`]
///
/// Opaque to the engine; only meaningful together with the tree that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

/// Syntactic kind of a node
///
/// The set covers the constructs the completion engine's rule table keys on.
/// Front ends with richer grammars map their own node types onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    SourceFile,
    PackageDecl,
    ImportDecl,
    Annotation,
    Modifier,
    ClassDecl,
    InterfaceDecl,
    EnumDecl,
    AnnotationDecl,
    ClassBody,
    InterfaceBody,
    EnumBody,
    ExtendsList,
    ImplementsList,
    TypeParameterList,
    CastExpr,
    CastType,
    MethodDecl,
    ConstructorDecl,
    ParameterList,
    Parameter,
    FieldDecl,
    VariableDecl,
    Block,
    IfStatement,
    Condition,
    ThenBranch,
    ElseClause,
    TryStatement,
    CatchClause,
    FinallyClause,
    SwitchStatement,
    SwitchBlock,
    CaseLabel,
    SynchronizedStatement,
    ReturnStatement,
    ThrowStatement,
    ExpressionStatement,
    NewExpr,
    MethodCall,
    ArgumentList,
    AssignmentExpr,
    BinaryExpr,
    UnaryExpr,
    InstanceofExpr,
    ParenExpr,
    FieldAccess,
    Identifier,
    TypeName,
    StringLiteral,
    CharLiteral,
    NumberLiteral,
    LineComment,
    BlockComment,
    Whitespace,
    Error,
}

impl NodeKind {
    /// Trivia never hosts completion and is skipped when scanning siblings.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            NodeKind::Whitespace | NodeKind::LineComment | NodeKind::BlockComment
        )
    }
}

/// A cursor position inside a syntax tree
///
/// Created per completion invocation and discarded afterwards. The node is
/// the deepest node containing the offset at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxPosition {
    pub node: NodeId,
    pub offset: usize,
}

/// Read-only syntax tree query interface
///
/// This is the contract the completion engine consumes. `node_at`,
/// `ancestors_of` and `text_of` are the primary operations; the sibling and
/// structure accessors exist because grammar-context classification needs to
/// look sideways (e.g. "is the nearest left sibling a try statement without
/// a finally clause").
pub trait SyntaxTree {
    /// Deepest node whose range contains `offset`, or `None` for an offset
    /// past the end of the source.
    fn node_at(&self, offset: usize) -> Option<NodeId>;

    /// Ancestor chain of `node`, innermost parent first, root last.
    fn ancestors_of(&self, node: NodeId) -> Vec<NodeId>;

    /// Source text covered by `node`.
    fn text_of(&self, node: NodeId) -> &str;

    /// Kind of `node`.
    fn kind_of(&self, node: NodeId) -> NodeKind;

    /// Byte range of `node` in the source.
    fn range_of(&self, node: NodeId) -> Range<usize>;

    /// Parent of `node`, `None` at the root.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Children of `node` in source order.
    fn children_of(&self, node: NodeId) -> Vec<NodeId>;

    /// Nearest preceding sibling of `node`, skipping trivia.
    fn prev_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Source length in bytes.
    fn source_len(&self) -> usize;

    /// Whole source text.
    fn source(&self) -> &str;

    /// First child of `node` with the given kind, if any.
    fn child_of_kind(&self, node: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of(node)
            .into_iter()
            .find(|&c| self.kind_of(c) == kind)
    }

    /// Whether any child of `node` has the given kind.
    fn has_child_of_kind(&self, node: NodeId, kind: NodeKind) -> bool {
        self.child_of_kind(node, kind).is_some()
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    range: Range<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory arena-backed syntax tree
///
/// Nodes are stored flat; structure lives in parent/child indices. Built
/// through [`TreeBuilder`]; immutable afterwards.
#[derive(Debug, Clone)]
pub struct ArenaTree {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
}

impl ArenaTree {
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Root node of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl SyntaxTree for ArenaTree {
    fn node_at(&self, offset: usize) -> Option<NodeId> {
        if offset > self.source.len() {
            return None;
        }
        let mut current = self.root;
        'descend: loop {
            for &child in &self.node(current).children {
                let range = &self.node(child).range;
                if range.start <= offset && offset <= range.end {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    fn ancestors_of(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(node).parent;
        while let Some(id) = current {
            out.push(id);
            current = self.node(id).parent;
        }
        out
    }

    fn text_of(&self, node: NodeId) -> &str {
        let range = self.node(node).range.clone();
        &self.source[range.start.min(self.source.len())..range.end.min(self.source.len())]
    }

    fn kind_of(&self, node: NodeId) -> NodeKind {
        self.node(node).kind
    }

    fn range_of(&self, node: NodeId) -> Range<usize> {
        self.node(node).range.clone()
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|&c| !self.kind_of(c).is_trivia())
    }

    fn source_len(&self) -> usize {
        self.source.len()
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// Builder for [`ArenaTree`]
///
/// Tests and embedders describe the tree top-down with explicit byte ranges.
/// The builder does not validate that child ranges nest inside parents; the
/// front end is trusted the same way a real parser would be.
pub struct TreeBuilder {
    source: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Create the root node spanning the whole source.
    pub fn root(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range: 0..self.source.len(),
            parent: None,
            children: Vec::new(),
        });
        self.root = Some(id);
        id
    }

    /// Append a child with an explicit byte range.
    pub fn child(&mut self, parent: NodeId, kind: NodeKind, range: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// Finish building. Panics if no root was created.
    pub fn build(self) -> ArenaTree {
        let root = self.root.expect("TreeBuilder::root was never called");
        ArenaTree {
            source: self.source,
            nodes: self.nodes,
            root,
        }
    }
}
