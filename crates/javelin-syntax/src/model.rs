//! Type and resolution model contract
//!
//! The completion engine never performs type inference itself. Whatever
//! resolution layer the embedder owns answers four questions: which symbols
//! are visible at the cursor, what a named type looks like, whether one type
//! is assignable to another, and which types inherit from a given one.
//! [`InMemoryModel`] answers them from registered definitions and is what the
//! engine's tests run against.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Reference to a type as it appears at a use site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A named type, possibly with type arguments (`List<String>`).
    Named { name: String, args: Vec<TypeRef> },
    /// An array type (`String[]`).
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// The raw type name with type arguments erased; arrays erase to their
    /// element's erasure.
    pub fn erasure(&self) -> &str {
        match self {
            TypeRef::Named { name, .. } => name,
            TypeRef::Array(element) => element.erasure(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class { is_abstract: bool },
    Interface,
    Enum,
    Annotation,
    Primitive,
}

/// Kind of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Field { is_static: bool, is_constant: bool },
    Method { param_count: usize, is_static: bool },
    Constructor { param_count: usize },
}

/// A member of a declared type, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub ty: TypeRef,
}

impl Member {
    pub fn constant(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field {
                is_static: true,
                is_constant: true,
            },
            ty,
        }
    }

    pub fn method(name: impl Into<String>, param_count: usize, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method {
                param_count,
                is_static: false,
            },
            ty,
        }
    }

    pub fn static_method(name: impl Into<String>, param_count: usize, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method {
                param_count,
                is_static: true,
            },
            ty,
        }
    }

    pub fn constructor(param_count: usize, ty: TypeRef) -> Self {
        Self {
            name: String::new(),
            kind: MemberKind::Constructor { param_count },
            ty,
        }
    }
}

/// A declared type known to the resolution model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub members: Vec<Member>,
}

impl TypeDef {
    pub fn is_abstract(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Class { is_abstract: true } | TypeKind::Interface | TypeKind::Annotation
        )
    }

    /// A type that `new` can instantiate directly.
    pub fn is_concrete_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class { is_abstract: false })
    }

    pub fn constants(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| {
            matches!(
                m.kind,
                MemberKind::Field {
                    is_constant: true,
                    ..
                }
            )
        })
    }
}

/// Kind of a visible symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Local,
    Parameter,
    Field,
    Method { param_count: usize },
    Type,
}

/// A symbol visible at the completion position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeRef,
    pub kind: SymbolKind,
    /// Declared in the innermost scope around the cursor. The ranking engine
    /// deliberately disprefers these.
    pub declared_in_current_scope: bool,
}

impl Symbol {
    pub fn local(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: SymbolKind::Local,
            declared_in_current_scope: true,
        }
    }

    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: SymbolKind::Field,
            declared_in_current_scope: false,
        }
    }

    pub fn type_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ty: TypeRef::named(name.clone()),
            name,
            kind: SymbolKind::Type,
            declared_in_current_scope: false,
        }
    }
}

/// Role the expected type plays at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRole {
    ReturnValue,
    Argument(usize),
    AssignmentRhs,
    CastTarget,
    SwitchLabel,
    AnnotationMember,
    InstanceofOperand,
}

/// The externally supplied expected-type information at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTypeContext {
    pub types: Vec<TypeRef>,
    pub role: TypeRole,
}

impl ExpectedTypeContext {
    pub fn single(ty: TypeRef, role: TypeRole) -> Self {
        Self {
            types: vec![ty],
            role,
        }
    }
}

/// Widening conversions between primitive type names, smaller to larger.
const WIDENING: &[(&str, &str)] = &[
    ("byte", "short"),
    ("byte", "int"),
    ("byte", "long"),
    ("byte", "float"),
    ("byte", "double"),
    ("short", "int"),
    ("short", "long"),
    ("short", "float"),
    ("short", "double"),
    ("char", "int"),
    ("char", "long"),
    ("char", "float"),
    ("char", "double"),
    ("int", "long"),
    ("int", "float"),
    ("int", "double"),
    ("long", "float"),
    ("long", "double"),
    ("float", "double"),
];

/// Boxing pairs, primitive name first.
const BOXING: &[(&str, &str)] = &[
    ("boolean", "Boolean"),
    ("byte", "Byte"),
    ("char", "Character"),
    ("short", "Short"),
    ("int", "Integer"),
    ("long", "Long"),
    ("float", "Float"),
    ("double", "Double"),
];

/// Whether `a`/`b` are a boxing pair in either direction.
pub fn is_boxing_pair(a: &str, b: &str) -> bool {
    BOXING
        .iter()
        .any(|&(p, w)| (p == a && w == b) || (p == b && w == a))
}

/// Whether primitive `from` widens to primitive `to`.
pub fn is_widening(from: &str, to: &str) -> bool {
    WIDENING.iter().any(|&(f, t)| f == from && t == to)
}

/// Type/resolution query interface
///
/// Answers are snapshots: the model instance handed to the engine already
/// reflects the scope around the cursor, so `visible_symbols` takes no
/// further qualification. All lookups are synchronous; an unresolvable name
/// is `None`, never an error.
pub trait TypeModel {
    /// Symbols visible at the completion position.
    fn visible_symbols(&self) -> Vec<Symbol>;

    /// Definition of a named type, if the model can resolve it.
    fn type_def(&self, name: &str) -> Option<&TypeDef>;

    /// Expected types at a byte offset, if the resolution layer derived any.
    fn expected_types_at(&self, offset: usize) -> Option<ExpectedTypeContext>;

    /// All known transitive inheritors of a named type, in declaration order.
    fn inheritors_of(&self, name: &str) -> Vec<String>;

    /// Whether members of `type_name` are statically imported (and therefore
    /// usable unqualified).
    fn has_static_import(&self, type_name: &str) -> bool;

    /// Whether a value of type `from` is assignable to `to`, including
    /// identity, widening, boxing, and subtyping.
    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (TypeRef::Array(fe), TypeRef::Array(te)) => self.is_assignable(fe, te),
            (TypeRef::Array(_), TypeRef::Named { name, .. }) => name == "Object",
            (TypeRef::Named { .. }, TypeRef::Array(_)) => false,
            (TypeRef::Named { name: f, args: fa }, TypeRef::Named { name: t, args: ta }) => {
                if f == t {
                    // Same raw type: a raw reference is compatible with any
                    // parameterization, mismatched arguments are not.
                    return fa.is_empty() || ta.is_empty() || fa == ta;
                }
                if is_widening(f, t) || is_boxing_pair(f, t) {
                    return true;
                }
                self.is_subtype_name(f, t)
            }
        }
    }

    /// Whether raw type `from` is a declared subtype of raw type `to`.
    fn is_subtype_name(&self, from: &str, to: &str) -> bool {
        if to == "Object" && self.type_def(from).map(|d| d.kind) != Some(TypeKind::Primitive) {
            return true;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![from.to_string()];
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(def) = self.type_def(&name) else {
                continue;
            };
            if let Some(superclass) = &def.superclass {
                if superclass == to {
                    return true;
                }
                stack.push(superclass.clone());
            }
            for interface in &def.interfaces {
                if interface == to {
                    return true;
                }
                stack.push(interface.clone());
            }
        }
        false
    }

    /// Whether a supertype/subtype relationship exists in either direction
    /// (the precondition for offering a cast).
    fn is_related(&self, a: &TypeRef, b: &TypeRef) -> bool {
        let (ae, be) = (a.erasure(), b.erasure());
        ae == be || self.is_subtype_name(ae, be) || self.is_subtype_name(be, ae)
    }
}

/// In-memory resolution model
///
/// Registered through [`ModelBuilder`]. Type declaration order is preserved
/// so that inheritor and member enumeration stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModel {
    order: Vec<String>,
    types: HashMap<String, TypeDef>,
    symbols: Vec<Symbol>,
    expected: HashMap<usize, ExpectedTypeContext>,
    static_imports: HashSet<String>,
}

impl TypeModel for InMemoryModel {
    fn visible_symbols(&self) -> Vec<Symbol> {
        self.symbols.clone()
    }

    fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    fn expected_types_at(&self, offset: usize) -> Option<ExpectedTypeContext> {
        self.expected.get(&offset).cloned()
    }

    fn inheritors_of(&self, name: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|candidate| candidate.as_str() != name)
            .filter(|candidate| self.is_subtype_name(candidate, name))
            .cloned()
            .collect()
    }

    fn has_static_import(&self, type_name: &str) -> bool {
        self.static_imports.contains(type_name)
    }
}

/// Builder for [`InMemoryModel`]
pub struct ModelBuilder {
    model: InMemoryModel,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            model: InMemoryModel::default(),
        }
    }

    pub fn class(self, name: &str) -> Self {
        self.ty(TypeDef {
            name: name.to_string(),
            kind: TypeKind::Class { is_abstract: false },
            superclass: Some("Object".to_string()),
            interfaces: Vec::new(),
            members: Vec::new(),
        })
    }

    pub fn ty(mut self, def: TypeDef) -> Self {
        self.model.order.push(def.name.clone());
        self.model.types.insert(def.name.clone(), def);
        self
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.model.symbols.push(symbol);
        self
    }

    pub fn expect_at(mut self, offset: usize, context: ExpectedTypeContext) -> Self {
        self.model.expected.insert(offset, context);
        self
    }

    pub fn static_import(mut self, type_name: &str) -> Self {
        self.model.static_imports.insert(type_name.to_string());
        self
    }

    pub fn build(self) -> InMemoryModel {
        self.model
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> InMemoryModel {
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
                members: Vec::new(),
            })
            .build()
    }

    #[test]
    fn test_subtype_assignable() {
        let model = hierarchy();
        assert!(model.is_assignable(&TypeRef::named("Circle"), &TypeRef::named("Shape")));
        assert!(!model.is_assignable(&TypeRef::named("Shape"), &TypeRef::named("Circle")));
    }

    #[test]
    fn test_everything_assignable_to_object() {
        let model = hierarchy();
        assert!(model.is_assignable(&TypeRef::named("Circle"), &TypeRef::named("Object")));
        assert!(model.is_assignable(
            &TypeRef::array_of(TypeRef::named("Circle")),
            &TypeRef::named("Object")
        ));
    }

    #[test]
    fn test_boxing_and_widening() {
        let model = hierarchy();
        assert!(model.is_assignable(&TypeRef::named("int"), &TypeRef::named("Integer")));
        assert!(model.is_assignable(&TypeRef::named("int"), &TypeRef::named("long")));
        assert!(!model.is_assignable(&TypeRef::named("long"), &TypeRef::named("int")));
    }

    #[test]
    fn test_generic_arguments_must_match() {
        let model = hierarchy();
        let list_circle = TypeRef::generic("List", vec![TypeRef::named("Circle")]);
        let list_square = TypeRef::generic("List", vec![TypeRef::named("Square")]);
        let list_raw = TypeRef::named("List");
        assert!(model.is_assignable(&list_circle, &list_circle.clone()));
        assert!(!model.is_assignable(&list_circle, &list_square));
        assert!(model.is_assignable(&list_raw, &list_circle));
    }

    #[test]
    fn test_inheritors_in_declaration_order() {
        let model = hierarchy();
        assert_eq!(model.inheritors_of("Shape"), vec!["Circle", "Square"]);
    }

    #[test]
    fn test_array_covariance() {
        let model = hierarchy();
        assert!(model.is_assignable(
            &TypeRef::array_of(TypeRef::named("Circle")),
            &TypeRef::array_of(TypeRef::named("Shape"))
        ));
    }

    #[test]
    fn test_type_ref_serde_roundtrip() {
        let ty = TypeRef::array_of(TypeRef::generic("List", vec![TypeRef::named("String")]));
        let json = serde_json::to_string(&ty).unwrap();
        let back: TypeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
        assert_eq!(ty.to_string(), "List<String>[]");
    }

    #[test]
    fn test_is_related_both_directions() {
        let model = hierarchy();
        assert!(model.is_related(&TypeRef::named("Shape"), &TypeRef::named("Circle")));
        assert!(model.is_related(&TypeRef::named("Circle"), &TypeRef::named("Shape")));
        assert!(!model.is_related(&TypeRef::named("Circle"), &TypeRef::named("Square")));
    }
}
