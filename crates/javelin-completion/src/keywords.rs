//! Static keyword table
//!
//! Maps each grammar site to its legal keywords in canonical declaration
//! order. The table always returns the full list for a site; callers that
//! want only a prefix slice it themselves — relative order is never
//! caller-reordered.
use crate::types::{Candidate, GrammarContext, GrammarSite, TailPolicy};

/// File-scope declarations, canonical order.
const FILE_SCOPE: &[&str] = &[
    "package",
    "public",
    "private",
    "import",
    "final",
    "class",
    "interface",
    "abstract",
    "enum",
];

/// Declaration-start position (after an annotation): no `package`/`import`.
const DECLARATION_START: &[&str] = &[
    "public",
    "private",
    "final",
    "class",
    "interface",
    "abstract",
    "enum",
];

/// Inside a type body: file-scope set minus `package`/`import`, plus the
/// member modifiers.
const CLASS_BODY: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "transient",
    "volatile",
    "abstract",
    "class",
    "interface",
    "enum",
];

/// Statement-start control keywords.
const STATEMENT: &[&str] = &[
    "try",
    "while",
    "switch",
    "for",
    "return",
    "throw",
    "assert",
    "synchronized",
];

/// Expression-position keywords; `super`/`this`/`null` are flag-gated.
const EXPRESSION: &[&str] = &["true", "false", "null", "super", "new", "this"];

/// Parameter-list keywords: `final` plus the primitive type names.
const PARAM_LIST: &[&str] = &[
    "final", "boolean", "byte", "char", "short", "int", "float", "long", "double",
];

const AFTER_TRY: &[&str] = &["catch", "finally"];
const AFTER_IF: &[&str] = &["else"];
const SWITCH_CASE: &[&str] = &["case", "default"];
const AFTER_TYPE_NAME: &[&str] = &["extends", "implements", "instanceof"];

fn tail_for(keyword: &str) -> TailPolicy {
    match keyword {
        // Value-position keywords stand on their own.
        "true" | "false" | "null" | "this" | "super" => TailPolicy::None,
        _ => TailPolicy::Space,
    }
}

fn push_all(out: &mut Vec<Candidate>, keywords: &[&str]) {
    for &keyword in keywords {
        out.push(Candidate::keyword(keyword, tail_for(keyword)));
    }
}

/// Legal keywords for a grammar context, in canonical order.
///
/// Context flags narrow the base list: a declared package suppresses
/// `package`, static context suppresses `this`, a shallow superclass chain
/// suppresses `super`, and argument positions suppress `null`.
pub fn keywords_for(context: &GrammarContext) -> Vec<Candidate> {
    let flags = &context.flags;
    let mut out = Vec::new();
    match context.site {
        GrammarSite::FileScope => {
            push_all(&mut out, FILE_SCOPE);
            if flags.package_declared {
                out.retain(|c| c.display != "package");
            }
        }
        GrammarSite::DeclarationStart => push_all(&mut out, DECLARATION_START),
        GrammarSite::ClassBody => {
            push_all(&mut out, CLASS_BODY);
            if flags.in_interface {
                // Interface members are implicitly public.
                out.retain(|c| !matches!(c.display.as_str(), "protected" | "transient" | "volatile"));
            }
        }
        GrammarSite::MethodBody => {
            push_all(&mut out, STATEMENT);
            push_all(&mut out, EXPRESSION);
            out.push(Candidate::keyword("final", TailPolicy::Space));
            if flags.in_static_context {
                out.retain(|c| c.display != "this");
            }
            if !flags.has_deep_super {
                out.retain(|c| c.display != "super");
            }
            if flags.in_argument_position {
                out.retain(|c| c.display != "null" && c.display != "default");
            }
        }
        GrammarSite::MethodParamList => push_all(&mut out, PARAM_LIST),
        GrammarSite::AfterTry | GrammarSite::AfterCatch => push_all(&mut out, AFTER_TRY),
        GrammarSite::AfterIf => push_all(&mut out, AFTER_IF),
        GrammarSite::SwitchCase => push_all(&mut out, SWITCH_CASE),
        GrammarSite::AfterTypeName => push_all(&mut out, AFTER_TYPE_NAME),
        GrammarSite::ExtendsClause
        | GrammarSite::ImplementsClause
        | GrammarSite::TypeParameterList
        | GrammarSite::AfterNew
        | GrammarSite::AnnotationValue
        | GrammarSite::NoCompletion => {}
    }
    out
}
