//! Grammar selection and tree-sitter node-kind names for the JS/TS family.
//!
//! Node kind strings match the tree-sitter-typescript grammar exactly; the
//! CFG builder and extractor match on these constants instead of scattering
//! magic strings.

use tree_sitter::Language;

/// File extensions this agent analyzes. Everything else is filtered out by
/// `supports` before any parsing happens.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

pub fn supports_path(path: &str) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Grammar for a path: the TSX grammar for `.tsx`/`.jsx` (JSX syntax), the
/// plain TypeScript grammar for the rest (it is a superset of JS).
pub fn language_for_path(path: &str) -> Option<Language> {
    match extension(path)? {
        "tsx" | "jsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "ts" | "js" | "mjs" | "cjs" => {
            Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        }
        _ => None,
    }
}

fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(ext)
    }
}

pub mod node_kinds {
    // Function-like declarations
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const GENERATOR_FUNCTION_DECLARATION: &str = "generator_function_declaration";
    pub const FUNCTION_EXPRESSION: &str = "function_expression";
    pub const ARROW_FUNCTION: &str = "arrow_function";
    pub const METHOD_DEFINITION: &str = "method_definition";

    // Statements
    pub const STATEMENT_BLOCK: &str = "statement_block";
    pub const IF_STATEMENT: &str = "if_statement";
    pub const ELSE_CLAUSE: &str = "else_clause";
    pub const WHILE_STATEMENT: &str = "while_statement";
    pub const DO_STATEMENT: &str = "do_statement";
    pub const FOR_STATEMENT: &str = "for_statement";
    pub const FOR_IN_STATEMENT: &str = "for_in_statement";
    pub const TRY_STATEMENT: &str = "try_statement";
    pub const CATCH_CLAUSE: &str = "catch_clause";
    pub const FINALLY_CLAUSE: &str = "finally_clause";
    pub const RETURN_STATEMENT: &str = "return_statement";
    pub const THROW_STATEMENT: &str = "throw_statement";
    pub const BREAK_STATEMENT: &str = "break_statement";
    pub const CONTINUE_STATEMENT: &str = "continue_statement";
    pub const SWITCH_STATEMENT: &str = "switch_statement";
    pub const EMPTY_STATEMENT: &str = "empty_statement";
    pub const COMMENT: &str = "comment";

    // Expressions the analyzers care about
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const NEW_EXPRESSION: &str = "new_expression";
    pub const IDENTIFIER: &str = "identifier";
    pub const MEMBER_EXPRESSION: &str = "member_expression";
    pub const VARIABLE_DECLARATOR: &str = "variable_declarator";

    // Fields
    pub const FIELD_NAME: &str = "name";
    pub const FIELD_VALUE: &str = "value";
    pub const FIELD_BODY: &str = "body";
    pub const FIELD_CONDITION: &str = "condition";
    pub const FIELD_CONSEQUENCE: &str = "consequence";
    pub const FIELD_ALTERNATIVE: &str = "alternative";
    pub const FIELD_HANDLER: &str = "handler";
    pub const FIELD_FINALIZER: &str = "finalizer";
    pub const FIELD_FUNCTION: &str = "function";
}
