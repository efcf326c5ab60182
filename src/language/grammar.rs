//! Per-language node-kind tables.
//!
//! A [`GrammarProfile`] is the data half of the query-driven adapter: it
//! names the tree-sitter node kinds the generic extractor and the shared
//! CFG/DFG/PDG builders need to recognize for one grammar. Everything
//! else (block splitting, reaching-definitions, slice computation) is
//! shared code that only ever consults these tables.

use super::Language;

#[derive(Debug, Clone, Copy)]
pub struct GrammarProfile {
    pub language: Language,

    /// Node kinds whose body is "a function" for symbol extraction.
    pub function_kinds: &'static [&'static str],
    /// Node kinds whose body is "a method" (function nested in a class/impl/struct body).
    pub method_kinds: &'static [&'static str],
    /// Node kinds representing a class/struct/interface/trait declaration.
    pub class_kinds: &'static [&'static str],
    /// Node kinds representing an import/use/require statement.
    pub import_kinds: &'static [&'static str],
    /// Node kinds representing a call expression.
    pub call_kinds: &'static [&'static str],

    /// Node kinds that open a new CFG basic block (branch/loop headers).
    pub branch_kinds: &'static [&'static str],
    /// Node kinds representing a loop construct.
    pub loop_kinds: &'static [&'static str],
    /// Node kinds representing an early-exit statement (return/break/continue/throw).
    pub exit_kinds: &'static [&'static str],

    /// Node kinds that introduce a variable binding (assignment/declaration).
    pub assignment_kinds: &'static [&'static str],
    /// Node field/child kind used to name the function itself.
    pub identifier_kind: &'static str,
}

static RUST: GrammarProfile = GrammarProfile {
    language: Language::Rust,
    function_kinds: &["function_item"],
    method_kinds: &["function_item"],
    class_kinds: &["struct_item", "enum_item", "trait_item", "impl_item"],
    import_kinds: &["use_declaration"],
    call_kinds: &["call_expression", "macro_invocation"],
    branch_kinds: &["if_expression", "match_expression"],
    loop_kinds: &["for_expression", "while_expression", "loop_expression"],
    exit_kinds: &["return_expression", "break_expression", "continue_expression"],
    assignment_kinds: &["let_declaration"],
    identifier_kind: "identifier",
};

static PYTHON: GrammarProfile = GrammarProfile {
    language: Language::Python,
    function_kinds: &["function_definition"],
    method_kinds: &["function_definition"],
    class_kinds: &["class_definition"],
    import_kinds: &["import_statement", "import_from_statement"],
    call_kinds: &["call"],
    branch_kinds: &["if_statement", "try_statement"],
    loop_kinds: &["for_statement", "while_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "raise_statement"],
    assignment_kinds: &["assignment", "augmented_assignment"],
    identifier_kind: "identifier",
};

static JAVASCRIPT: GrammarProfile = GrammarProfile {
    language: Language::JavaScript,
    function_kinds: &["function_declaration", "function_expression", "arrow_function"],
    method_kinds: &["method_definition"],
    class_kinds: &["class_declaration"],
    import_kinds: &["import_statement"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_statement", "switch_statement", "try_statement"],
    loop_kinds: &["for_statement", "for_in_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "throw_statement"],
    assignment_kinds: &["variable_declarator", "assignment_expression"],
    identifier_kind: "identifier",
};

static TYPESCRIPT: GrammarProfile = GrammarProfile {
    language: Language::TypeScript,
    ..JAVASCRIPT
};

static GO: GrammarProfile = GrammarProfile {
    language: Language::Go,
    function_kinds: &["function_declaration"],
    method_kinds: &["method_declaration"],
    class_kinds: &["type_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_statement", "switch_statement", "select_statement"],
    loop_kinds: &["for_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement"],
    assignment_kinds: &["short_var_declaration", "assignment_statement"],
    identifier_kind: "identifier",
};

static JAVA: GrammarProfile = GrammarProfile {
    language: Language::Java,
    function_kinds: &["method_declaration"],
    method_kinds: &["method_declaration"],
    class_kinds: &["class_declaration", "interface_declaration", "enum_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["method_invocation"],
    branch_kinds: &["if_statement", "switch_expression", "try_statement"],
    loop_kinds: &["for_statement", "enhanced_for_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "throw_statement"],
    assignment_kinds: &["local_variable_declaration", "assignment_expression"],
    identifier_kind: "identifier",
};

static C: GrammarProfile = GrammarProfile {
    language: Language::C,
    function_kinds: &["function_definition"],
    method_kinds: &[],
    class_kinds: &["struct_specifier", "enum_specifier"],
    import_kinds: &["preproc_include"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_statement", "switch_statement"],
    loop_kinds: &["for_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement"],
    assignment_kinds: &["declaration", "assignment_expression"],
    identifier_kind: "identifier",
};

static CPP: GrammarProfile = GrammarProfile {
    language: Language::Cpp,
    function_kinds: &["function_definition"],
    method_kinds: &["function_definition"],
    class_kinds: &["class_specifier", "struct_specifier"],
    import_kinds: &["preproc_include", "using_declaration"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_statement", "switch_statement", "try_statement"],
    loop_kinds: &["for_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "throw_statement"],
    assignment_kinds: &["declaration", "assignment_expression"],
    identifier_kind: "identifier",
};

static RUBY: GrammarProfile = GrammarProfile {
    language: Language::Ruby,
    function_kinds: &["method"],
    method_kinds: &["method"],
    class_kinds: &["class", "module"],
    import_kinds: &["call"], // `require`/`require_relative` surface as bare calls
    call_kinds: &["call", "method_call"],
    branch_kinds: &["if", "unless", "case"],
    loop_kinds: &["for", "while", "until"],
    exit_kinds: &["return", "break", "next"],
    assignment_kinds: &["assignment"],
    identifier_kind: "identifier",
};

static PHP: GrammarProfile = GrammarProfile {
    language: Language::Php,
    function_kinds: &["function_definition"],
    method_kinds: &["method_declaration"],
    class_kinds: &["class_declaration", "interface_declaration"],
    import_kinds: &["namespace_use_declaration"],
    call_kinds: &["function_call_expression", "member_call_expression"],
    branch_kinds: &["if_statement", "switch_statement", "try_statement"],
    loop_kinds: &["for_statement", "foreach_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "throw_statement"],
    assignment_kinds: &["assignment_expression"],
    identifier_kind: "name",
};

static KOTLIN: GrammarProfile = GrammarProfile {
    language: Language::Kotlin,
    function_kinds: &["function_declaration"],
    method_kinds: &["function_declaration"],
    class_kinds: &["class_declaration", "object_declaration"],
    import_kinds: &["import_header"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_expression", "when_expression", "try_expression"],
    loop_kinds: &["for_statement", "while_statement", "do_while_statement"],
    exit_kinds: &["jump_expression"],
    assignment_kinds: &["property_declaration", "assignment"],
    identifier_kind: "simple_identifier",
};

static SWIFT: GrammarProfile = GrammarProfile {
    language: Language::Swift,
    function_kinds: &["function_declaration"],
    method_kinds: &["function_declaration"],
    class_kinds: &["class_declaration", "protocol_declaration", "struct_declaration"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_statement", "switch_statement", "guard_statement"],
    loop_kinds: &["for_statement", "while_statement", "repeat_while_statement"],
    exit_kinds: &["control_transfer_statement"],
    assignment_kinds: &["property_declaration", "assignment"],
    identifier_kind: "simple_identifier",
};

static CSHARP: GrammarProfile = GrammarProfile {
    language: Language::CSharp,
    function_kinds: &["method_declaration", "local_function_statement"],
    method_kinds: &["method_declaration"],
    class_kinds: &["class_declaration", "interface_declaration", "struct_declaration"],
    import_kinds: &["using_directive"],
    call_kinds: &["invocation_expression"],
    branch_kinds: &["if_statement", "switch_statement", "try_statement"],
    loop_kinds: &["for_statement", "foreach_statement", "while_statement", "do_statement"],
    exit_kinds: &["return_statement", "break_statement", "continue_statement", "throw_statement"],
    assignment_kinds: &["variable_declaration", "assignment_expression"],
    identifier_kind: "identifier",
};

static SCALA: GrammarProfile = GrammarProfile {
    language: Language::Scala,
    function_kinds: &["function_definition"],
    method_kinds: &["function_definition"],
    class_kinds: &["class_definition", "object_definition", "trait_definition"],
    import_kinds: &["import_declaration"],
    call_kinds: &["call_expression"],
    branch_kinds: &["if_expression", "match_expression", "try_expression"],
    loop_kinds: &["for_expression", "while_expression"],
    exit_kinds: &["return_expression"],
    assignment_kinds: &["val_definition", "var_definition"],
    identifier_kind: "identifier",
};

static LUA: GrammarProfile = GrammarProfile {
    language: Language::Lua,
    function_kinds: &["function_declaration", "function_definition"],
    method_kinds: &["function_declaration"],
    class_kinds: &[], // Lua has no native class node; table constructors stand in
    import_kinds: &["function_call"], // `require(...)`
    call_kinds: &["function_call"],
    branch_kinds: &["if_statement"],
    loop_kinds: &["for_statement", "while_statement", "repeat_statement"],
    exit_kinds: &["return_statement", "break_statement"],
    assignment_kinds: &["assignment_statement", "local_variable_declaration"],
    identifier_kind: "identifier",
};

static ELIXIR: GrammarProfile = GrammarProfile {
    language: Language::Elixir,
    function_kinds: &["call"], // `def`/`defp` parse as calls in tree-sitter-elixir
    method_kinds: &["call"],
    class_kinds: &["call"], // `defmodule` likewise
    import_kinds: &["call"], // `import`/`alias`/`use`/`require`
    call_kinds: &["call"],
    branch_kinds: &["if", "case", "cond"],
    loop_kinds: &[], // Elixir has no imperative loop construct
    exit_kinds: &[],
    assignment_kinds: &["binary_operator"],
    identifier_kind: "identifier",
};

pub fn profile_for(language: Language) -> &'static GrammarProfile {
    use Language::*;
    match language {
        Rust => &RUST,
        Python => &PYTHON,
        JavaScript => &JAVASCRIPT,
        TypeScript => &TYPESCRIPT,
        Go => &GO,
        Java => &JAVA,
        Language::C => &self::C,
        Cpp => &CPP,
        Ruby => &RUBY,
        Php => &PHP,
        Kotlin => &KOTLIN,
        Swift => &SWIFT,
        CSharp => &CSHARP,
        Scala => &SCALA,
        Lua => &LUA,
        Elixir => &ELIXIR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_resolves_a_profile() {
        for lang in Language::all() {
            let profile = profile_for(*lang);
            assert_eq!(profile.language, *lang);
        }
    }
}
