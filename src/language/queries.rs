//! Tree-sitter query strings driving [`super::generic::extract_module_generic`].
//!
//! Each language contributes one query with up to three capture groups:
//! `@function`/`@function.name`, `@class`/`@class.name` (with an optional
//! `@method`/`@method.name` nested inside), and `@import`. The generic
//! extractor only ever looks at these capture names, never at raw node
//! kinds, which is what keeps it language-agnostic.

use super::Language;

pub fn query_for(language: Language) -> &'static str {
    use Language::*;
    match language {
        Rust => RUST,
        Python => PYTHON,
        JavaScript => JAVASCRIPT,
        TypeScript => JAVASCRIPT,
        Go => GO,
        Java => JAVA,
        Language::C => self::C,
        Cpp => CPP,
        Ruby => RUBY,
        Php => PHP,
        Kotlin => KOTLIN,
        Swift => SWIFT,
        CSharp => CSHARP,
        Scala => SCALA,
        Lua => LUA,
        Elixir => ELIXIR,
    }
}

const RUST: &str = r#"
(function_item name: (identifier) @function.name) @function
(impl_item type: (type_identifier) @class.name body: (declaration_list
  (function_item name: (identifier) @method.name) @method))
(struct_item name: (type_identifier) @class.name) @class
(trait_item name: (type_identifier) @class.name) @class
(use_declaration) @import
"#;

const PYTHON: &str = r#"
(function_definition name: (identifier) @function.name) @function
(class_definition name: (identifier) @class.name body: (block
  (function_definition name: (identifier) @method.name) @method)) @class
(import_statement) @import
(import_from_statement) @import
"#;

const JAVASCRIPT: &str = r#"
(function_declaration name: (identifier) @function.name) @function
(class_declaration name: (_) @class.name body: (class_body
  (method_definition name: (property_identifier) @method.name) @method)) @class
(import_statement) @import
"#;

const GO: &str = r#"
(function_declaration name: (identifier) @function.name) @function
(method_declaration name: (field_identifier) @method.name) @method
(type_declaration (type_spec name: (type_identifier) @class.name)) @class
(import_declaration) @import
"#;

const JAVA: &str = r#"
(class_declaration name: (identifier) @class.name body: (class_body
  (method_declaration name: (identifier) @method.name) @method)) @class
(interface_declaration name: (identifier) @class.name) @class
(import_declaration) @import
"#;

const C: &str = r#"
(function_definition declarator: (function_declarator declarator: (identifier) @function.name)) @function
(struct_specifier name: (type_identifier) @class.name) @class
(preproc_include) @import
"#;

const CPP: &str = r#"
(function_definition declarator: (function_declarator declarator: (identifier) @function.name)) @function
(class_specifier name: (type_identifier) @class.name) @class
(preproc_include) @import
"#;

const RUBY: &str = r#"
(method name: (identifier) @function.name) @function
(class name: (constant) @class.name body: (body_statement
  (method name: (identifier) @method.name) @method)) @class
"#;

const PHP: &str = r#"
(function_definition name: (name) @function.name) @function
(class_declaration name: (name) @class.name body: (declaration_list
  (method_declaration name: (name) @method.name) @method)) @class
(namespace_use_declaration) @import
"#;

const KOTLIN: &str = r#"
(function_declaration (simple_identifier) @function.name) @function
(class_declaration (type_identifier) @class.name) @class
(import_header) @import
"#;

const SWIFT: &str = r#"
(function_declaration name: (simple_identifier) @function.name) @function
(class_declaration name: (type_identifier) @class.name) @class
(import_declaration) @import
"#;

const CSHARP: &str = r#"
(method_declaration name: (identifier) @function.name) @function
(class_declaration name: (identifier) @class.name body: (declaration_list
  (method_declaration name: (identifier) @method.name) @method)) @class
(using_directive) @import
"#;

const SCALA: &str = r#"
(function_definition name: (identifier) @function.name) @function
(class_definition name: (identifier) @class.name) @class
(object_definition name: (identifier) @class.name) @class
(import_declaration) @import
"#;

const LUA: &str = r#"
(function_declaration name: (identifier) @function.name) @function
(function_declaration name: (dot_index_expression) @function.name) @function
"#;

const ELIXIR: &str = r#"
(call target: (identifier) @_kw (arguments (identifier) @function.name)
  (#eq? @_kw "def")) @function
(call target: (identifier) @_kw (arguments (identifier) @function.name)
  (#eq? @_kw "defp")) @function
(call target: (identifier) @_kw (arguments (alias) @class.name)
  (#eq? @_kw "defmodule")) @class
"#;
