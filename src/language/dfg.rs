//! Language-agnostic data-flow extraction: variable references tagged
//! def/update/use, and the def-use edges between them (§4.1).

use super::cfg::find_function_body;
use super::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarRefKind {
    Def,
    Update,
    Use,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
    pub kind: VarRefKind,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefUseEdge {
    pub def_line: u32,
    pub use_line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DFGInfo {
    pub refs: Vec<VariableRef>,
    pub edges: Vec<DefUseEdge>,
}

pub fn build_dfg(source: &str, function_name: &str, language: Language) -> DFGInfo {
    let Some(body) = find_function_body(source, function_name, language) else {
        return DFGInfo::default();
    };
    let profile = language.grammar_profile();
    let bytes = source.as_bytes();

    let mut refs = Vec::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        let line = node.start_position().row as u32 + 1;

        if profile.assignment_kinds.contains(&kind) {
            if let Some(name) = binding_name(node, bytes) {
                let is_update = node
                    .child_by_field_name("operator")
                    .and_then(|op| op.utf8_text(bytes).ok())
                    .map(|op| op != "=")
                    .unwrap_or(false);
                refs.push(VariableRef {
                    name,
                    kind: if is_update { VarRefKind::Update } else { VarRefKind::Def },
                    line,
                });
            }
        } else if kind == profile.identifier_kind && !is_binding_target(node) {
            if let Ok(name) = node.utf8_text(bytes) {
                refs.push(VariableRef { name: name.to_string(), kind: VarRefKind::Use, line });
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }

    // Earlier reference for a given name wins as the reaching definition
    // of every later use until the next def/update for that name.
    let mut last_def: HashMap<String, u32> = HashMap::new();
    let mut edges = Vec::new();
    refs.sort_by_key(|r| r.line);
    for r in &refs {
        match r.kind {
            VarRefKind::Def | VarRefKind::Update => {
                last_def.insert(r.name.clone(), r.line);
            }
            VarRefKind::Use => {
                if let Some(&def_line) = last_def.get(&r.name) {
                    edges.push(DefUseEdge { def_line, use_line: r.line });
                }
            }
        }
    }

    DFGInfo { refs, edges }
}

fn binding_name(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("name")
        .or_else(|| node.child_by_field_name("left"))
        .or_else(|| node.named_child(0))
        .and_then(|n| n.utf8_text(source).ok())
        .map(|s| s.to_string())
}

/// A direct child of an assignment/declaration's `name`/`left` field is a
/// binding target, not a use; this filter keeps a plain walk from
/// double-counting the identifier on the left of `x = 1` as a use.
fn is_binding_target(node: tree_sitter::Node) -> bool {
    node.parent()
        .and_then(|p| p.child_by_field_name("name").or_else(|| p.child_by_field_name("left")))
        .map(|named| named == node)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_def_use_edge() {
        let dfg = build_dfg("fn f() { let x = 1; let y = x + 1; }", "f", Language::Rust);
        assert!(dfg.refs.iter().any(|r| r.name == "x" && matches!(r.kind, VarRefKind::Def)));
        assert!(dfg.refs.iter().any(|r| r.name == "x" && matches!(r.kind, VarRefKind::Use)));
    }

    #[test]
    fn missing_function_is_empty() {
        let dfg = build_dfg("fn f() {}", "g", Language::Rust);
        assert!(dfg.refs.is_empty());
    }
}
