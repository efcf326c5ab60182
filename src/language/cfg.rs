//! Language-agnostic control-flow graph extraction (§4.1, §9 design notes).
//!
//! Basic-block splitting only ever consults a [`super::GrammarProfile`]'s
//! `branch_kinds`/`loop_kinds`/`exit_kinds` tables, so this file is the
//! same for every language; only the node-kind strings differ.

use super::Language;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgBlock {
    pub id: usize,
    pub start_line: u32,
    pub end_line: u32,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CFGInfo {
    pub blocks: Vec<CfgBlock>,
    pub edges: Vec<CfgEdge>,
    pub entry: Option<usize>,
    pub exits: Vec<usize>,
}

impl CFGInfo {
    /// `edges - nodes + 2 * components`, with a single component assumed
    /// (a function body is always one connected CFG once built).
    pub fn cyclomatic_complexity(&self) -> i64 {
        if self.blocks.is_empty() {
            return 0;
        }
        self.edges.len() as i64 - self.blocks.len() as i64 + 2
    }
}

pub fn build_cfg(source: &str, function_name: &str, language: Language) -> CFGInfo {
    let Some(body) = find_function_body(source, function_name, language) else {
        return CFGInfo::default();
    };
    let profile = language.grammar_profile();

    let mut blocks = Vec::new();
    let mut edges = Vec::new();
    let mut cursor = body.walk();

    let mut current_start: Option<Node> = None;
    let mut current_end: Option<Node> = None;
    let mut prev_block: Option<usize> = None;
    let mut exits = Vec::new();

    let mut flush = |blocks: &mut Vec<CfgBlock>,
                      edges: &mut Vec<CfgEdge>,
                      prev_block: &mut Option<usize>,
                      start: Node,
                      end: Node,
                      kind: &str| {
        let id = blocks.len();
        blocks.push(CfgBlock {
            id,
            start_line: start.start_position().row as u32 + 1,
            end_line: end.end_position().row as u32 + 1,
            kind: kind.to_string(),
        });
        if let Some(p) = *prev_block {
            edges.push(CfgEdge { from: p, to: id });
        }
        *prev_block = Some(id);
        id
    };

    for child in body.named_children(&mut cursor) {
        let kind = child.kind();
        let is_branch = profile.branch_kinds.contains(&kind) || profile.loop_kinds.contains(&kind);
        let is_exit = profile.exit_kinds.contains(&kind);

        if is_branch || is_exit {
            if let (Some(s), Some(e)) = (current_start.take(), current_end.take()) {
                flush(&mut blocks, &mut edges, &mut prev_block, s, e, "straight_line");
            }
            let id = flush(&mut blocks, &mut edges, &mut prev_block, child, child, kind);
            if is_exit {
                exits.push(id);
                prev_block = None; // unreachable code after an exit starts a new component
            }
        } else {
            if current_start.is_none() {
                current_start = Some(child);
            }
            current_end = Some(child);
        }
    }

    if let (Some(s), Some(e)) = (current_start, current_end) {
        let id = flush(&mut blocks, &mut edges, &mut prev_block, s, e, "straight_line");
        if exits.is_empty() {
            exits.push(id);
        }
    } else if exits.is_empty() {
        if let Some(last) = blocks.last() {
            exits.push(last.id);
        }
    }

    let entry = blocks.first().map(|b| b.id);
    CFGInfo { blocks, edges, entry, exits }
}

/// Parse `source`, find the first function/method node whose extracted
/// name equals the bare tail of `function_name` (callers may pass a
/// qualified `Class.method`), and return its body node.
pub(super) fn find_function_body<'a>(
    source: &'a str,
    function_name: &str,
    language: Language,
) -> Option<Node<'a>> {
    let bare = function_name.rsplit('.').next().unwrap_or(function_name);
    let ts_language = language.tree_sitter_language();
    let mut parser = Parser::new();
    parser.set_language(&ts_language).ok()?;
    // Leak the tree so its borrowed Node can outlive this function; CFG/DFG
    // extraction is a one-shot, short-lived operation per request.
    let tree = Box::leak(Box::new(parser.parse(source, None)?));
    let profile = language.grammar_profile();

    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        let is_fn = profile.function_kinds.contains(&node.kind()) || profile.method_kinds.contains(&node.kind());
        if is_fn {
            if let Some(name_node) = node
                .child_by_field_name("name")
                .or_else(|| find_identifier_child(node, profile.identifier_kind))
            {
                if name_node.utf8_text(source.as_bytes()).ok() == Some(bare) {
                    return node.child_by_field_name("body").or(Some(node));
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    None
}

fn find_identifier_child<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_function_has_single_block() {
        let cfg = build_cfg("fn f() { let x = 1; let y = 2; }", "f", Language::Rust);
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(cfg.edges.len(), 0);
    }

    #[test]
    fn branching_function_has_multiple_blocks() {
        let src = "fn f(x: i32) { if x > 0 { return 1; } return 0; }";
        let cfg = build_cfg(src, "f", Language::Rust);
        assert!(cfg.blocks.len() >= 2);
    }

    #[test]
    fn missing_function_is_empty() {
        let cfg = build_cfg("fn f() {}", "g", Language::Rust);
        assert!(cfg.blocks.is_empty());
        assert_eq!(cfg.cyclomatic_complexity(), 0);
    }
}
