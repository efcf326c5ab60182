//! Compression modes for a diff-bearing symbol's extracted code (§4.5
//! "Compression modes"), sharing one 0/1-knapsack block selector.

use crate::language::CFGInfo;
use crate::types::LineRange;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    None,
    TwoStage,
    Blocks,
    ChunkSummary,
}

struct Block {
    text: String,
    start_line: u32,
    end_line: u32,
    score: f64,
}

const CONTROL_FLOW_KEYWORDS: &[&str] = &["if", "for", "while", "return", "try", "switch", "match"];

pub fn compress(
    mode: CompressionMode,
    code: &str,
    symbol_range: LineRange,
    signature: &str,
    diff_lines: &BTreeSet<u32>,
    token_budget: Option<usize>,
    cfg: Option<&CFGInfo>,
) -> String {
    match mode {
        CompressionMode::None => code.to_string(),
        CompressionMode::ChunkSummary => chunk_summary(signature, diff_lines),
        CompressionMode::TwoStage => {
            let blocks = segment_by_indent(code, symbol_range.start);
            render_selected(select_blocks(blocks, diff_lines, token_budget), true)
        }
        CompressionMode::Blocks => {
            let blocks = match cfg.filter(|c| !c.blocks.is_empty()) {
                Some(cfg) => segment_by_cfg(code, symbol_range.start, cfg),
                None => segment_by_indent(code, symbol_range.start),
            };
            render_selected(select_blocks(blocks, diff_lines, token_budget), false)
        }
    }
}

fn chunk_summary(signature: &str, diff_lines: &BTreeSet<u32>) -> String {
    if diff_lines.is_empty() {
        return signature.to_string();
    }
    let lines = diff_lines.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
    format!("{signature}\n# diff lines: {lines}")
}

fn segment_by_indent(code: &str, offset: u32) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    let mut current_indent: Option<usize> = None;
    let mut start_line = offset;

    for (idx, line) in code.lines().enumerate() {
        let line_no = offset + idx as u32;
        let indent = line.len() - line.trim_start().len();
        if line.trim().is_empty() {
            current.push(line);
            continue;
        }
        match current_indent {
            None => {
                current_indent = Some(indent);
                start_line = line_no;
                current.push(line);
            }
            Some(prev) if prev == indent => current.push(line),
            Some(_) => {
                blocks.push(finish_block(&current, start_line, line_no.saturating_sub(1)));
                current = vec![line];
                current_indent = Some(indent);
                start_line = line_no;
            }
        }
    }
    if !current.is_empty() {
        let end = start_line + current.len() as u32 - 1;
        blocks.push(finish_block(&current, start_line, end));
    }
    blocks
}

fn segment_by_cfg(code: &str, offset: u32, cfg: &CFGInfo) -> Vec<Block> {
    let lines: Vec<&str> = code.lines().collect();
    cfg.blocks
        .iter()
        .map(|b| {
            let lo = b.start_line.saturating_sub(offset) as usize;
            let hi = b.end_line.saturating_sub(offset) as usize;
            let text = lines.get(lo..=hi.min(lines.len().saturating_sub(1))).unwrap_or_default().join("\n");
            finish_block(&text.lines().collect::<Vec<_>>(), b.start_line, b.end_line)
        })
        .collect()
}

fn finish_block(lines: &[&str], start_line: u32, end_line: u32) -> Block {
    Block { text: lines.join("\n"), start_line, end_line, score: 0.0 }
}

fn score_block(block: &Block, diff_lines: &BTreeSet<u32>, adjacent_to_diff: bool) -> f64 {
    let overlap = diff_lines.iter().filter(|&&l| l >= block.start_line && l <= block.end_line).count();
    let mut score = overlap as f64 * 10.0;
    if adjacent_to_diff && overlap == 0 {
        score += 3.0;
    }
    score += block.text.lines().filter(|l| {
        let trimmed = l.trim_start();
        CONTROL_FLOW_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw))
    }).count() as f64 * 0.5;
    score
}

/// Keep every diff-bearing block, then fill remaining budget with a 0/1
/// knapsack over the rest, capped at 2 blocks for budgets <=1600 tokens
/// and 3 for <=2500.
fn select_blocks(mut blocks: Vec<Block>, diff_lines: &BTreeSet<u32>, token_budget: Option<usize>) -> Vec<Block> {
    // A block is "adjacent" if its immediate neighbor is diff-bearing.
    let diff_bearing: Vec<bool> = blocks
        .iter()
        .map(|b| diff_lines.iter().any(|&l| l >= b.start_line && l <= b.end_line))
        .collect();
    for i in 0..blocks.len() {
        let adjacent = (i > 0 && diff_bearing[i - 1]) || (i + 1 < blocks.len() && diff_bearing[i + 1]);
        blocks[i].score = score_block(&blocks[i], diff_lines, adjacent);
    }

    let max_extra_blocks = match token_budget {
        Some(b) if b <= 1600 => 2,
        Some(b) if b <= 2500 => 3,
        Some(_) => usize::MAX,
        None => usize::MAX,
    };

    let mut kept_indices: BTreeSet<usize> = BTreeSet::new();
    for (i, is_diff) in diff_bearing.iter().enumerate() {
        if *is_diff {
            kept_indices.insert(i);
        }
    }

    let mut candidates: Vec<usize> =
        (0..blocks.len()).filter(|i| !kept_indices.contains(i)).collect();
    candidates.sort_by(|a, b| blocks[*b].score.partial_cmp(&blocks[*a].score).unwrap_or(std::cmp::Ordering::Equal));
    for idx in candidates.into_iter().take(max_extra_blocks) {
        if blocks[idx].score > 0.0 {
            kept_indices.insert(idx);
        }
    }

    blocks
        .into_iter()
        .enumerate()
        .filter(|(i, _)| kept_indices.contains(i))
        .map(|(_, b)| b)
        .collect()
}

fn render_selected(blocks: Vec<Block>, ellipsis_joiner: bool) -> String {
    if blocks.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let mut last_end: Option<u32> = None;
    for block in &blocks {
        if let Some(prev_end) = last_end {
            if block.start_line > prev_end + 1 {
                if ellipsis_joiner {
                    out.push_str("...\n");
                } else {
                    out.push_str(&format!("# ... ({} lines elided)\n", block.start_line - prev_end - 1));
                }
            }
        }
        out.push_str(&block.text);
        out.push('\n');
        last_end = Some(block.end_line);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_summary_drops_code_and_lists_diff_lines() {
        let diff = BTreeSet::from([3, 4]);
        let summary = chunk_summary("def f()", &diff);
        assert!(summary.contains("def f()"));
        assert!(summary.contains("3,4"));
        assert!(!summary.contains("return"));
    }

    #[test]
    fn two_stage_always_keeps_diff_bearing_blocks() {
        let code = "def f():\n    x = 1\n    if x:\n        return x\n    y = 2\n";
        let diff = BTreeSet::from([3]);
        let result = compress(CompressionMode::TwoStage, code, LineRange::new(1, 5), "def f()", &diff, Some(1600), None);
        assert!(result.contains("if x:"));
    }

    #[test]
    fn none_mode_returns_code_verbatim() {
        let code = "x = 1\n";
        let diff = BTreeSet::new();
        assert_eq!(compress(CompressionMode::None, code, LineRange::new(1, 1), "sig", &diff, None, None), code);
    }
}
