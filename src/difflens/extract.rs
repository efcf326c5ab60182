//! Windowed code extraction around diff lines (§4.5 "Windowed code
//! extraction").

use crate::types::LineRange;
use std::collections::BTreeSet;

/// Pick a context-line count (2-8) from code density: denser code
/// (higher mean line length, heavier indentation) gets a smaller window
/// since each line already carries more information.
pub fn adaptive_context_lines(code: &str, budget_hint: usize) -> u32 {
    let lines: Vec<&str> = code.lines().collect();
    if lines.is_empty() {
        return 2;
    }

    let mean_len = lines.iter().map(|l| l.len()).sum::<usize>() as f64 / lines.len() as f64;
    let indent_ratio = lines.iter().filter(|l| l.starts_with(' ') || l.starts_with('\t')).count() as f64
        / lines.len() as f64;

    let density = (mean_len / 40.0 + indent_ratio).min(2.0);
    let base = 8.0 - density * 3.0;
    let scaled = base * (budget_hint.clamp(1, 8) as f64 / 8.0 + 0.5);
    (scaled.round() as i64).clamp(2, 8) as u32
}

/// Build context windows around each diff line, merge overlaps, clamp
/// to `symbol_range`, and join non-contiguous extracts with `"..."`.
pub fn extract_window(full_code: &str, symbol_range: LineRange, diff_lines: &BTreeSet<u32>, context_lines: u32) -> String {
    let lines: Vec<&str> = full_code.lines().collect();
    if lines.is_empty() || diff_lines.is_empty() {
        return full_code.to_string();
    }

    let mut windows: Vec<(u32, u32)> = diff_lines
        .iter()
        .map(|&l| {
            let start = l.saturating_sub(context_lines).max(symbol_range.start);
            let end = (l + context_lines).min(symbol_range.end);
            (start, end)
        })
        .collect();
    windows.sort();

    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in windows.drain(..) {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    let offset = symbol_range.start;
    let segments: Vec<String> = merged
        .iter()
        .map(|(start, end)| {
            let lo = (*start).saturating_sub(offset) as usize;
            let hi = (*end).saturating_sub(offset) as usize;
            lines.get(lo..=hi.min(lines.len().saturating_sub(1))).unwrap_or_default().join("\n")
        })
        .collect();

    segments.join("\n...\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_diff_line_yields_surrounding_window() {
        let code = (1..=10).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
        let range = LineRange::new(1, 10);
        let diff = BTreeSet::from([5]);
        let window = extract_window(&code, range, &diff, 2);
        assert!(window.contains("line5"));
        assert!(window.contains("line3"));
        assert!(window.contains("line7"));
        assert!(!window.contains("line1\n") || window.starts_with("line1"));
    }

    #[test]
    fn non_adjacent_windows_joined_with_ellipsis() {
        let code = (1..=30).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
        let range = LineRange::new(1, 30);
        let diff = BTreeSet::from([2, 28]);
        let window = extract_window(&code, range, &diff, 1);
        assert!(window.contains("..."));
    }

    #[test]
    fn context_lines_stay_within_two_to_eight() {
        let n = adaptive_context_lines("x = 1\ny = 2\n", 4);
        assert!((2..=8).contains(&n));
    }
}
