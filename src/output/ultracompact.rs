//! Token-minimal rendering (§4.9): a path-alias header followed by one
//! line per slice, plus a fenced code block when code is included.

use crate::pack::ContextPack;
use std::collections::HashMap;
use std::fmt::Write as _;

pub fn render_ultracompact(pack: &ContextPack) -> String {
    let mut out = String::new();

    if let Some(stats) = &pack.cache_stats {
        let _ = writeln!(out, "# delta: hits={} misses={} hit_rate={:.2}", stats.hits, stats.misses, stats.hit_rate);
    }

    let mut aliases: HashMap<&str, String> = HashMap::new();
    let mut header = String::new();
    for slice in &pack.slices {
        let rel_path = slice.id.split(':').next().unwrap_or(&slice.id);
        if !aliases.contains_key(rel_path) {
            let alias = format!("P{}", aliases.len());
            if !header.is_empty() {
                header.push(' ');
            }
            let _ = write!(header, "{alias}={rel_path}");
            aliases.insert(rel_path, alias);
        }
    }
    if !header.is_empty() {
        out.push_str(&header);
        out.push('\n');
    }

    let unchanged: std::collections::HashSet<&str> =
        pack.unchanged.as_ref().map(|v| v.iter().map(String::as_str).collect()).unwrap_or_default();

    for slice in &pack.slices {
        let rel_path = slice.id.split(':').next().unwrap_or(&slice.id);
        let qual_name = slice.id.splitn(2, ':').nth(1).unwrap_or(&slice.id);
        let alias = aliases.get(rel_path).cloned().unwrap_or_else(|| rel_path.to_string());
        let lines = slice.lines.map(|(s, e)| format!("@{s}-{e}")).unwrap_or_default();
        let marker = if unchanged.contains(slice.id.as_str()) { " [UNCHANGED]" } else { "" };
        let _ = writeln!(out, "{alias}:{qual_name} {} {lines} [{}]{marker}", slice.signature, slice.relevance);
        if let Some(code) = &slice.code {
            let _ = writeln!(out, "```\n{code}\n```");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{Candidate, PackBuilder};
    use crate::types::{LineRange, RelevanceLabel, SymbolId};

    #[test]
    fn header_assigns_one_alias_per_distinct_file() {
        let builder = PackBuilder::new();
        let candidates = vec![
            Candidate::new(SymbolId::from_raw("a.py:f"), 2, RelevanceLabel::Depth(0), 0).with_signature("def f()"),
            Candidate::new(SymbolId::from_raw("b.py:g"), 1, RelevanceLabel::Depth(1), 1).with_signature("def g()"),
        ];
        let pack = builder.build(candidates, None, None);
        let rendered = render_ultracompact(&pack);
        assert!(rendered.starts_with("P0=a.py P1=b.py"));
    }

    #[test]
    fn includes_fenced_code_block_when_present() {
        let builder = PackBuilder::new();
        let candidates = vec![Candidate::new(SymbolId::from_raw("a.py:f"), 1, RelevanceLabel::Depth(0), 0)
            .with_signature("def f()")
            .with_code("return 1", LineRange::new(1, 1))];
        let pack = builder.build(candidates, None, None);
        let rendered = render_ultracompact(&pack);
        assert!(rendered.contains("```\nreturn 1\n```"));
    }
}
