//! Human-readable long-form rendering (§4.9) — not used by machine
//! pipelines.

use crate::pack::ContextPack;
use std::fmt::Write as _;

pub fn render_text(pack: &ContextPack) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Context pack ({} tokens used)", pack.budget_used);

    if let Some(stats) = &pack.cache_stats {
        let _ = writeln!(out, "  cache: {} hits, {} misses ({:.0}% hit rate)", stats.hits, stats.misses, stats.hit_rate * 100.0);
    }
    let _ = writeln!(out);

    for slice in &pack.slices {
        let _ = writeln!(out, "## {}", slice.id);
        let _ = writeln!(out, "{}", slice.signature);
        if let Some((start, end)) = slice.lines {
            let _ = writeln!(out, "  lines {start}-{end}, relevance: {}", slice.relevance);
        }
        if let Some(code) = &slice.code {
            let _ = writeln!(out, "\n{code}\n");
        } else {
            let _ = writeln!(out, "  (signature only)\n");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{Candidate, PackBuilder};
    use crate::types::{RelevanceLabel, SymbolId};

    #[test]
    fn includes_budget_and_each_slice_header() {
        let builder = PackBuilder::new();
        let candidates =
            vec![Candidate::new(SymbolId::from_raw("a.py:f"), 1, RelevanceLabel::Depth(0), 0).with_signature("def f()")];
        let pack = builder.build(candidates, None, None);
        let rendered = render_text(&pack);
        assert!(rendered.contains("Context pack"));
        assert!(rendered.contains("## a.py:f"));
    }
}
