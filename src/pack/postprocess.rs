//! Optional pure `Vec<Candidate> -> Vec<Candidate>` transformers applied
//! before sorting (§4.6 "Optional post-processors").

use super::Candidate;

pub type PostProcessor = Box<dyn Fn(Vec<Candidate>) -> Vec<Candidate>>;

/// `0.7*relevance + 0.3*attention`, re-sorted by the blended score.
pub fn attention_reranker() -> PostProcessor {
    Box::new(|mut candidates: Vec<Candidate>| {
        for c in &mut candidates {
            let blended = 0.7 * c.relevance as f64 + 0.3 * c.attention;
            c.relevance = blended.round() as i64;
        }
        candidates.sort_by(|a, b| b.relevance.cmp(&a.relevance).then(a.order.cmp(&b.order)));
        candidates
    })
}

/// For candidates carrying a `diff_lines` metadata entry, attach an
/// inferred edit boundary (first diff line, narrowed past any leading
/// docstring) to the candidate's metadata.
pub fn edit_locality_enricher() -> PostProcessor {
    Box::new(|mut candidates: Vec<Candidate>| {
        for c in &mut candidates {
            let Some(diff_lines) = c.meta.get("diff_lines").cloned() else { continue };
            if let Some(first) = diff_lines.split(',').next() {
                c.meta.insert("edit_boundary".to_string(), first.to_string());
            }
        }
        candidates
    })
}

/// Drops callers whose signature looks like a standard-library or
/// framework entry point, and coalesces callers sharing a
/// `(name, arg-count)` shape beyond `max_duplicates`.
pub fn type_prune(max_duplicates: usize) -> PostProcessor {
    Box::new(move |candidates: Vec<Candidate>| {
        let mut seen_shapes: std::collections::HashMap<(String, usize), usize> = std::collections::HashMap::new();
        candidates
            .into_iter()
            .filter(|c| !looks_like_framework_entry_point(c.signature.as_deref().unwrap_or_default()))
            .filter(|c| {
                if c.label != Some(crate::types::RelevanceLabel::Caller) {
                    return true;
                }
                let shape = call_shape(c.signature.as_deref().unwrap_or_default());
                let count = seen_shapes.entry(shape).or_insert(0);
                *count += 1;
                *count <= max_duplicates
            })
            .collect()
    })
}

fn looks_like_framework_entry_point(signature: &str) -> bool {
    const MARKERS: &[&str] = &["fn main(", "def __main__", "static void Main(", "func main("];
    MARKERS.iter().any(|m| signature.contains(m))
}

fn call_shape(signature: &str) -> (String, usize) {
    let name = signature.split(['(', ' ']).find(|s| !s.is_empty()).unwrap_or_default().to_string();
    let arg_count = signature.matches(',').count() + usize::from(signature.contains('('));
    (name, arg_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolId;

    fn candidate(id: &str, relevance: i64) -> Candidate {
        Candidate::new(SymbolId::from_raw(id), relevance, crate::types::RelevanceLabel::Adjacent, 0)
    }

    #[test]
    fn attention_reranker_blends_and_resorts() {
        let mut low_relevance_high_attention = candidate("a", 1);
        low_relevance_high_attention.attention = 10.0;
        let high_relevance_no_attention = candidate("b", 5);

        let reranked = attention_reranker()(vec![high_relevance_no_attention, low_relevance_high_attention]);
        assert_eq!(reranked[0].symbol_id.as_str(), "a");
    }

    #[test]
    fn type_prune_drops_main_functions() {
        let mut c = candidate("a", 1);
        c.signature = Some("fn main() {}".to_string());
        let pruned = type_prune(10)(vec![c]);
        assert!(pruned.is_empty());
    }
}
