//! Turn a candidate list into a [`ContextPack`], honoring an optional
//! token budget (§4.6).

mod postprocess;
mod tokenizer;
mod zoom;

pub use postprocess::{attention_reranker, edit_locality_enricher, type_prune, PostProcessor};
pub use zoom::{render_zoom, ZoomLevel};

use crate::delivery::delta::DeltaResult;
use crate::types::{LineRange, RelevanceLabel, SymbolId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Pack builder input: a candidate symbol with a precomputed relevance
/// score and optional pre-fetched signature/code (§3 Candidate).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub symbol_id: SymbolId,
    pub relevance: i64,
    pub label: Option<RelevanceLabel>,
    pub order: usize,
    pub signature: Option<String>,
    pub code: Option<String>,
    pub lines: Option<LineRange>,
    pub meta: HashMap<String, String>,
    /// Historical attention score consumed by the attention reranker.
    pub attention: f64,
}

impl Candidate {
    pub fn new(symbol_id: SymbolId, relevance: i64, label: RelevanceLabel, order: usize) -> Self {
        Self {
            symbol_id,
            relevance,
            label: Some(label),
            order,
            signature: None,
            code: None,
            lines: None,
            meta: HashMap::new(),
            attention: 0.0,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>, lines: LineRange) -> Self {
        self.code = Some(code.into());
        self.lines = Some(lines);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSlice {
    pub id: String,
    pub signature: String,
    pub code: Option<String>,
    pub lines: Option<(u32, u32)>,
    pub relevance: String,
    #[serde(flatten)]
    pub meta: HashMap<String, String>,
    pub etag: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextPack {
    pub slices: Vec<ContextSlice>,
    pub budget_used: usize,
    pub unchanged: Option<Vec<String>>,
    pub rehydrate: Option<HashMap<String, String>>,
    pub cache_stats: Option<CacheStats>,
}

pub fn compute_etag(signature: &str, code: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    match code {
        Some(code) => hasher.update(format!("{signature}\n{code}")),
        None => hasher.update(signature),
    }
    format!("{:x}", hasher.finalize())
}

pub struct PackBuilder {
    post_processors: Vec<PostProcessor>,
}

impl Default for PackBuilder {
    fn default() -> Self {
        Self { post_processors: Vec::new() }
    }
}

impl PackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post_processor(mut self, p: PostProcessor) -> Self {
        self.post_processors.push(p);
        self
    }

    /// Build a pack from `candidates`, honoring `budget` tokens. When
    /// `delta` is present, symbols in `delta.unchanged` are forced to
    /// signature-only and recorded into `pack.unchanged` (§4.6 "Delta
    /// mode").
    pub fn build(&self, mut candidates: Vec<Candidate>, budget: Option<usize>, delta: Option<&DeltaResult>) -> ContextPack {
        for post_processor in &self.post_processors {
            candidates = post_processor(candidates);
        }

        candidates.sort_by(|a, b| {
            b.relevance.cmp(&a.relevance).then(a.order.cmp(&b.order)).then(a.symbol_id.cmp(&b.symbol_id))
        });

        let mut seen = std::collections::HashSet::new();
        candidates.retain(|c| seen.insert(c.symbol_id.clone()));

        let mut slices = Vec::new();
        let mut used = 0usize;
        let mut unchanged = Vec::new();

        for candidate in candidates {
            let signature = candidate.signature.clone().unwrap_or_default();
            let is_unchanged = delta.map(|d| d.unchanged.contains(&candidate.symbol_id)).unwrap_or(false);

            let sig_cost = tokenizer::estimate_tokens(&signature);
            let full_text = format!("{signature}\n{}", candidate.code.clone().unwrap_or_default());
            let full_cost = tokenizer::estimate_tokens(&full_text);

            if is_unchanged {
                unchanged.push(candidate.symbol_id.as_str().to_string());
                slices.push(make_slice(&candidate, signature, None));
                continue;
            }

            let has_code = candidate.code.is_some();
            let fits_full = match budget {
                None => true,
                Some(b) => used + full_cost <= b,
            };

            if has_code && fits_full {
                used += full_cost;
                let code = candidate.code.clone();
                slices.push(make_slice(&candidate, signature, code));
            } else {
                let fits_sig = match budget {
                    None => true,
                    Some(b) => used + sig_cost <= b,
                };
                if !fits_sig {
                    break;
                }
                used += sig_cost;
                slices.push(make_slice(&candidate, signature, None));
            }
        }

        ContextPack {
            slices,
            budget_used: used,
            unchanged: (!unchanged.is_empty()).then_some(unchanged),
            rehydrate: delta.map(|d| {
                d.rehydrate.iter().map(|(k, v)| (k.as_str().to_string(), v.clone())).collect()
            }),
            cache_stats: delta.map(|d| {
                let hits = d.unchanged.len() as u64;
                let misses = d.changed.len() as u64;
                let total = hits + misses;
                CacheStats { hits, misses, hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 } }
            }),
        }
    }
}

fn make_slice(candidate: &Candidate, signature: String, code: Option<String>) -> ContextSlice {
    let etag = compute_etag(&signature, code.as_deref());
    let relevance = candidate.label.clone().map(|l| l.to_string()).unwrap_or_default();
    ContextSlice {
        id: candidate.symbol_id.as_str().to_string(),
        signature,
        code,
        lines: candidate.lines.map(|r| (r.start, r.end)),
        relevance,
        meta: candidate.meta.clone(),
        etag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolId;

    fn candidate(id: &str, relevance: i64, order: usize) -> Candidate {
        Candidate::new(SymbolId::from_raw(id), relevance, RelevanceLabel::Depth(0), order)
            .with_signature(format!("sig:{id}"))
    }

    #[test]
    fn round_trip_etag_is_stable() {
        let etag1 = compute_etag("def f(x)->int", Some(" return x+1\n"));
        let etag2 = compute_etag("def f(x)->int", Some(" return x+1\n"));
        assert_eq!(etag1, etag2);
        assert_ne!(compute_etag("sig", None), compute_etag("sig", Some("")));
    }

    #[test]
    fn ordering_by_relevance_then_order_then_id() {
        let builder = PackBuilder::new();
        let candidates = vec![candidate("b", 1, 0), candidate("a", 2, 1)];
        let pack = builder.build(candidates, None, None);
        assert_eq!(pack.slices[0].id, "a");
    }

    #[test]
    fn duplicate_symbol_id_collapses_to_one_slice() {
        let builder = PackBuilder::new();
        let candidates = vec![candidate("a", 1, 0), candidate("a", 5, 1)];
        let pack = builder.build(candidates, None, None);
        assert_eq!(pack.slices.len(), 1);
    }

    #[test]
    fn budget_is_never_exceeded() {
        let builder = PackBuilder::new();
        let mut candidates = Vec::new();
        for i in 0..5 {
            candidates.push(
                candidate(&format!("s{i}"), 10 - i as i64, i)
                    .with_code("x".repeat(800), LineRange::new(1, 1)),
            );
        }
        let pack = builder.build(candidates, Some(450), None);
        assert!(pack.budget_used <= 450);
    }
}
