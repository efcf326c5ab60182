//! Token estimation (§4.6 "Token estimation"): a BPE-compatible count
//! when the `bpe-tokenizer` feature is enabled, else `len(text) / 4`.

#[cfg(feature = "bpe-tokenizer")]
use std::sync::OnceLock;

#[cfg(feature = "bpe-tokenizer")]
static BPE: OnceLock<Option<tiktoken_rs::CoreBPE>> = OnceLock::new();

pub fn estimate_tokens(text: &str) -> usize {
    #[cfg(feature = "bpe-tokenizer")]
    {
        let bpe = BPE.get_or_init(|| tiktoken_rs::cl100k_base().ok());
        if let Some(bpe) = bpe {
            return bpe.encode_ordinary(text).len().max(1);
        }
    }
    approximate(text)
}

fn approximate(text: &str) -> usize {
    (text.len() / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_estimates_to_at_least_one() {
        assert!(estimate_tokens("") >= 1);
    }

    #[test]
    fn longer_text_estimates_more_tokens() {
        let short = estimate_tokens("hi");
        let long = estimate_tokens(&"word ".repeat(200));
        assert!(long > short);
    }
}
