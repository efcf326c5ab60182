//! Canonical JSON wire format (§6 "ContextPack wire format").

use crate::pack::ContextPack;

pub fn render_json(pack: &ContextPack) -> String {
    serde_json::to_string_pretty(pack).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{ContextSlice, PackBuilder};
    use crate::types::{RelevanceLabel, SymbolId};

    #[test]
    fn renders_budget_used_and_slices() {
        let builder = PackBuilder::new();
        let candidates = vec![crate::pack::Candidate::new(
            SymbolId::from_raw("a.py:f"),
            5,
            RelevanceLabel::Depth(0),
            0,
        )
        .with_signature("def f()")];
        let pack = builder.build(candidates, None, None);
        let json = render_json(&pack);
        assert!(json.contains("\"budget_used\""));
        assert!(json.contains("a.py:f"));
    }

    #[test]
    fn empty_pack_serializes_to_valid_json() {
        let pack = ContextPack { slices: Vec::<ContextSlice>::new(), ..Default::default() };
        let json = render_json(&pack);
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }
}
