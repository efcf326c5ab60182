//! Delta orchestration helpers shared by `get_relevant_context` and
//! `get_diff_context` (§4.7 "Delta orchestration").

use super::{Delivery, DeliveryCache};
use crate::types::SymbolId;
use std::collections::HashMap;

/// Result of `check_delta`: which symbols are unchanged since the last
/// delivery, which changed (or were never delivered), and the blob refs
/// available for rehydrating unchanged symbols.
#[derive(Debug, Clone, Default)]
pub struct DeltaResult {
    pub unchanged: Vec<SymbolId>,
    pub changed: Vec<SymbolId>,
    pub rehydrate: HashMap<SymbolId, String>,
}

/// Step (ii): ETag from signature alone, or signature + sorted diff
/// line numbers for a diff-context request.
pub fn signature_etag(signature: &str, diff_lines: Option<&[u32]>) -> String {
    match diff_lines {
        None => crate::pack::compute_etag(signature, None),
        Some(lines) => {
            let mut sorted = lines.to_vec();
            sorted.sort_unstable();
            let lines_str = sorted.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(",");
            crate::pack::compute_etag(&format!("{signature}\n{lines_str}"), None)
        }
    }
}

/// Run the full delta check against the cache for a `{symbol -> etag}`
/// map; this is step (iii).
pub fn check_delta(
    cache: &DeliveryCache,
    session_id: &str,
    current_etags: &HashMap<SymbolId, String>,
) -> Result<DeltaResult, crate::error::StorageError> {
    cache.check_delta(session_id, current_etags)
}

/// Step (vi): record a delivery for every symbol whose code was
/// actually included in the built pack.
pub fn record_delivered(
    cache: &DeliveryCache,
    session_id: &str,
    deliveries: Vec<Delivery>,
) -> Result<(), crate::error::StorageError> {
    cache.record_deliveries_batch(session_id, deliveries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_line_order_does_not_affect_etag() {
        let a = signature_etag("sig", Some(&[5, 2, 8]));
        let b = signature_etag("sig", Some(&[8, 2, 5]));
        assert_eq!(a, b);
    }

    #[test]
    fn signature_only_etag_differs_from_diff_etag() {
        let plain = signature_etag("sig", None);
        let with_lines = signature_etag("sig", Some(&[1]));
        assert_ne!(plain, with_lines);
    }
}
