//! Cross-file call resolution (§4.2 "Call-graph construction").
//!
//! `FunctionInfo::calls` holds bare callee names as written in source;
//! this resolver turns each into the cross product of matching caller
//! and callee `SymbolId`s and folds the result into `adjacency` /
//! `reverse_adjacency`.

use super::ProjectIndex;
use crate::types::SymbolId;
use rustc_hash::FxHashMap;

pub fn build(index: &mut ProjectIndex, include_reverse: bool) {
    let mut adjacency: FxHashMap<SymbolId, Vec<SymbolId>> = FxHashMap::default();
    let mut reverse: FxHashMap<SymbolId, Vec<SymbolId>> = FxHashMap::default();

    let callers: Vec<(SymbolId, Vec<String>)> = index
        .symbol_index
        .iter()
        .map(|(id, info)| (id.clone(), info.calls.clone()))
        .collect();

    for (caller_id, calls) in callers {
        for callee_name in calls {
            let Some(callee_ids) = index.name_index.get(callee_name.as_str()) else {
                continue;
            };
            for callee_id in callee_ids {
                if *callee_id == caller_id {
                    continue;
                }
                adjacency.entry(caller_id.clone()).or_default().push(callee_id.clone());
                if include_reverse {
                    reverse.entry(callee_id.clone()).or_default().push(caller_id.clone());
                }
            }
        }
    }

    for values in adjacency.values_mut() {
        values.sort();
        values.dedup();
    }
    for values in reverse.values_mut() {
        values.sort();
        values.dedup();
    }

    index.adjacency = adjacency;
    index.reverse_adjacency = if include_reverse { Some(reverse) } else { None };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::FunctionInfo;
    use crate::types::LineRange;

    fn fi(id: &str, name: &str, calls: &[&str]) -> FunctionInfo {
        FunctionInfo {
            id: SymbolId::from_raw(id),
            name: name.to_string(),
            owner: None,
            signature: format!("fn {name}()"),
            doc_comment: None,
            range: LineRange::new(1, 1),
            calls: calls.iter().map(|s| s.to_string()).collect(),
            is_async: false,
            is_exported: true,
        }
    }

    #[test]
    fn builds_adjacency_and_reverse() {
        let mut index = ProjectIndex::default();
        let top = fi("a.py:top", "top", &["mid"]);
        let mid = fi("a.py:mid", "mid", &["leaf"]);
        let leaf = fi("a.py:leaf", "leaf", &[]);
        for f in [top, mid, leaf] {
            index.name_index.entry(f.name.clone()).or_default().push(f.id.clone());
            index.symbol_index.insert(f.id.clone(), f);
        }

        build(&mut index, true);

        let top_id = SymbolId::from_raw("a.py:top");
        let mid_id = SymbolId::from_raw("a.py:mid");
        let leaf_id = SymbolId::from_raw("a.py:leaf");
        assert_eq!(index.adjacency.get(&top_id).unwrap(), &vec![mid_id.clone()]);
        assert_eq!(index.adjacency.get(&mid_id).unwrap(), &vec![leaf_id.clone()]);
        let reverse = index.reverse_adjacency.as_ref().unwrap();
        assert_eq!(reverse.get(&mid_id).unwrap(), &vec![top_id]);
    }
}
