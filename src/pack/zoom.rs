//! L0-L4 zoom rendering (§4.6 "Zoom levels"): how much of a slice's
//! body actually gets rendered.

use crate::types::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZoomLevel {
    L0,
    L1,
    L2,
    L3,
    L4,
}

impl ZoomLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::L0,
            1 => Self::L1,
            2 => Self::L2,
            3 => Self::L3,
            _ => Self::L4,
        }
    }
}

/// Render `id`/`signature`/`code` according to `level`. L2's
/// control-flow skeleton keeps only top-level statements and the
/// keywords named in the spec (`if/for/while/try/return/throw`), as a
/// line-prefix filter over the code body.
pub fn render_zoom(level: ZoomLevel, id: &SymbolId, signature: &str, code: Option<&str>) -> String {
    match level {
        ZoomLevel::L0 => id.as_str().to_string(),
        ZoomLevel::L1 => format!("{} {}", id.as_str(), signature),
        ZoomLevel::L2 => {
            let skeleton = code.map(control_flow_skeleton).unwrap_or_default();
            format!("{} {}\n{}", id.as_str(), signature, skeleton)
        }
        ZoomLevel::L3 | ZoomLevel::L4 => {
            format!("{} {}\n{}", id.as_str(), signature, code.unwrap_or_default())
        }
    }
}

const SKELETON_KEYWORDS: &[&str] =
    &["if", "for", "while", "try", "return", "throw", "switch", "match", "else", "catch"];

fn control_flow_skeleton(code: &str) -> String {
    code.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            SKELETON_KEYWORDS.iter().any(|kw| {
                trimmed.starts_with(kw)
                    && trimmed[kw.len()..].chars().next().map(|c| !c.is_alphanumeric()).unwrap_or(true)
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l0_emits_id_only() {
        let id = SymbolId::from_raw("a.py:f");
        assert_eq!(render_zoom(ZoomLevel::L0, &id, "def f()", Some("  return 1")), "a.py:f");
    }

    #[test]
    fn l2_keeps_only_control_flow_lines() {
        let code = "x = 1\nif x:\n    return x\ny = 2\n";
        assert_eq!(control_flow_skeleton(code), "if x:\n    return x");
    }

    #[test]
    fn zoom_from_u8_clamps_high_values_to_l4() {
        assert_eq!(ZoomLevel::from_u8(9), ZoomLevel::L4);
    }
}
