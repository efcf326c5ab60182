//! Rendering a [`crate::pack::ContextPack`] into bytes for a caller (§4.9).

mod json;
mod text;
mod ultracompact;

pub use json::render_json;
pub use text::render_text;
pub use ultracompact::render_ultracompact;

use crate::pack::ContextPack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ultracompact,
    Json,
    Text,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ultracompact" => Some(Self::Ultracompact),
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

pub fn render(pack: &ContextPack, format: OutputFormat) -> String {
    match format {
        OutputFormat::Ultracompact => render_ultracompact(pack),
        OutputFormat::Json => render_json(pack),
        OutputFormat::Text => render_text(pack),
    }
}

/// Clamp `text` to at most `max_lines` lines and `max_bytes` bytes,
/// applied line-then-byte (line truncation happens first).
pub fn truncate_output(text: &str, max_lines: Option<usize>, max_bytes: Option<usize>) -> String {
    let by_lines = match max_lines {
        Some(n) => text.lines().take(n).collect::<Vec<_>>().join("\n"),
        None => text.to_string(),
    };

    match max_bytes {
        Some(limit) if by_lines.len() > limit => {
            let mut end = limit;
            while end > 0 && !by_lines.is_char_boundary(end) {
                end -= 1;
            }
            by_lines[..end].to_string()
        }
        _ => by_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_by_lines_then_bytes() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(truncate_output(text, Some(2), None), "a\nb");
        assert_eq!(truncate_output("hello world", None, Some(5)), "hello");
    }

    #[test]
    fn truncate_respects_utf8_boundaries() {
        let text = "héllo";
        let truncated = truncate_output(text, None, Some(2));
        assert!(text.is_char_boundary(truncated.len()));
    }

    #[test]
    fn format_from_str_rejects_unknown() {
        assert!(OutputFormat::from_str("yaml").is_none());
    }
}
