//! Text layout helpers: truncation and alignment.

use crate::template::Align;

/// Suffix appended when text is cut to fit a maximum width.
pub const ELLIPSIS: &str = "…";

/// Truncate `text` so that `measure(result)` fits within `max_width`,
/// appending an ellipsis when anything was removed.
///
/// `measure` returns the rendered pixel width of a candidate string. The
/// function is generic over the measurer so layout logic can be tested
/// without loading a real font.
pub fn truncate_to_width(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> String {
    if measure(text) <= max_width {
        return text.to_string();
    }

    let mut kept: Vec<char> = text.chars().collect();
    while !kept.is_empty() {
        kept.pop();
        let candidate: String = kept.iter().collect::<String>() + ELLIPSIS;
        if measure(&candidate) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

/// Resolve the left edge of a text run given its anchor x and alignment.
pub fn aligned_x(anchor_x: i32, text_width: u32, align: Align) -> i32 {
    match align {
        Align::Left => anchor_x,
        Align::Center => anchor_x - (text_width as i32) / 2,
        Align::Right => anchor_x - text_width as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10px per char keeps the arithmetic obvious.
    fn measure(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("Ada", 100, measure), "Ada");
    }

    #[test]
    fn exact_fit_is_untouched() {
        assert_eq!(truncate_to_width("Ada Lovelace", 120, measure), "Ada Lovelace");
    }

    #[test]
    fn long_text_gets_ellipsis_within_budget() {
        let out = truncate_to_width("Ada Lovelace", 60, measure);
        assert!(out.ends_with(ELLIPSIS));
        assert!(measure(&out) <= 60);
        assert_eq!(out, "Ada L…");
    }

    #[test]
    fn hopeless_budget_yields_bare_ellipsis() {
        assert_eq!(truncate_to_width("Ada", 5, measure), ELLIPSIS);
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(aligned_x(100, 40, Align::Left), 100);
        assert_eq!(aligned_x(100, 40, Align::Center), 80);
        assert_eq!(aligned_x(100, 40, Align::Right), 60);
    }
}
