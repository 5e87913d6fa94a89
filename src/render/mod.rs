//! Restricted markup rendering for thought content.
//!
//! # Responsibility
//! - Turn raw content into HTML-safe markup supporting bold, italic,
//!   strikethrough and bullet lines.
//! - Guarantee that no user-supplied `<`, `>`, `&` or quote character
//!   survives unescaped; the only tags in the output are the fixed wrappers
//!   generated here.
//!
//! Escaping runs first, so the substitution passes only ever see inert text.
//! Each marker is a single global, non-nested pass; overlapping markers are
//! not specially handled, first match wins per pattern.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid pattern"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("valid pattern"));
static STRIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").expect("valid pattern"));
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s+(.*)$").expect("valid pattern"));

/// Render raw content into restricted HTML-safe markup.
pub fn render(text: &str) -> String {
    let escaped = escape(text);

    let marked = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let marked = ITALIC_RE.replace_all(&marked, "<em>$1</em>");
    let marked = STRIKE_RE.replace_all(&marked, "<del>$1</del>");

    marked
        .lines()
        .map(|line| match BULLET_RE.captures(line) {
            Some(caps) => format!("<li>{}</li>", &caps[1]),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape the five HTML-significant characters.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_bold_and_italic() {
        let html = render("**hi** and *there*");
        assert_eq!(html, "<strong>hi</strong> and <em>there</em>");
    }

    #[test]
    fn wraps_strikethrough() {
        assert_eq!(render("~~gone~~"), "<del>gone</del>");
    }

    #[test]
    fn escapes_before_substitution() {
        let html = render("<script>alert('x')</script> **safe**");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&#39;x&#39;"));
        assert!(html.contains("<strong>safe</strong>"));
    }

    #[test]
    fn bullet_lines_become_list_rows() {
        let html = render("first\n- one\n- two\nlast");
        assert_eq!(html, "first\n<li>one</li>\n<li>two</li>\nlast");
    }

    #[test]
    fn dash_without_space_is_not_a_bullet() {
        assert_eq!(render("-notabullet"), "-notabullet");
    }

    #[test]
    fn escapes_quotes_and_ampersands() {
        assert_eq!(render(r#"a & "b""#), "a &amp; &quot;b&quot;");
    }

    #[test]
    fn unmatched_marker_passes_through() {
        assert_eq!(render("half *open"), "half *open");
    }
}
