//! Text normalization for issue bodies and comments.
//!
//! The source tracker exports rendered HTML fragments. Full HTML-to-markdown
//! conversion is out of scope; this module applies the mechanical cleanups
//! the migration depends on (untagging, code-panel fencing, entity decoding,
//! indentation stripping) and implements the cross-reference contract:
//! links to issues of the project being migrated are rewritten to
//! same-repository references (`#123`).

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_PANEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="(?:code|preformatted) panel"[^>]*>(.*?)</div>"#)
        .expect("static pattern compiles")
});

static UNTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?(?:span|pre|del|div)[^>]*>").expect("static pattern compiles"));

static BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br\s*/?>").expect("static pattern compiles"));

/// Convert a raw exported fragment into normalized text for `project_key`.
#[must_use]
pub fn normalize(raw: &str, project_key: &str) -> String {
    let text = CODE_PANEL.replace_all(raw, |caps: &regex::Captures<'_>| {
        let mut content = caps[1].trim().to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        format!("```\n{content}```\n")
    });

    let text = BREAKS.replace_all(&text, "\n");
    let text = text.replace("</p>", "\n\n").replace("<p>", "");
    let text = UNTAG.replace_all(&text, "");
    let text = decode_entities(&text);

    // JIRA wraps code blocks in deep fixed indentation.
    let text = text.replace("                ", "");

    rewrite_issue_refs(text.trim(), project_key)
}

/// Rewrite markdown links targeting issues of `project_key` into
/// same-repository references: `[ABC-12](any-url)` becomes `#12`.
#[must_use]
pub fn rewrite_issue_refs(text: &str, project_key: &str) -> String {
    let pattern = format!(r"\[{}-([0-9]+)\]\([^)]*\)", regex::escape(project_key));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, "#$1").into_owned(),
        Err(_) => text.to_string(),
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Header prefixed to bodies that exceeded the destination size bound.
pub const TRUNCATION_HEADER: &str =
    "**Note:** this text exceeded the importer's size limit and was truncated.\n\n";

/// Bound `text` to at most `limit` characters.
///
/// Returns the (possibly truncated) text and whether truncation happened.
/// Truncated text is prefixed with [`TRUNCATION_HEADER`] so readers know
/// content was dropped.
#[must_use]
pub fn bound(text: &str, limit: usize) -> (String, bool) {
    if text.chars().count() <= limit {
        return (text.to_string(), false);
    }
    let truncated: String = text.chars().take(limit).collect();
    (format!("{TRUNCATION_HEADER}{truncated}"), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_panels_become_fences() {
        let raw = r#"Before <div class="code panel">int x = 1;</div> after"#;
        let text = normalize(raw, "ABC");
        assert!(text.contains("```\nint x = 1;\n```"));
    }

    #[test]
    fn spans_and_divs_are_untagged() {
        let raw = r#"<span style="color: red">important</span> <div>block</div>"#;
        assert_eq!(normalize(raw, "ABC"), "important block");
    }

    #[test]
    fn issue_refs_rewritten_for_own_project_only() {
        let text = "See [ABC-12](https://host/browse/ABC-12) and [XYZ-3](https://host/browse/XYZ-3)";
        let rewritten = rewrite_issue_refs(text, "ABC");
        assert!(rewritten.contains("#12"));
        assert!(rewritten.contains("[XYZ-3]"));
    }

    #[test]
    fn entities_decoded() {
        assert_eq!(normalize("a &lt; b &amp;&amp; c &gt; d", "ABC"), "a < b && c > d");
    }

    #[test]
    fn bound_is_identity_under_limit() {
        let (text, truncated) = bound("short", 100);
        assert_eq!(text, "short");
        assert!(!truncated);
    }

    #[test]
    fn bound_truncates_and_prefixes_header() {
        let long = "x".repeat(150);
        let (text, truncated) = bound(&long, 100);
        assert!(truncated);
        assert!(text.starts_with(TRUNCATION_HEADER));
        assert_eq!(text.chars().count(), TRUNCATION_HEADER.chars().count() + 100);
    }

    #[test]
    fn bound_respects_char_boundaries() {
        let long = "é".repeat(50);
        let (text, truncated) = bound(&long, 10);
        assert!(truncated);
        assert!(text.ends_with(&"é".repeat(10)));
    }
}
