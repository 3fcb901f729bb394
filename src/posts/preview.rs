//! Turning stored post HTML into terminal text, and the date labels shown
//! next to posts.
//!
//! Nothing here interprets markup: tags are removed and a handful of entities
//! decoded, so untrusted content can only ever render as plain characters.

use once_cell::sync::Lazy;
use regex::Regex;
use time::macros::format_description;
use time::OffsetDateTime;

use super::Post;

pub const DATE_NOT_AVAILABLE: &str = "Date not available";

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static BLOCK_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|blockquote|pre|tr)\s*>")
        .expect("valid block regex")
});
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li(\s[^>]*)?>").expect("valid list item regex"));
static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

/// Removes every `<...>` sequence and leaves the rest untouched.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// First `max_chars` characters of the tag-stripped text, with `...` appended
/// only when something was cut.
pub fn truncate_preview(html: &str, max_chars: usize) -> String {
    let text = strip_tags(html);
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Readable multi-line rendering of post content for detail views.
pub fn html_to_text(html: &str) -> String {
    let with_bullets = LIST_ITEM.replace_all(html, "• ");
    let with_breaks = BLOCK_END.replace_all(&with_bullets, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    let collapsed = BLANK_RUN.replace_all(&decoded, "\n\n");
    collapsed.trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `Jan 5, 2024`
    Day,
    /// `Jan 5, 2024, 03:07 PM`
    Minute,
}

pub fn date_label(at: &OffsetDateTime, style: DateStyle) -> String {
    let formatted = match style {
        DateStyle::Day => at.format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        )),
        DateStyle::Minute => at.format(format_description!(
            "[month repr:short] [day padding:none], [year], [hour repr:12]:[minute] [period]"
        )),
    };
    formatted.unwrap_or_else(|err| {
        tracing::debug!(?err, "date formatting failed");
        DATE_NOT_AVAILABLE.to_string()
    })
}

/// Formats a raw timestamp string, falling back to the sentinel when it does
/// not parse as a real date.
pub fn raw_date_label(raw: &str, style: DateStyle) -> String {
    match super::parse_timestamp_str(raw) {
        Some(at) => date_label(&at, style),
        None => DATE_NOT_AVAILABLE.to_string(),
    }
}

/// `Posted:` with the creation time, or `Updated:` once the post was edited.
pub fn footer_label(post: &Post) -> String {
    if post.was_edited() {
        format!("Updated: {}", date_label(&post.updated_at, DateStyle::Minute))
    } else {
        format!("Posted: {}", post.created_label(DateStyle::Minute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn preview_strips_tags_and_truncates_at_the_limit() {
        let body = format!("<p>{}</p>", "a".repeat(200));
        let preview = truncate_preview(&body, 150);
        assert_eq!(preview.chars().count(), 153);
        assert!(preview.ends_with("..."));
        assert!(!preview.contains('<'));
    }

    #[test]
    fn short_preview_has_no_ellipsis() {
        assert_eq!(truncate_preview("<b>Hi</b> there", 150), "Hi there");
        let exact = "x".repeat(150);
        assert_eq!(truncate_preview(&exact, 150), exact);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let body = "é".repeat(5);
        assert_eq!(truncate_preview(&body, 3), "ééé...");
    }

    #[test]
    fn script_tags_render_as_inert_text() {
        let text = html_to_text("<p>hello</p><script>alert('x')</script>");
        assert!(!text.contains("<script"));
        assert!(text.starts_with("hello"));
    }

    #[test]
    fn block_elements_become_line_breaks() {
        let text = html_to_text("<h2>Title</h2><p>One &amp; two</p><ul><li>a</li><li>b</li></ul>");
        assert_eq!(text, "Title\nOne & two\n• a\n• b");
    }

    #[test]
    fn date_labels_match_the_card_and_footer_formats() {
        let at = datetime!(2024-01-05 15:07 UTC);
        assert_eq!(date_label(&at, DateStyle::Day), "Jan 5, 2024");
        assert_eq!(date_label(&at, DateStyle::Minute), "Jan 5, 2024, 03:07 PM");
    }

    #[test]
    fn footer_switches_to_the_update_time_once_edited() {
        let mut post = Post {
            id: "1".into(),
            title: "T".into(),
            content: String::new(),
            author_name: None,
            created_at: datetime!(2024-01-05 15:07 UTC),
            updated_at: datetime!(2024-01-05 15:07 UTC),
            created_at_raw: None,
        };
        assert_eq!(footer_label(&post), "Posted: Jan 5, 2024, 03:07 PM");
        post.updated_at = datetime!(2024-02-01 09:30 UTC);
        assert_eq!(footer_label(&post), "Updated: Feb 1, 2024, 09:30 AM");
    }

    #[test]
    fn unparseable_raw_dates_use_the_sentinel() {
        assert_eq!(raw_date_label("not a date", DateStyle::Day), DATE_NOT_AVAILABLE);
        assert_eq!(
            raw_date_label("2023-12-25T09:00:00Z", DateStyle::Day),
            "Dec 25, 2023"
        );
    }
}
