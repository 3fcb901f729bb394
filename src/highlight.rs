use regex::{Regex, RegexBuilder};

/// Case-insensitive matcher for the active feed search, used to highlight
/// hits on feed cards. Whitespace inside the term is kept.
pub fn build_highlight_regex(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into alternating (segment, is_match) pieces.
pub fn split_matches<'a>(text: &'a str, regex: Option<&Regex>) -> Vec<(&'a str, bool)> {
    let Some(regex) = regex else {
        return vec![(text, false)];
    };
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            pieces.push((&text[last..found.start()], false));
        }
        pieces.push((found.as_str(), true));
        last = found.end();
    }
    if last < text.len() {
        pieces.push((&text[last..], false));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_ignore_case_and_treat_input_literally() {
        let regex = build_highlight_regex("c++").expect("regex");
        let matches: Vec<_> = regex.find_iter("C++ and c++").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["C++", "c++"]);
    }

    #[test]
    fn empty_term_highlights_nothing() {
        assert!(build_highlight_regex("").is_none());
        assert_eq!(split_matches("plain", None), vec![("plain", false)]);
    }

    #[test]
    fn splits_text_around_hits() {
        let regex = build_highlight_regex("rust");
        let pieces = split_matches("Why Rust? rust!", regex.as_ref());
        assert_eq!(
            pieces,
            vec![
                ("Why ", false),
                ("Rust", true),
                ("? ", false),
                ("rust", true),
                ("!", false)
            ]
        );
    }
}
