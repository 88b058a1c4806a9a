//! Parsing generator output into individual message strings.
//!
//! The generation command is asked to return a numbered list. Only lines that
//! start with a number are kept; surrounding prose ("Here are your
//! messages:", trailing commentary) is dropped.

use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*[.)]?\s*(.*\S)\s*$").unwrap());

/// Extract messages from a numbered-list response.
///
/// Keeps lines beginning with a number, strips the numbering prefix, and
/// preserves the original line order.
pub fn parse_messages(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| NUMBERED_LINE_RE.captures(line))
        .map(|caps| caps[2].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_numbered_lines() {
        let content = "Here are your messages:\n\n1. Walk every day.\n2. Track your meals.\n\nLet me know if you need more.\n";
        assert_eq!(
            parse_messages(content),
            vec!["Walk every day.", "Track your meals."]
        );
    }

    #[test]
    fn strips_numbering_variants() {
        let content = "1. dot style\n2) paren style\n 3.   padded \n10. double digit\n";
        assert_eq!(
            parse_messages(content),
            vec!["dot style", "paren style", "padded", "double digit"]
        );
    }

    #[test]
    fn empty_and_prose_only_content_yields_nothing() {
        assert!(parse_messages("").is_empty());
        assert!(parse_messages("Sorry, I cannot help with that.").is_empty());
    }

    #[test]
    fn keeps_punctuation_inside_messages() {
        let content = "1. Set a goal, then review it weekly (every Sunday).\n";
        assert_eq!(
            parse_messages(content),
            vec!["Set a goal, then review it weekly (every Sunday)."]
        );
    }
}
