//! Prompt template parsing into a (system, user) instruction pair.
//!
//! Templates come in two interchangeable layouts: a strict two-line form
//! (line 1 system, line 2 user) and a free-form multi-line form split on a
//! separator line of five or more `=` characters. The layout is resolved once
//! into an explicit [`TemplateShape`] and never re-inferred downstream.

use anyhow::{Result, anyhow};

use crate::core::types::TaxonomyEntry;

/// Minimum run of `=` characters for a line to count as a separator.
const SEPARATOR_MIN: usize = 5;

/// The system+user instruction pair driving generation for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
}

impl PromptSpec {
    /// Specialize the user prompt for one taxonomy code.
    ///
    /// Substitutes `{bct_label}`, `{bct_definition}` and `{num_messages}` in
    /// the user prompt. The system prompt is shared across codes verbatim.
    pub fn for_code(&self, entry: &TaxonomyEntry, count: u32) -> PromptSpec {
        let user = self
            .user
            .replace("{bct_label}", &entry.label)
            .replace("{bct_definition}", &entry.definition)
            .replace("{num_messages}", &count.to_string());
        PromptSpec {
            system: self.system.clone(),
            user,
        }
    }
}

/// Which template layout was detected during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateShape {
    /// Line 1 system, line 2 user, further lines ignored.
    TwoLine,
    /// Text above the `=====` line is system, text below is user.
    Separated,
}

/// A template resolved into its shape and instruction pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub shape: TemplateShape,
    pub spec: PromptSpec,
}

/// Template file has neither the two-line nor the separator-line layout.
///
/// Fatal for the run: no dataset can be produced without a usable prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTemplate {
    pub reason: String,
}

impl std::fmt::Display for MalformedTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed prompt template: {}", self.reason)
    }
}

impl std::error::Error for MalformedTemplate {}

fn malformed(reason: impl Into<String>) -> anyhow::Error {
    anyhow!(MalformedTemplate {
        reason: reason.into()
    })
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= SEPARATOR_MIN && trimmed.chars().all(|c| c == '=')
}

/// Parse raw template text into a [`ParsedTemplate`].
///
/// Separated layout wins when a separator line exists anywhere in the text;
/// otherwise the first two non-empty lines form the pair. Both prompts are
/// trimmed and must be non-empty.
pub fn parse_template(raw: &str) -> Result<ParsedTemplate> {
    if let Some(pos) = raw.lines().position(is_separator) {
        let lines: Vec<&str> = raw.lines().collect();
        let system = lines[..pos].join("\n").trim().to_string();
        let user = lines[pos + 1..].join("\n").trim().to_string();
        if system.is_empty() {
            return Err(malformed("no system prompt above the separator line"));
        }
        if user.is_empty() {
            return Err(malformed("no user prompt below the separator line"));
        }
        return Ok(ParsedTemplate {
            shape: TemplateShape::Separated,
            spec: PromptSpec { system, user },
        });
    }

    let mut nonempty = raw.lines().map(str::trim).filter(|line| !line.is_empty());
    let system = nonempty
        .next()
        .ok_or_else(|| malformed("template is empty"))?;
    let user = nonempty.next().ok_or_else(|| {
        malformed("expected two non-empty lines or a ===== separator line")
    })?;

    Ok(ParsedTemplate {
        shape: TemplateShape::TwoLine,
        spec: PromptSpec {
            system: system.to_string(),
            user: user.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TaxonomyEntry {
        TaxonomyEntry {
            no: "1.1".to_string(),
            label: "Goal setting (behavior)".to_string(),
            definition: "Set or agree on a goal".to_string(),
        }
    }

    /// Two-line layout parses to (line1, line2) trimmed.
    #[test]
    fn two_line_template_parses() {
        let parsed = parse_template("Sys.\nUser.\n").expect("parse");
        assert_eq!(parsed.shape, TemplateShape::TwoLine);
        assert_eq!(parsed.spec.system, "Sys.");
        assert_eq!(parsed.spec.user, "User.");
    }

    #[test]
    fn two_line_template_ignores_extra_lines() {
        let parsed = parse_template("  Sys.  \n\nUser.\nignored\nalso ignored\n").expect("parse");
        assert_eq!(parsed.shape, TemplateShape::TwoLine);
        assert_eq!(parsed.spec.system, "Sys.");
        assert_eq!(parsed.spec.user, "User.");
    }

    /// Separator layout: system is everything strictly above, user strictly below.
    #[test]
    fn separator_template_splits_multiline_prompts() {
        let raw = "You are concise.\nAlways be kind.\n=====\nWrite a message.\nNumber each one.\n";
        let parsed = parse_template(raw).expect("parse");
        assert_eq!(parsed.shape, TemplateShape::Separated);
        assert_eq!(parsed.spec.system, "You are concise.\nAlways be kind.");
        assert_eq!(parsed.spec.user, "Write a message.\nNumber each one.");
    }

    #[test]
    fn separator_requires_five_equals() {
        // Four '=' is not a separator, so this falls back to two-line mode.
        let parsed = parse_template("Sys.\n====\nUser.\n").expect("parse");
        assert_eq!(parsed.shape, TemplateShape::TwoLine);
        assert_eq!(parsed.spec.user, "====");
    }

    #[test]
    fn separator_line_may_be_padded_with_whitespace() {
        let parsed = parse_template("Sys.\n  ======  \nUser.\n").expect("parse");
        assert_eq!(parsed.shape, TemplateShape::Separated);
    }

    #[test]
    fn single_line_without_separator_is_malformed() {
        let err = parse_template("Only one line\n").unwrap_err();
        assert!(err.downcast_ref::<MalformedTemplate>().is_some());
    }

    #[test]
    fn empty_template_is_malformed() {
        let err = parse_template("\n\n").unwrap_err();
        assert!(err.downcast_ref::<MalformedTemplate>().is_some());
    }

    #[test]
    fn separator_with_empty_side_is_malformed() {
        let err = parse_template("=====\nUser.\n").unwrap_err();
        let malformed = err
            .downcast_ref::<MalformedTemplate>()
            .expect("typed error");
        assert!(malformed.reason.contains("system prompt"));

        let err = parse_template("Sys.\n=====\n\n").unwrap_err();
        assert!(err.downcast_ref::<MalformedTemplate>().is_some());
    }

    #[test]
    fn for_code_substitutes_placeholders_in_user_prompt_only() {
        let spec = PromptSpec {
            system: "Keep {bct_label} literal here.".to_string(),
            user: "Write {num_messages} messages about {bct_label}: {bct_definition}".to_string(),
        };
        let filled = spec.for_code(&entry(), 3);
        assert_eq!(filled.system, "Keep {bct_label} literal here.");
        assert_eq!(
            filled.user,
            "Write 3 messages about Goal setting (behavior): Set or agree on a goal"
        );
    }
}
