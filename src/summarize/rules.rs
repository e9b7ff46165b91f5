//! Line-level extraction rules for the summarizer
//!
//! Each rule is a pure function from `(line, current section)` to zero or
//! one extracted fact, so the rule set is testable in isolation. Patterns
//! are compiled once at construction.

use regex::Regex;

/// Headings too generic to count as themes
const GENERIC_HEADINGS: &[&str] = &[
    "problem",
    "proposed feature",
    "scope",
    "scope (small)",
    "why it fits reffy",
    "ux sketch",
    "acceptance criteria",
    "follow-up",
    "follow-up (optional)",
];

/// Compiled line rules
pub struct LineRules {
    heading: Regex,
    whitespace: Regex,
    quoted_key: Regex,
    command: Regex,
    feature_idea_prefix: Regex,
    bullet_marker: Regex,
    bullet_run: Regex,
}

impl LineRules {
    pub fn new() -> Self {
        // Literal patterns; unwrap is fine for compile-time constants.
        Self {
            heading: Regex::new(r"^#{1,6}\s+(.+)$").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            quoted_key: Regex::new(r#"["']\s*:"#).unwrap(),
            command: Regex::new(r"`(reffy [^`]+)`").unwrap(),
            feature_idea_prefix: Regex::new(r"(?i)^feature idea:\s*").unwrap(),
            bullet_marker: Regex::new(r"^[*-]\s*").unwrap(),
            bullet_run: Regex::new(r"^-+\s*").unwrap(),
        }
    }

    /// Strip backticks, collapse whitespace runs, trim.
    pub fn normalize(&self, line: &str) -> String {
        let without_ticks = line.replace('`', "");
        self.whitespace
            .replace_all(&without_ticks, " ")
            .trim()
            .to_string()
    }

    /// Heading text (normalized) when the line is a markdown heading.
    pub fn heading_value(&self, line: &str) -> Option<String> {
        self.heading
            .captures(line)
            .map(|caps| self.normalize(&caps[1]))
    }

    /// Strip a literal `feature idea:` prefix from a heading.
    pub fn strip_feature_idea_prefix(&self, heading: &str) -> String {
        self.feature_idea_prefix.replace(heading, "").to_string()
    }

    /// Whether a heading is too generic to be a theme.
    pub fn is_generic_heading(&self, section: &str) -> bool {
        GENERIC_HEADINGS.contains(&section)
    }

    /// A question mark alone does not make a question: lines that look
    /// structurally like code or data (braces, brackets, quoted-key colons)
    /// are rejected so JSON snippets are not misread as open questions.
    pub fn is_natural_language_question(&self, line: &str) -> bool {
        line.contains('?')
            && !line.contains(|c| matches!(c, '{' | '}' | '[' | ']'))
            && !self.quoted_key.is_match(line)
    }

    /// The question text with a leading bullet marker stripped.
    pub fn question_text(&self, line: &str) -> String {
        self.bullet_marker.replace(line, "").to_string()
    }

    /// All inline backticked `reffy …` invocations on the line.
    pub fn extract_commands(&self, line: &str) -> Vec<String> {
        self.command
            .captures_iter(line)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Bullet text when the line is a plain bullet under a "proposed
    /// feature" section and not itself a tool invocation.
    pub fn proposed_feature_bullet(&self, line: &str, section: &str) -> Option<String> {
        if section.contains("proposed feature")
            && line.starts_with("- ")
            && !line.contains("`reffy ")
        {
            Some(self.bullet_run.replace(line, "").to_string())
        } else {
            None
        }
    }
}

impl Default for LineRules {
    fn default() -> Self {
        Self::new()
    }
}
