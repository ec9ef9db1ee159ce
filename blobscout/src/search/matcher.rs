use colored::Colorize;
use regex::Regex;
use std::borrow::Cow;

use crate::results::ResultItem;

/// Strategy for turning a scanned line into a result item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStyle {
    /// Lines are reported unchanged
    Plain,
    /// Every match inside a line is wrapped in bold green markup
    Highlight,
}

/// Matches object lines against the content pattern.
///
/// The style is fixed when the matcher is built and applies to every object in
/// the run.
#[derive(Debug, Clone)]
pub struct ContentMatcher {
    pattern: Regex,
    style: MatchStyle,
}

impl ContentMatcher {
    pub fn new(pattern: Regex, style: MatchStyle) -> Self {
        Self { pattern, style }
    }

    pub fn style(&self) -> MatchStyle {
        self.style
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Returns the item to report for `line`, or `None` if it does not match
    pub fn match_line(&self, line: &str) -> Option<ResultItem> {
        match self.style {
            MatchStyle::Plain => self.pattern.is_match(line).then(|| ResultItem {
                text: line.to_string(),
                width_adjust: 0,
            }),
            MatchStyle::Highlight => {
                let highlighted = self
                    .pattern
                    .replace_all(line, |caps: &regex::Captures| {
                        caps[0].green().bold().to_string()
                    });
                // replace_all only allocates when something matched
                match highlighted {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(text) => {
                        let width_adjust = text
                            .chars()
                            .count()
                            .saturating_sub(line.chars().count());
                        Some(ResultItem { text, width_adjust })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(pattern: &str, style: MatchStyle) -> ContentMatcher {
        ContentMatcher::new(Regex::new(pattern).unwrap(), style)
    }

    #[test]
    fn test_plain_match() {
        let m = matcher("foo", MatchStyle::Plain);
        let item = m.match_line("a foo line").unwrap();
        assert_eq!(item.text, "a foo line");
        assert_eq!(item.width_adjust, 0);
        assert!(m.match_line("a bar line").is_none());
    }

    #[test]
    fn test_regex_match() {
        let m = matcher(r"\berr(or)?\b", MatchStyle::Plain);
        assert!(m.match_line("fatal error here").is_some());
        assert!(m.match_line("err: x").is_some());
        assert!(m.match_line("errors everywhere").is_none());
    }

    #[test]
    fn test_highlight_match() {
        colored::control::set_override(true);
        let m = matcher("foo", MatchStyle::Highlight);

        let item = m.match_line("foo and foo").unwrap();
        assert_ne!(item.text, "foo and foo");
        assert!(item.text.contains("\u{1b}["));
        assert_eq!(
            item.width_adjust,
            item.text.chars().count() - "foo and foo".chars().count()
        );
        assert!(item.width_adjust > 0);

        assert!(m.match_line("bar").is_none());
    }

    #[test]
    fn test_highlight_agrees_with_plain_on_what_matches() {
        colored::control::set_override(true);
        let plain = matcher("ba[rz]", MatchStyle::Plain);
        let highlight = matcher("ba[rz]", MatchStyle::Highlight);
        for line in ["foo", "bar", "baz", "", "foobarbaz"] {
            assert_eq!(
                plain.match_line(line).is_some(),
                highlight.match_line(line).is_some(),
                "disagreement on {:?}",
                line
            );
        }
    }
}
