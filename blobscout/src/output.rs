use std::env;
use std::io::{self, Write};

use crate::config::{DisplayOptions, OutputMode};
use crate::results::SearchReport;

/// Width used when the terminal cannot be queried and `COLUMNS` is unset
pub const DEFAULT_WIDTH: usize = 79;

/// Determines the terminal width in columns.
///
/// Asks the terminal first, then falls back to `$COLUMNS`, then to
/// [`DEFAULT_WIDTH`].
pub fn terminal_width() -> usize {
    width_from(crossterm::terminal::size(), env::var("COLUMNS").ok())
}

fn width_from(probe: io::Result<(u16, u16)>, columns: Option<String>) -> usize {
    if let Ok((cols, _rows)) = probe {
        if cols > 0 {
            return cols as usize;
        }
    }
    columns
        .and_then(|c| c.trim().parse::<u16>().ok())
        .filter(|&w| w > 0)
        .map_or(DEFAULT_WIDTH, usize::from)
}

/// Returns at most the first `n` characters of `s`; `n == 0` means no limit
pub fn left_n(s: &str, n: usize) -> &str {
    if n == 0 {
        return s;
    }
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Writes a report as text.
///
/// Key-listing modes print one key per result. The full report skips results
/// without matches and prints the matched lines of the rest, optionally under
/// a `key (n matches):` header, truncated to `width` and followed by a blank
/// line.
pub fn render_report<W: Write>(
    report: &SearchReport,
    mode: OutputMode,
    display: DisplayOptions,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    for result in &report.results {
        match mode {
            OutputMode::KeysOnly | OutputMode::MatchingObjects => {
                writeln!(out, "{}", result.key())?;
            }
            OutputMode::Report => {
                if result.items.is_empty() {
                    continue;
                }
                if display.show_keys {
                    writeln!(out, "{} ({} matches):", result.key(), result.match_count())?;
                }
                for item in &result.items {
                    if display.fit_to_width {
                        writeln!(out, "{}", left_n(&item.text, width + item.width_adjust))?;
                    } else {
                        writeln!(out, "{}", item.text)?;
                    }
                }
                if display.extra_newlines {
                    writeln!(out)?;
                }
            }
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ObjectResult, ResultItem, Task};

    fn result(key: &str, lines: &[&str]) -> ObjectResult {
        ObjectResult {
            task: Task {
                bucket: "bucket".to_string(),
                key: key.to_string(),
            },
            items: lines
                .iter()
                .map(|l| ResultItem {
                    text: l.to_string(),
                    width_adjust: 0,
                })
                .collect(),
        }
    }

    fn report() -> SearchReport {
        let mut report = SearchReport::new();
        report.add_result(result("a.log", &["foo"]));
        report.add_result(result("b.log", &[]));
        report.add_result(result("c.log", &["foo one", "foo two"]));
        report
    }

    fn display() -> DisplayOptions {
        DisplayOptions {
            show_keys: true,
            extra_newlines: true,
            fit_to_width: false,
        }
    }

    fn render(mode: OutputMode, display: DisplayOptions, width: usize) -> String {
        let mut out = Vec::new();
        render_report(&report(), mode, display, width, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_full_report() {
        let text = render(OutputMode::Report, display(), 80);
        assert_eq!(
            text,
            "a.log (1 matches):\nfoo\n\nc.log (2 matches):\nfoo one\nfoo two\n\n"
        );
    }

    #[test]
    fn test_report_without_headers_or_separators() {
        let options = DisplayOptions {
            show_keys: false,
            extra_newlines: false,
            fit_to_width: false,
        };
        assert_eq!(render(OutputMode::Report, options, 80), "foo\nfoo one\nfoo two\n");
    }

    #[test]
    fn test_key_listing_includes_objects_without_matches() {
        let expected = "a.log\nb.log\nc.log\n";
        assert_eq!(render(OutputMode::KeysOnly, display(), 80), expected);
        assert_eq!(render(OutputMode::MatchingObjects, display(), 80), expected);
    }

    #[test]
    fn test_fit_to_width() {
        let options = DisplayOptions {
            fit_to_width: true,
            ..display()
        };
        let text = render(OutputMode::Report, options, 5);
        assert_eq!(
            text,
            "a.log (1 matches):\nfoo\n\nc.log (2 matches):\nfoo o\nfoo t\n\n"
        );
    }

    #[test]
    fn test_left_n() {
        assert_eq!(left_n("hello", 0), "hello");
        assert_eq!(left_n("hello", 3), "hel");
        assert_eq!(left_n("hello", 5), "hello");
        assert_eq!(left_n("hello", 50), "hello");
        assert_eq!(left_n("héllo", 2), "hé");
    }

    #[test]
    fn test_width_adjust_extends_limit() {
        let mut report = SearchReport::new();
        let mut r = result("a", &[]);
        r.items.push(ResultItem {
            text: "abcdefgh".to_string(),
            width_adjust: 3,
        });
        report.add_result(r);

        let options = DisplayOptions {
            show_keys: false,
            extra_newlines: false,
            fit_to_width: true,
        };
        let mut out = Vec::new();
        render_report(&report, OutputMode::Report, options, 4, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "abcdefg\n");
    }

    #[test]
    fn test_width_fallback_chain() {
        let no_tty = || Err(io::Error::other("not a tty"));
        assert_eq!(width_from(Ok((120, 40)), Some("90".to_string())), 120);
        assert_eq!(width_from(no_tty(), Some("90".to_string())), 90);
        assert_eq!(width_from(no_tty(), Some("zero".to_string())), DEFAULT_WIDTH);
        assert_eq!(width_from(no_tty(), Some("0".to_string())), DEFAULT_WIDTH);
        assert_eq!(width_from(no_tty(), None), DEFAULT_WIDTH);
        assert_eq!(width_from(Ok((0, 0)), None), DEFAULT_WIDTH);
    }
}
