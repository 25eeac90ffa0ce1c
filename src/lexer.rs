//! Line tokenizer.
//!
//! Turns raw text into the comment-free, blank-free line list the tree builder
//! consumes. Tabs expand to two spaces before anything else happens, so a tab counts
//! as one indentation level.
//!
//! All scanning in this module tracks an "inside quotes" flag: a `#`, `=` or `,`
//! between a pair of `"` characters is literal text, not syntax.
//!
//! ```rust
//! use flowdoc::lexer::tokenize;
//!
//! let lines = tokenize("# header\nname = \"A # 1\"  # trailing\n\n\tport = 80\n");
//! assert_eq!(lines.len(), 2);
//! assert_eq!(lines[0].content, "name = \"A # 1\"");
//! assert_eq!(lines[1].level(), 1);
//! ```

/// One significant source line.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// 1-based line number in the original text.
    pub number: usize,
    /// Line text with comments and trailing whitespace removed, leading indentation kept.
    pub content: String,
    /// A `"` was opened on this line and never closed.
    pub open_quote: bool,
}

impl Line {
    /// Number of leading whitespace characters.
    #[must_use]
    pub fn leading_spaces(&self) -> usize {
        self.content.chars().take_while(|c| c.is_whitespace()).count()
    }

    /// Indentation level; two spaces per level, odd remainders round down.
    #[inline]
    #[must_use]
    pub fn level(&self) -> usize {
        self.leading_spaces() / 2
    }

    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.content.trim()
    }
}

/// Normalizes raw text into significant lines.
///
/// Steps: expand tabs, split on line breaks, cut each line at its first unquoted `#`,
/// right-trim, drop lines that end up empty.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Line> {
    let expanded = text.replace('\t', "  ");
    expanded
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let (content, open_quote) = strip_comment(raw);
            let content = content.trim_end();
            if content.trim().is_empty() {
                None
            } else {
                Some(Line {
                    number: idx + 1,
                    content: content.to_string(),
                    open_quote,
                })
            }
        })
        .collect()
}

/// Returns the part of `line` before its first unquoted `#`, and whether a quote
/// was still open when the scan stopped.
///
/// ```rust
/// use flowdoc::lexer::strip_comment;
///
/// assert_eq!(strip_comment("a = 1 # note"), ("a = 1 ", false));
/// assert_eq!(strip_comment("a = \"#1\""), ("a = \"#1\"", false));
/// assert_eq!(strip_comment("a = \"open"), ("a = \"open", true));
/// ```
#[must_use]
pub fn strip_comment(line: &str) -> (&str, bool) {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return (&line[..idx], false),
            _ => {}
        }
    }
    (line, in_quotes)
}

/// Byte offset of the first occurrence of `needle` outside a quoted run.
///
/// ```rust
/// use flowdoc::lexer::find_unquoted;
///
/// assert_eq!(find_unquoted("key = value", '='), Some(4));
/// assert_eq!(find_unquoted("\"a=b\" = c", '='), Some(6));
/// assert_eq!(find_unquoted("no separator", '='), None);
/// ```
#[must_use]
pub fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in s.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return Some(idx);
        }
    }
    None
}

/// Splits `s` on every `delim` that is neither quoted nor nested inside `[...]`.
///
/// Pieces are returned untrimmed. An empty input yields a single empty piece.
///
/// ```rust
/// use flowdoc::lexer::split_top_level;
///
/// assert_eq!(split_top_level("a, b", ','), vec!["a", " b"]);
/// assert_eq!(split_top_level("[1, 2], \"x, y\"", ','), vec!["[1, 2]", " \"x, y\""]);
/// ```
#[must_use]
pub fn split_top_level(s: &str, delim: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth = depth.saturating_sub(1),
            c if c == delim && !in_quotes && depth == 0 => {
                pieces.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&s[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_blank_and_comment_lines() {
        let lines = tokenize("\n# only a comment\n   \nkey = 1\n   # indented comment\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].content, "key = 1");
        assert_eq!(lines[0].number, 4);
    }

    #[test]
    fn test_tabs_expand_to_one_level() {
        let lines = tokenize("server:\n\tport = 80\n\t\tdeep = true");
        assert_eq!(lines[1].content, "  port = 80");
        assert_eq!(lines[1].level(), 1);
        assert_eq!(lines[2].level(), 2);
    }

    #[test]
    fn test_trailing_whitespace_trimmed_leading_kept() {
        let lines = tokenize("    name = x   \r\n");
        assert_eq!(lines[0].content, "    name = x");
        assert_eq!(lines[0].leading_spaces(), 4);
        assert_eq!(lines[0].trimmed(), "name = x");
    }

    #[test]
    fn test_odd_indent_rounds_down() {
        let lines = tokenize("   a = 1");
        assert_eq!(lines[0].level(), 1);
    }

    #[test]
    fn test_hash_inside_quotes_is_kept() {
        let lines = tokenize("color = \"#ff0000\" # red");
        assert_eq!(lines[0].content, "color = \"#ff0000\"");
        assert!(!lines[0].open_quote);
    }

    #[test]
    fn test_unterminated_quote_flagged() {
        let lines = tokenize("title = \"never closed # still text");
        assert!(lines[0].open_quote);
        assert_eq!(lines[0].content, "title = \"never closed # still text");
    }

    #[test]
    fn test_split_top_level_nested_brackets() {
        let pieces = split_top_level("[a, b], [c], d", ',');
        assert_eq!(pieces, vec!["[a, b]", " [c]", " d"]);
    }

    #[test]
    fn test_split_top_level_empty_pieces() {
        assert_eq!(split_top_level("a,,b", ','), vec!["a", "", "b"]);
        assert_eq!(split_top_level("", ','), vec![""]);
    }
}
