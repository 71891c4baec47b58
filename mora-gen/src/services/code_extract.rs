//! Code extraction and structural syntax check
//!
//! Synthesizer responses are expected to wrap code in `<code>…</code>`.
//! Extraction is permissive: a response without the delimiter is used as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static CODE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<code>(.*?)</code>").expect("valid regex"));

/// Extract the code regions of a synthesizer response
///
/// All `<code>` regions are joined with a blank line and trimmed. Without any
/// region the whole response is returned unchanged.
pub fn extract_code_from_tags(text: &str) -> String {
    let regions: Vec<&str> = CODE_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    if regions.is_empty() {
        return text.to_string();
    }

    regions.join("\n\n").trim().to_string()
}

/// Location and reason of a structural syntax problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error at line {}: {}", self.line, self.message)
    }
}

/// Structural check of Python source
///
/// Verifies bracket balance and string termination (single, double and
/// triple-quoted), ignoring `#` comments. This is not a parser: it catches
/// truncated or garbled output, not semantic errors.
pub fn check_python_structure(code: &str) -> Result<(), SyntaxIssue> {
    let chars: Vec<char> = code.chars().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => line += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '\'' | '"' => {
                let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                i = if triple {
                    skip_triple_quoted(&chars, i, c, &mut line)?
                } else {
                    skip_quoted(&chars, i, c, line)?
                };
                continue;
            }
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_line)) => {
                        return Err(SyntaxIssue {
                            line,
                            message: format!(
                                "closing '{}' does not match '{}' opened on line {}",
                                c, open, open_line
                            ),
                        });
                    }
                    None => {
                        return Err(SyntaxIssue {
                            line,
                            message: format!("unmatched '{}'", c),
                        });
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    if let Some((open, open_line)) = stack.pop() {
        return Err(SyntaxIssue {
            line: open_line,
            message: format!("'{}' was never closed", open),
        });
    }

    Ok(())
}

/// Skip a single-line string starting at `start`; returns the index after it
fn skip_quoted(chars: &[char], start: usize, quote: char, line: usize) -> Result<usize, SyntaxIssue> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' => break,
            c if c == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(SyntaxIssue {
        line,
        message: "unterminated string literal".to_string(),
    })
}

/// Skip a triple-quoted string starting at `start`, counting newlines
fn skip_triple_quoted(
    chars: &[char],
    start: usize,
    quote: char,
    line: &mut usize,
) -> Result<usize, SyntaxIssue> {
    let open_line = *line;
    let mut i = start + 3;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if chars.get(i + 1) == Some(&'\n') {
                    *line += 1;
                }
                i += 2;
            }
            '\n' => {
                *line += 1;
                i += 1;
            }
            c if c == quote
                && chars.get(i + 1) == Some(&quote)
                && chars.get(i + 2) == Some(&quote) =>
            {
                return Ok(i + 3);
            }
            _ => i += 1,
        }
    }
    Err(SyntaxIssue {
        line: open_line,
        message: "unterminated triple-quoted string literal".to_string(),
    })
}
