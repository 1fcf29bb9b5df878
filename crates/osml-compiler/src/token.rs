//! Tokenizer.
//!
//! Produces a lazy stream of [`Token`]s from source text. Tokenization is
//! context-free apart from one bit of line state: `+` and `=` are list
//! markers only at the start of a line (leading whitespace allowed),
//! anywhere else they are ordinary word characters.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{LexError, Position};

/// Characters that may follow a `\` escape.
const ESCAPABLE: [char; 9] = ['[', ']', '*', '/', '_', '~', '+', '=', '\\'];

/// What a marker token means once matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    /// Line-leading `+` run; the run length is the nesting depth.
    Unordered,
    /// Line-leading `=` run; ordered lists have a single depth.
    Ordered,
}

impl MarkerKind {
    /// Whether this marker opens/closes an inline span (as opposed to a
    /// list item).
    #[must_use]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Bold | Self::Italic | Self::Underline | Self::Strikethrough
        )
    }

    /// The literal source text of a marker with the given run length.
    /// Used when an unmatched inline marker falls back to plain text.
    pub(crate) fn literal(self, run: usize) -> String {
        let unit = match self {
            Self::Bold => "*",
            Self::Italic => "/",
            Self::Underline => "_",
            Self::Strikethrough => "~~",
            Self::Unordered => "+",
            Self::Ordered => "=",
        };
        unit.repeat(run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `[`
    Open,
    /// `]`
    Close,
    /// A maximal run of non-special characters.
    Word(String),
    /// A run of spaces/tabs (no newline).
    Whitespace,
    /// A single `\n`.
    Newline,
    /// A run of marker characters. For `Strikethrough` the run counts `~~`
    /// pairs, for the others it counts single characters.
    Marker { kind: MarkerKind, run: usize },
    /// A `\`-escaped character, always literal text.
    Escaped(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Tokenize source text. The returned iterator yields
/// `Result<Token, LexError>` and stops after the first error.
#[must_use]
pub fn tokenize(source: &str) -> Tokens<'_> {
    Tokens {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        at_line_start: true,
        queued: None,
        failed: false,
    }
}

/// Lazy token stream over a source string.
pub struct Tokens<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    at_line_start: bool,
    /// Holds the odd leftover `~` of a tilde run.
    queued: Option<Token>,
    failed: bool,
}

impl Tokens<'_> {
    fn position(&mut self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume a run of `target` characters, returning its length.
    fn take_run(&mut self, target: char) -> usize {
        let mut run = 0;
        while self.chars.peek() == Some(&target) {
            self.bump();
            run += 1;
        }
        run
    }

    fn word(&mut self, first: char) -> TokenKind {
        let mut word = String::new();
        word.push(first);
        while let Some(&c) = self.chars.peek() {
            if is_special(c) {
                break;
            }
            self.bump();
            word.push(c);
        }
        TokenKind::Word(word)
    }

    fn escape(&mut self, position: Position) -> Result<TokenKind, LexError> {
        match self.bump() {
            Some(c) if ESCAPABLE.contains(&c) => Ok(TokenKind::Escaped(c)),
            Some(c) => Err(LexError::InvalidEscape { found: c, position }),
            None => Err(LexError::TrailingEscape { position }),
        }
    }

    /// A run of `n` tildes: every `~~` pair is one strikethrough marker
    /// unit; a leftover odd tilde is literal text.
    fn tildes(&mut self) -> TokenKind {
        let position = self.position();
        self.bump();
        let n = 1 + self.take_run('~');
        if n == 1 {
            return TokenKind::Word("~".to_owned());
        }
        if n % 2 == 1 {
            self.queued = Some(Token {
                kind: TokenKind::Word("~".to_owned()),
                position,
            });
        }
        TokenKind::Marker {
            kind: MarkerKind::Strikethrough,
            run: n / 2,
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(token) = self.queued.take() {
            return Some(Ok(token));
        }

        let position = self.position();
        let c = *self.chars.peek()?;

        let kind = match c {
            '[' => {
                self.bump();
                TokenKind::Open
            }
            ']' => {
                self.bump();
                TokenKind::Close
            }
            '\n' => {
                self.bump();
                TokenKind::Newline
            }
            ' ' | '\t' | '\r' => {
                while matches!(self.chars.peek(), Some(' ' | '\t' | '\r')) {
                    self.bump();
                }
                TokenKind::Whitespace
            }
            '\\' => {
                self.bump();
                match self.escape(position) {
                    Ok(kind) => kind,
                    Err(err) => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                }
            }
            '*' => TokenKind::Marker {
                kind: MarkerKind::Bold,
                run: self.take_run('*'),
            },
            '/' => TokenKind::Marker {
                kind: MarkerKind::Italic,
                run: self.take_run('/'),
            },
            '_' => TokenKind::Marker {
                kind: MarkerKind::Underline,
                run: self.take_run('_'),
            },
            '~' => self.tildes(),
            '+' if self.at_line_start => TokenKind::Marker {
                kind: MarkerKind::Unordered,
                run: self.take_run('+'),
            },
            '=' if self.at_line_start => TokenKind::Marker {
                kind: MarkerKind::Ordered,
                run: self.take_run('='),
            },
            _ => {
                self.bump();
                self.word(c)
            }
        };

        self.at_line_start = match kind {
            TokenKind::Newline => true,
            TokenKind::Whitespace => self.at_line_start,
            _ => false,
        };

        Some(Ok(Token { kind, position }))
    }
}

/// Characters that terminate a word.
fn is_special(c: char) -> bool {
    matches!(
        c,
        '[' | ']' | '\\' | '*' | '/' | '_' | '~' | '\n' | ' ' | '\t' | '\r'
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .map(|t| t.unwrap().kind)
            .collect()
    }

    fn word(s: &str) -> TokenKind {
        TokenKind::Word(s.to_owned())
    }

    #[test]
    fn test_brackets_and_words() {
        assert_eq!(
            kinds("[title Hello]"),
            vec![
                TokenKind::Open,
                word("title"),
                TokenKind::Whitespace,
                word("Hello"),
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let tokens: Vec<Token> = tokenize("ab\n[x").map(Result::unwrap).collect();
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(1, 3)); // newline
        assert_eq!(tokens[2].position, Position::new(2, 1)); // [
        assert_eq!(tokens[3].position, Position::new(2, 2)); // x
    }

    #[test]
    fn test_inline_markers_carry_run_length() {
        assert_eq!(
            kinds("**x**"),
            vec![
                TokenKind::Marker {
                    kind: MarkerKind::Bold,
                    run: 2
                },
                word("x"),
                TokenKind::Marker {
                    kind: MarkerKind::Bold,
                    run: 2
                },
            ]
        );
    }

    #[test]
    fn test_strikethrough_counts_pairs() {
        assert_eq!(
            kinds("~~x~~"),
            vec![
                TokenKind::Marker {
                    kind: MarkerKind::Strikethrough,
                    run: 1
                },
                word("x"),
                TokenKind::Marker {
                    kind: MarkerKind::Strikethrough,
                    run: 1
                },
            ]
        );
    }

    #[test]
    fn test_lone_tilde_is_text() {
        assert_eq!(
            kinds("a ~ b"),
            vec![
                word("a"),
                TokenKind::Whitespace,
                word("~"),
                TokenKind::Whitespace,
                word("b"),
            ]
        );
    }

    #[test]
    fn test_odd_tilde_run_leaves_a_literal() {
        assert_eq!(
            kinds("~~~"),
            vec![
                TokenKind::Marker {
                    kind: MarkerKind::Strikethrough,
                    run: 1
                },
                word("~"),
            ]
        );
    }

    #[test]
    fn test_list_markers_only_at_line_start() {
        assert_eq!(
            kinds("+ a + b"),
            vec![
                TokenKind::Marker {
                    kind: MarkerKind::Unordered,
                    run: 1
                },
                TokenKind::Whitespace,
                word("a"),
                TokenKind::Whitespace,
                word("+"),
                TokenKind::Whitespace,
                word("b"),
            ]
        );
    }

    #[test]
    fn test_list_marker_after_leading_whitespace() {
        assert_eq!(
            kinds("  ++ x"),
            vec![
                TokenKind::Whitespace,
                TokenKind::Marker {
                    kind: MarkerKind::Unordered,
                    run: 2
                },
                TokenKind::Whitespace,
                word("x"),
            ]
        );
    }

    #[test]
    fn test_equals_marker_and_midline_equals() {
        assert_eq!(
            kinds("= a=b"),
            vec![
                TokenKind::Marker {
                    kind: MarkerKind::Ordered,
                    run: 1
                },
                TokenKind::Whitespace,
                word("a=b"),
            ]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            kinds(r"\[ \] \* \\"),
            vec![
                TokenKind::Escaped('['),
                TokenKind::Whitespace,
                TokenKind::Escaped(']'),
                TokenKind::Whitespace,
                TokenKind::Escaped('*'),
                TokenKind::Whitespace,
                TokenKind::Escaped('\\'),
            ]
        );
    }

    #[test]
    fn test_consecutive_backslashes_escape_pairwise() {
        assert_eq!(
            kinds(r"\\\["),
            vec![TokenKind::Escaped('\\'), TokenKind::Escaped('[')]
        );
    }

    #[test]
    fn test_trailing_escape_is_an_error() {
        let err = tokenize("abc\\").last().unwrap().unwrap_err();
        assert_eq!(
            err,
            LexError::TrailingEscape {
                position: Position::new(1, 4)
            }
        );
    }

    #[test]
    fn test_invalid_escape_is_an_error() {
        let err = tokenize(r"\a").next().unwrap().unwrap_err();
        assert_eq!(
            err,
            LexError::InvalidEscape {
                found: 'a',
                position: Position::new(1, 1)
            }
        );
    }

    #[test]
    fn test_stream_stops_after_error() {
        let results: Vec<_> = tokenize(r"\a more").collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
