//! Error taxonomy for the compile pipeline.
//!
//! Each stage has its own error type so callers can match on the stage that
//! failed; [`CompileError`] aggregates them for the single-call entry points.

use std::fmt;

use thiserror::Error;

/// 1-based line/column location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Tokenizer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// The source ends with a bare `\`.
    #[error("{position}: escape character at end of input")]
    TrailingEscape { position: Position },

    /// `\` followed by a character that is not escapable.
    #[error("{position}: `\\{found}` is not a valid escape sequence")]
    InvalidEscape { found: char, position: Position },
}

/// Parser errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `[` with no matching `]` before end of input.
    #[error("{position}: block is never closed")]
    UnterminatedBlock { position: Position },

    /// A `]` with no open block to close.
    #[error("{position}: `]` without a matching `[`")]
    UnexpectedClose { position: Position },
}

/// A keyword block failed to render.
///
/// Produced by the registry when no renderer is registered for a keyword,
/// and available to plugins for their own failures. The registry fills in
/// the keyword and block position on errors bubbling out of a plugin, so
/// plugin code only has to supply a reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: block `{keyword}`: {reason}")]
pub struct PluginError {
    pub keyword: String,
    pub reason: String,
    pub position: Position,
}

impl PluginError {
    /// Create a plugin failure with a reason only; keyword and position are
    /// attached by the renderer when the error leaves the block.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            keyword: String::new(),
            reason: reason.into(),
            position: Position::default(),
        }
    }

    pub(crate) fn unknown_keyword(keyword: &str, position: Position) -> Self {
        Self {
            keyword: keyword.to_owned(),
            reason: "no renderer registered for this keyword".to_owned(),
            position,
        }
    }

    pub(crate) fn for_block(mut self, keyword: &str, position: Position) -> Self {
        if self.keyword.is_empty() {
            self.keyword = keyword.to_owned();
        }
        if self.position == Position::default() {
            self.position = position;
        }
        self
    }
}

/// Renderer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A list item is nested more than one level below its predecessor,
    /// or a run of items starts deeper than level 1.
    #[error("{position}: list item at depth {depth} cannot follow depth {previous}")]
    ListDepth {
        depth: usize,
        previous: usize,
        position: Position,
    },
}

/// Any failure along the compile pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CompileError {
    /// Source position the error points at.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Lex(LexError::TrailingEscape { position })
            | Self::Lex(LexError::InvalidEscape { position, .. })
            | Self::Parse(ParseError::UnterminatedBlock { position })
            | Self::Parse(ParseError::UnexpectedClose { position })
            | Self::Plugin(PluginError { position, .. })
            | Self::Render(RenderError::ListDepth { position, .. }) => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 7).to_string(), "line 3, column 7");
    }

    #[test]
    fn test_compile_error_position() {
        let err = CompileError::from(ParseError::UnterminatedBlock {
            position: Position::new(2, 5),
        });
        assert_eq!(err.position(), Position::new(2, 5));
    }

    #[test]
    fn test_plugin_error_display() {
        let err = PluginError::unknown_keyword("video", Position::new(1, 1));
        assert_eq!(
            err.to_string(),
            "line 1, column 1: block `video`: no renderer registered for this keyword"
        );
    }
}
