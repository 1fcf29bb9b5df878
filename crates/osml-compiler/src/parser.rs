//! Recursive-descent parser.
//!
//! The token stream is collected up front and every construct is parsed
//! inside an explicit region bound (an exclusive token index). A block's
//! matching `]` is located by depth scan before its children are parsed,
//! so nested content can never run past its enclosing block, and an inline
//! marker only matches a closer inside its own region.

use crate::ast::{Block, Document, InlineSpan, ListItem, Node, SpanKind, TextRun};
use crate::error::{CompileError, ParseError, Position};
use crate::token::{MarkerKind, Token, TokenKind, tokenize};

/// Parse source text into a document tree.
pub fn parse(source: &str) -> Result<Document, CompileError> {
    let tokens = tokenize(source).collect::<Result<Vec<_>, _>>()?;
    let end = tokens.len();
    let mut parser = Parser { tokens, pos: 0 };
    let children = parser.parse_region(end)?;
    Ok(Document { children })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse nodes until `end` (exclusive). `self.pos == end` on return.
    fn parse_region(&mut self, end: usize) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();
        let mut text = TextBuilder::default();

        while self.pos < end {
            let token = self.tokens[self.pos].clone();
            match token.kind {
                TokenKind::Word(word) => {
                    text.push(&word);
                    self.pos += 1;
                }
                TokenKind::Escaped(c) => {
                    let mut buf = [0u8; 4];
                    text.push(c.encode_utf8(&mut buf));
                    self.pos += 1;
                }
                TokenKind::Whitespace | TokenKind::Newline => {
                    text.space();
                    self.pos += 1;
                }
                TokenKind::Open => {
                    text.flush_at_boundary(&mut nodes);
                    let block = self.parse_block(end, token.position)?;
                    nodes.push(Node::Block(block));
                }
                TokenKind::Close => {
                    return Err(ParseError::UnexpectedClose {
                        position: token.position,
                    }
                    .into());
                }
                TokenKind::Marker { kind, run } => match span_kind(kind) {
                    Some(span) => match self.find_marker(kind, run, self.pos + 1, end) {
                        Some(close) => {
                            text.flush_before_span(&mut nodes);
                            self.pos += 1;
                            let children = self.parse_region(close)?;
                            self.pos = close + 1;
                            nodes.push(Node::Span(InlineSpan {
                                kind: span,
                                children,
                            }));
                            text.after_span = true;
                        }
                        // Unmatched marker: the characters are plain text.
                        None => {
                            text.push(&kind.literal(run));
                            self.pos += 1;
                        }
                    },
                    None => {
                        text.flush_at_boundary(&mut nodes);
                        let item = self.parse_list_item(kind, run, token.position, end)?;
                        nodes.push(Node::ListItem(item));
                    }
                },
            }
        }

        text.flush_at_boundary(&mut nodes);
        Ok(nodes)
    }

    fn parse_block(&mut self, end: usize, position: Position) -> Result<Block, CompileError> {
        let close = self
            .find_block_close(self.pos + 1, end)
            .ok_or(ParseError::UnterminatedBlock { position })?;
        self.pos += 1;
        let keyword = self.take_keyword(close);
        let children = self.parse_region(close)?;
        self.pos = close + 1;
        Ok(Block {
            keyword,
            children,
            position,
        })
    }

    /// A block keyword is a leading `[A-Za-z0-9_]` word immediately
    /// followed by whitespace, a newline, or the block's `]`. Anything
    /// else makes the block anonymous and the word ordinary content.
    fn take_keyword(&mut self, close: usize) -> Option<String> {
        if self.pos >= close {
            return None;
        }
        let TokenKind::Word(word) = &self.tokens[self.pos].kind else {
            return None;
        };
        if !is_keyword(word) {
            return None;
        }
        let followed_ok = self.pos + 1 == close
            || matches!(
                self.tokens[self.pos + 1].kind,
                TokenKind::Whitespace | TokenKind::Newline
            );
        if !followed_ok {
            return None;
        }
        let keyword = word.clone();
        self.pos += 1;
        Some(keyword)
    }

    fn find_block_close(&self, from: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in from..end {
            match self.tokens[i].kind {
                TokenKind::Open => depth += 1,
                TokenKind::Close if depth == 0 => return Some(i),
                TokenKind::Close => depth -= 1,
                _ => {}
            }
        }
        None
    }

    /// Find the closing marker of an inline span: same kind and run
    /// length, at bracket depth 0 of the current region. A marker inside
    /// a nested block never closes a span opened outside it.
    fn find_marker(&self, kind: MarkerKind, run: usize, from: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in from..end {
            match self.tokens[i].kind {
                TokenKind::Open => depth += 1,
                TokenKind::Close if depth == 0 => return None,
                TokenKind::Close => depth -= 1,
                TokenKind::Marker { kind: k, run: r } if depth == 0 && k == kind && r == run => {
                    return Some(i);
                }
                _ => {}
            }
        }
        None
    }

    fn parse_list_item(
        &mut self,
        kind: MarkerKind,
        run: usize,
        position: Position,
        end: usize,
    ) -> Result<ListItem, CompileError> {
        self.pos += 1;
        let item_end = self.find_line_end(self.pos, end);
        let children = self.parse_region(item_end)?;
        self.pos = item_end;
        if self.pos < end && self.tokens[self.pos].kind == TokenKind::Newline {
            self.pos += 1;
        }
        let (ordered, depth) = match kind {
            MarkerKind::Ordered => (true, 1),
            _ => (false, run),
        };
        Ok(ListItem {
            ordered,
            depth,
            children,
            position,
        })
    }

    /// A list item owns the rest of its line; newlines inside nested
    /// blocks do not end the item.
    fn find_line_end(&self, from: usize, end: usize) -> usize {
        let mut depth = 0usize;
        for i in from..end {
            match self.tokens[i].kind {
                TokenKind::Open => depth += 1,
                TokenKind::Close if depth == 0 => return i,
                TokenKind::Close => depth -= 1,
                TokenKind::Newline if depth == 0 => return i,
                _ => {}
            }
        }
        end
    }
}

fn span_kind(kind: MarkerKind) -> Option<SpanKind> {
    match kind {
        MarkerKind::Bold => Some(SpanKind::Bold),
        MarkerKind::Italic => Some(SpanKind::Italic),
        MarkerKind::Underline => Some(SpanKind::Underline),
        MarkerKind::Strikethrough => Some(SpanKind::Strikethrough),
        MarkerKind::Unordered | MarkerKind::Ordered => None,
    }
}

fn is_keyword(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accumulates words into a single [`TextRun`], collapsing whitespace.
///
/// A pending space only materializes between inline content (words or
/// spans); at block and list boundaries it is dropped.
#[derive(Default)]
struct TextBuilder {
    buf: String,
    pending_space: bool,
    after_span: bool,
}

impl TextBuilder {
    fn push(&mut self, s: &str) {
        if self.pending_space && (!self.buf.is_empty() || self.after_span) {
            self.buf.push(' ');
        }
        self.pending_space = false;
        self.after_span = false;
        self.buf.push_str(s);
    }

    fn space(&mut self) {
        self.pending_space = true;
    }

    fn flush_before_span(&mut self, nodes: &mut Vec<Node>) {
        if self.pending_space && (!self.buf.is_empty() || self.after_span) {
            self.buf.push(' ');
        }
        self.pending_space = false;
        self.after_span = false;
        self.flush_buf(nodes);
    }

    fn flush_at_boundary(&mut self, nodes: &mut Vec<Node>) {
        self.pending_space = false;
        self.after_span = false;
        self.flush_buf(nodes);
    }

    fn flush_buf(&mut self, nodes: &mut Vec<Node>) {
        if !self.buf.is_empty() {
            nodes.push(Node::Text(TextRun {
                text: std::mem::take(&mut self.buf),
            }));
        }
    }
}
