//! Document tree produced by the parser.

use crate::error::Position;

/// A parsed document: the root anonymous container. Inline content is
/// legal at the top level, so the children are arbitrary nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Block(Block),
    Text(TextRun),
    Span(InlineSpan),
    ListItem(ListItem),
}

/// A `[...]` block. `keyword` is `None` for anonymous blocks, which group
/// their children without any output of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub keyword: Option<String>,
    pub children: Vec<Node>,
    /// Position of the opening `[`.
    pub position: Position,
}

/// Literal text with whitespace already collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl SpanKind {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Strikethrough => "s",
        }
    }
}

/// An inline formatting span with recursively parsed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub kind: SpanKind,
    pub children: Vec<Node>,
}

/// One list item line. Items carry their own depth; grouping into list
/// containers happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub ordered: bool,
    pub depth: usize,
    pub children: Vec<Node>,
    /// Position of the marker.
    pub position: Position,
}

/// Concatenated raw text of a node list, formatting and structure
/// stripped. Used by plugins that treat their content as opaque text.
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    let mut text = String::new();
    collect_text(nodes, &mut text);
    text
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(run) => out.push_str(&run.text),
            Node::Span(span) => collect_text(&span.children, out),
            Node::Block(block) => collect_text(&block.children, out),
            Node::ListItem(item) => collect_text(&item.children, out),
        }
    }
}
