//! HTML rendering.
//!
//! Walks the document tree depth-first and emits HTML. Text is escaped
//! here; plugin output is inserted verbatim. List items are grouped into
//! `<ul>`/`<ol>` containers at this stage, since items arrive from the
//! parser as flat siblings carrying their own depth.

use crate::ast::{Document, ListItem, Node};
use crate::error::{CompileError, RenderError};
use crate::plugin::{PluginRegistry, render_keyword_block};

/// Escape `&`, `<`, `>` and `"` for safe insertion into HTML text.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Tree-to-HTML renderer over a shared registry.
pub struct HtmlRenderer<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> HtmlRenderer<'a> {
    #[must_use]
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    pub fn render_document(&self, document: &Document) -> Result<String, CompileError> {
        self.render_nodes(&document.children)
    }

    /// Render a node list to an HTML fragment.
    pub fn render_nodes(&self, nodes: &[Node]) -> Result<String, CompileError> {
        let mut out = String::new();
        let mut i = 0;
        while i < nodes.len() {
            match &nodes[i] {
                Node::Text(run) => {
                    out.push_str(&escape_html(&run.text));
                    i += 1;
                }
                Node::Span(span) => {
                    let tag = span.kind.tag();
                    let inner = self.render_nodes(&span.children)?;
                    out.push_str(&format!("<{tag}>{inner}</{tag}>"));
                    i += 1;
                }
                Node::Block(block) => {
                    match &block.keyword {
                        // Anonymous blocks group without output of their own.
                        None => out.push_str(&self.render_nodes(&block.children)?),
                        Some(keyword) => {
                            out.push_str(&render_keyword_block(self.registry, block, keyword)?);
                        }
                    }
                    i += 1;
                }
                Node::ListItem(first) => {
                    let mut items: Vec<&ListItem> = Vec::new();
                    while let Some(Node::ListItem(item)) = nodes.get(i) {
                        if item.ordered != first.ordered {
                            break;
                        }
                        items.push(item);
                        i += 1;
                    }
                    self.render_list(&items, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    /// Render one run of consecutive items of the same list type.
    ///
    /// Depth may only grow by one step per item; a deeper item nests a
    /// fresh container inside the previous item's `<li>`.
    fn render_list(&self, items: &[&ListItem], out: &mut String) -> Result<(), CompileError> {
        let tag = if items[0].ordered { "ol" } else { "ul" };
        let mut depth = 0usize;
        for item in items {
            if item.depth > depth + 1 {
                return Err(RenderError::ListDepth {
                    depth: item.depth,
                    previous: depth,
                    position: item.position,
                }
                .into());
            }
            if item.depth == depth + 1 {
                out.push_str(&format!("<{tag}>"));
                depth += 1;
            } else {
                out.push_str("</li>");
                while depth > item.depth {
                    out.push_str(&format!("</{tag}></li>"));
                    depth -= 1;
                }
            }
            out.push_str("<li>");
            out.push_str(&self.render_nodes(&item.children)?);
        }
        out.push_str("</li>");
        while depth > 1 {
            out.push_str(&format!("</{tag}></li>"));
            depth -= 1;
        }
        out.push_str(&format!("</{tag}>"));
        Ok(())
    }
}
