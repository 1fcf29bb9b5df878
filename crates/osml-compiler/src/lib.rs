//! OSML compiler.
//!
//! OSML is a bracket-delimited markup language: `[keyword ...]` blocks,
//! `*bold*` / `/italic/` / `_underline_` / `~~strikethrough~~` inline
//! spans, and line-leading `+` / `=` list items. This crate compiles OSML
//! source to HTML through a fixed pipeline: tokenizer → parser → plugin
//! registry → renderer.
//!
//! ```
//! use osml_compiler::{PluginRegistry, compile};
//!
//! let registry = PluginRegistry::with_builtins();
//! let html = compile("[title Hello] *world*", &registry)?;
//! assert_eq!(html, "<h1>Hello</h1><b>world</b>");
//! # Ok::<(), osml_compiler::CompileError>(())
//! ```
//!
//! Keyword blocks are rendered by pluggable [`BlockRenderer`]s; see
//! [`PluginRegistry`]. The registry is shared by reference, so one
//! registry can serve many concurrent compiles.

mod ast;
mod error;
mod parser;
mod plugin;
mod render;
mod token;

pub use ast::{Block, Document, InlineSpan, ListItem, Node, SpanKind, TextRun, plain_text};
pub use error::{CompileError, LexError, ParseError, PluginError, Position, RenderError};
pub use parser::parse;
pub use plugin::{BlockRenderer, PluginRegistry, RenderContext};
pub use render::{HtmlRenderer, escape_html};
pub use token::{MarkerKind, Token, TokenKind, Tokens, tokenize};

/// Compile OSML source to an HTML body fragment.
pub fn compile(source: &str, registry: &PluginRegistry) -> Result<String, CompileError> {
    let document = parse(source)?;
    HtmlRenderer::new(registry).render_document(&document)
}

/// Extra material spliced into the page shell by [`compile_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Raw HTML inserted into `<head>`.
    pub head_insert: String,
    /// Raw HTML inserted at the top of `<body>`, before the compiled
    /// content.
    pub body_insert: String,
}

/// Compile OSML source to a complete HTML page.
pub fn compile_page(
    source: &str,
    registry: &PluginRegistry,
    options: &PageOptions,
) -> Result<String, CompileError> {
    let body = compile(source, registry)?;
    Ok(format!(
        "<html><head>{}</head><body>{}{}</body></html>",
        options.head_insert, options.body_insert, body
    ))
}
