//! Pluggable keyword-block renderers.
//!
//! Every `[keyword ...]` block is rendered by the [`BlockRenderer`]
//! registered for its keyword. The registry is assembled during setup and
//! then shared immutably; registration requires `&mut`, so a registry in
//! use by concurrent compiles cannot change under them.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{Block, Node, plain_text};
use crate::error::{CompileError, PluginError};
use crate::render::{HtmlRenderer, escape_html};

/// Renders one keyword block to an HTML fragment.
///
/// The returned string is inserted into the output verbatim; renderers
/// are responsible for escaping any raw text they emit (use
/// [`escape_html`], or [`RenderContext::render_children`] which escapes
/// text nodes itself).
pub trait BlockRenderer: Send + Sync {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Result<String, CompileError>;
}

impl<F> BlockRenderer for F
where
    F: Fn(&Block, &RenderContext<'_>) -> Result<String, CompileError> + Send + Sync,
{
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Result<String, CompileError> {
        self(block, ctx)
    }
}

/// What a renderer gets to work with besides the block itself.
pub struct RenderContext<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    /// Render child nodes to HTML through the full pipeline, including
    /// nested keyword blocks.
    pub fn render_children(&self, nodes: &[Node]) -> Result<String, CompileError> {
        HtmlRenderer::new(self.registry).render_nodes(nodes)
    }

    /// The raw text of the child nodes, formatting stripped, unescaped.
    #[must_use]
    pub fn plain_text(&self, nodes: &[Node]) -> String {
        plain_text(nodes)
    }
}

/// Keyword → renderer map. Later registrations shadow earlier ones.
#[derive(Default)]
pub struct PluginRegistry {
    renderers: HashMap<String, Box<dyn BlockRenderer>>,
}

impl PluginRegistry {
    /// An empty registry with no keywords at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in `section`, `title` and
    /// `code` renderers.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("section", SectionRenderer);
        registry.register("title", TitleRenderer);
        registry.register("code", CodeRenderer);
        registry
    }

    /// Register a renderer for `keyword`, replacing any existing one.
    pub fn register(&mut self, keyword: impl Into<String>, renderer: impl BlockRenderer + 'static) {
        self.renderers.insert(keyword.into(), Box::new(renderer));
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_renderer(
        mut self,
        keyword: impl Into<String>,
        renderer: impl BlockRenderer + 'static,
    ) -> Self {
        self.register(keyword, renderer);
        self
    }

    #[must_use]
    pub fn resolve(&self, keyword: &str) -> Option<&dyn BlockRenderer> {
        self.renderers.get(keyword).map(Box::as_ref)
    }

    #[must_use]
    pub fn contains(&self, keyword: &str) -> bool {
        self.renderers.contains_key(keyword)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keywords: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        f.debug_struct("PluginRegistry")
            .field("keywords", &keywords)
            .finish()
    }
}

/// `[section ...]` → `<div class="section">...</div>`.
struct SectionRenderer;

impl BlockRenderer for SectionRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Result<String, CompileError> {
        Ok(format!(
            "<div class=\"section\">{}</div>",
            ctx.render_children(&block.children)?
        ))
    }
}

/// `[title ...]` → `<h1>...</h1>`.
struct TitleRenderer;

impl BlockRenderer for TitleRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Result<String, CompileError> {
        Ok(format!("<h1>{}</h1>", ctx.render_children(&block.children)?))
    }
}

/// `[code ...]` → `<pre><code>...</code></pre>` around the escaped plain
/// text of the content; markup inside is not interpreted.
struct CodeRenderer;

impl BlockRenderer for CodeRenderer {
    fn render(&self, block: &Block, ctx: &RenderContext<'_>) -> Result<String, CompileError> {
        Ok(format!(
            "<pre><code>{}</code></pre>",
            escape_html(&ctx.plain_text(&block.children))
        ))
    }
}

/// Resolve and run the renderer for a keyword block. Unknown keywords are
/// a [`PluginError`]; errors out of a plugin get the keyword and block
/// position attached if the plugin did not set them.
pub(crate) fn render_keyword_block(
    registry: &PluginRegistry,
    block: &Block,
    keyword: &str,
) -> Result<String, CompileError> {
    let renderer = registry
        .resolve(keyword)
        .ok_or_else(|| PluginError::unknown_keyword(keyword, block.position))?;
    let ctx = RenderContext::new(registry);
    renderer.render(block, &ctx).map_err(|err| match err {
        CompileError::Plugin(plugin) => {
            CompileError::Plugin(plugin.for_block(keyword, block.position))
        }
        other => other,
    })
}
