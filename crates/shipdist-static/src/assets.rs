//! Minifiers for the text assets rewritten in place after copying.
//!
//! CSS goes through a regex pass by default, with lightningcss available as an
//! opt-in parser-backed strategy. HTML is handed to an [`HtmlMinifier`], whose
//! default implementation wraps the `minify-html` crate.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Kind of asset rewritten during the minify pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Html,
    Css,
}

impl AssetKind {
    /// File name suffix selecting files of this kind.
    pub fn suffix(self) -> &'static str {
        match self {
            AssetKind::Html => ".html",
            AssetKind::Css => ".css",
        }
    }

    /// Short label used in progress lines.
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Html => "HTML",
            AssetKind::Css => "CSS",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised by a minifier.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    #[error("input is not valid UTF-8")]
    InvalidInput,

    #[error("minifier produced invalid UTF-8")]
    InvalidOutput,

    #[error("CSS parse error: {0}")]
    CssParse(String),

    #[error("CSS print error: {0}")]
    CssPrint(String),
}

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid block comment regex"));

// U+FEFF counts as whitespace so a leading byte-order mark is stripped.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x{FEFF}]+").expect("Invalid whitespace regex"));

static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\x{FEFF}]*([{}:;,])[\s\x{FEFF}]*").expect("Invalid punctuation regex")
});

/// Minify CSS with a fixed sequence of regex rewrites.
///
/// This is not a parser: braces or comment markers inside string literals
/// are rewritten like any other text. Never fails.
pub fn minify_css(css: &str) -> String {
    let css = BLOCK_COMMENT_RE.replace_all(css, "");
    let css = WHITESPACE_RE.replace_all(&css, " ");
    let css = PUNCTUATION_RE.replace_all(&css, "${1}");
    css.replace(";}", "}").trim().to_string()
}

/// Minify CSS using lightningcss.
pub fn minify_css_parsed(css: &str) -> Result<String, MinifyError> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| MinifyError::CssParse(e.to_string()))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| MinifyError::CssPrint(e.to_string()))?;

    Ok(minified.code)
}

/// How `.css` files are minified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssStrategy {
    /// Regex whitespace/comment stripping ([`minify_css`]).
    #[default]
    Regex,

    /// Full parse and reprint through lightningcss.
    Lightningcss,
}

impl CssStrategy {
    pub fn minify(self, css: &str) -> Result<String, MinifyError> {
        match self {
            CssStrategy::Regex => Ok(minify_css(css)),
            CssStrategy::Lightningcss => minify_css_parsed(css),
        }
    }
}

/// What the build asks of an HTML minifier.
///
/// Whitespace collapsing and removal of `type` attributes on `<script>`,
/// `<style>` and stylesheet `<link>` tags are always on; minify-html has no
/// switch for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlOptions {
    pub remove_comments: bool,
    pub remove_redundant_attributes: bool,
    pub minify_css: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            remove_comments: true,
            remove_redundant_attributes: true,
            minify_css: true,
        }
    }
}

/// Trait for HTML minification backends.
pub trait HtmlMinifier: Send + Sync {
    /// Backend identifier (e.g., "minify-html")
    fn name(&self) -> &'static str;

    /// Minify a complete HTML document.
    fn minify(&self, html: &str) -> Result<String, MinifyError>;
}

/// [`HtmlMinifier`] backed by the `minify-html` crate.
#[derive(Debug, Clone, Default)]
pub struct MinifyHtml {
    options: HtmlOptions,
}

impl MinifyHtml {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    /// Map the requested options onto a `minify_html` configuration.
    fn cfg(&self) -> minify_html::Cfg {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_html_and_head_opening_tags = true;
        cfg.keep_comments = !self.options.remove_comments;
        cfg.keep_input_type_text_attr = !self.options.remove_redundant_attributes;
        cfg.minify_css = self.options.minify_css;
        cfg.minify_js = false;
        cfg
    }
}

impl HtmlMinifier for MinifyHtml {
    fn name(&self) -> &'static str {
        "minify-html"
    }

    fn minify(&self, html: &str) -> Result<String, MinifyError> {
        let minified = minify_html::minify(html.as_bytes(), &self.cfg());
        String::from_utf8(minified).map_err(|_| MinifyError::InvalidOutput)
    }
}
