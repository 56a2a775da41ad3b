//! Copy-and-minify pipeline for publishing a static site.
//!
//! Copies a source tree, a shared assets tree and a few top-level files into
//! a fresh output directory, then minifies every HTML and CSS file in place.

pub mod assets;
pub mod builder;
pub mod scan;
pub mod tree;

pub use assets::{
    minify_css, AssetKind, CssStrategy, HtmlMinifier, HtmlOptions, MinifyError, MinifyHtml,
};
pub use builder::{BuildConfig, BuildError, BuildResult, BuildStage, MinifiedFile, StaticBuilder};
pub use scan::find_files;
pub use tree::copy_tree;
