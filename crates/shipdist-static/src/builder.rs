//! Build orchestration: clean, copy, minify.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::assets::{AssetKind, CssStrategy, HtmlMinifier, MinifyError, MinifyHtml};
use crate::scan::find_files;
use crate::tree::copy_tree;

/// Configuration for building the distribution directory.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; relative paths below are resolved against it
    pub root: PathBuf,

    /// Primary source tree, copied to the output root
    pub source_dir: PathBuf,

    /// Shared assets tree, copied under `shared_mount`
    pub shared_dir: PathBuf,

    /// Output directory, recreated on every build
    pub output_dir: PathBuf,

    /// Subdirectory of the output receiving the shared tree
    pub shared_mount: PathBuf,

    /// Top-level files copied to the output root when present
    pub aux_files: Vec<String>,

    /// Minify HTML/CSS after copying
    pub minify: bool,

    /// How CSS files are minified
    pub css: CssStrategy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            shared_dir: PathBuf::from("shared"),
            output_dir: PathBuf::from("dist"),
            shared_mount: PathBuf::from("shared"),
            aux_files: vec!["_redirects".to_string(), "_headers".to_string()],
            minify: true,
            css: CssStrategy::default(),
        }
    }
}

impl BuildConfig {
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    pub fn shared_path(&self) -> PathBuf {
        self.root.join(&self.shared_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }
}

/// Stage of a build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Clean,
    Copying,
    Minifying,
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Clean => "clean",
            BuildStage::Copying => "copy",
            BuildStage::Minifying => "minify",
            BuildStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A file rewritten by the minify pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifiedFile {
    /// Path relative to the output directory
    pub path: PathBuf,

    pub kind: AssetKind,
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Output directory
    pub output_dir: PathBuf,

    /// Number of files copied (source, shared and auxiliary)
    pub copied_files: usize,

    /// Minified files, HTML first, in processing order
    pub minified: Vec<MinifiedFile>,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

impl BuildResult {
    /// Number of minified files of the given kind.
    pub fn count(&self, kind: AssetKind) -> usize {
        self.minified.iter().filter(|f| f.kind == kind).count()
    }
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Failed to {op} {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to minify {}: {message}", path.display())]
    Minification { path: PathBuf, message: String },

    #[error("Output directory {} overlaps {}", output.display(), input.display())]
    OutputOverlap { output: PathBuf, input: PathBuf },
}

impl BuildError {
    /// Adapter for `map_err` on filesystem calls.
    pub(crate) fn io(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> BuildError {
        let path = path.to_path_buf();
        move |source| BuildError::Io { op, path, source }
    }

    pub(crate) fn walk(root: &Path, err: walkdir::Error) -> BuildError {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        BuildError::Io {
            op: "read directory",
            path,
            source: err.into(),
        }
    }

    fn minify(path: &Path, err: MinifyError) -> BuildError {
        BuildError::Minification {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Builds the distribution directory.
pub struct StaticBuilder {
    config: BuildConfig,
    html: Arc<dyn HtmlMinifier>,
}

impl StaticBuilder {
    /// Create a new builder using the default HTML minifier.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            html: Arc::new(MinifyHtml::default()),
        }
    }

    /// Replace the HTML minifier.
    pub fn with_html_minifier(mut self, minifier: impl HtmlMinifier + 'static) -> Self {
        self.html = Arc::new(minifier);
        self
    }

    /// Build the distribution directory.
    ///
    /// Stages run strictly in order and the first error aborts the build,
    /// leaving whatever output was already written.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let output_dir = self.config.output_path();

        self.preflight()?;

        self.clean(&output_dir)
            .inspect_err(|e| log_failure(BuildStage::Clean, e))?;

        let copied_files = self
            .copy(&output_dir)
            .inspect_err(|e| log_failure(BuildStage::Copying, e))?;

        let mut minified = Vec::new();
        if self.config.minify {
            self.minify(&output_dir, &mut minified)
                .await
                .inspect_err(|e| log_failure(BuildStage::Minifying, e))?;
        } else {
            tracing::debug!("Minification disabled");
        }

        tracing::debug!("Entering {} stage", BuildStage::Done);

        Ok(BuildResult {
            output_dir,
            copied_files,
            minified,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Check the inputs before the output is touched.
    ///
    /// Both input trees must exist, and the output must neither contain the
    /// project root or an input tree nor sit inside an input tree.
    fn preflight(&self) -> Result<(), BuildError> {
        let inputs = [self.config.source_path(), self.config.shared_path()];

        for dir in &inputs {
            if !dir.is_dir() {
                return Err(BuildError::SourceMissing { path: dir.clone() });
            }
        }

        let output = normalize(&self.config.output_path())?;

        let root = normalize(&self.config.root)?;
        if root.starts_with(&output) {
            return Err(BuildError::OutputOverlap {
                output,
                input: root,
            });
        }

        for dir in &inputs {
            let input = normalize(dir)?;
            if input.starts_with(&output) || output.starts_with(&input) {
                return Err(BuildError::OutputOverlap { output, input });
            }
        }

        Ok(())
    }

    fn clean(&self, output_dir: &Path) -> Result<(), BuildError> {
        tracing::debug!("Entering {} stage", BuildStage::Clean);

        if output_dir.exists() {
            fs::remove_dir_all(output_dir).map_err(BuildError::io("remove", output_dir))?;
            tracing::debug!("Removed {}", output_dir.display());
        }

        Ok(())
    }

    fn copy(&self, output_dir: &Path) -> Result<usize, BuildError> {
        tracing::debug!("Entering {} stage", BuildStage::Copying);

        let mut copied = copy_tree(&self.config.source_path(), output_dir)?;

        copied += copy_tree(
            &self.config.shared_path(),
            &output_dir.join(&self.config.shared_mount),
        )?;

        for name in &self.config.aux_files {
            let source = self.config.root.join(name);
            if !source.exists() {
                tracing::debug!("Skipping missing auxiliary file {}", name);
                continue;
            }

            let Some(file_name) = Path::new(name).file_name() else {
                tracing::warn!("Ignoring auxiliary file without a name: {}", name);
                continue;
            };

            let target = output_dir.join(file_name);
            fs::copy(&source, &target).map_err(BuildError::io("copy", &source))?;
            copied += 1;
        }

        Ok(copied)
    }

    async fn minify(
        &self,
        output_dir: &Path,
        minified: &mut Vec<MinifiedFile>,
    ) -> Result<(), BuildError> {
        tracing::debug!(
            "Entering {} stage using {}",
            BuildStage::Minifying,
            self.html.name()
        );

        for path in find_files(output_dir, AssetKind::Html.suffix())? {
            let html = read_text(&path)?;

            // Each file is awaited before the next one starts.
            let minifier = Arc::clone(&self.html);
            let result = tokio::task::spawn_blocking(move || minifier.minify(&html))
                .await
                .map_err(|e| BuildError::Minification {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            let html = result.map_err(|e| BuildError::minify(&path, e))?;

            fs::write(&path, html).map_err(BuildError::io("write", &path))?;
            minified.push(completed(output_dir, path, AssetKind::Html));
        }

        for path in find_files(output_dir, AssetKind::Css.suffix())? {
            let css = read_text(&path)?;
            let css = self
                .config
                .css
                .minify(&css)
                .map_err(|e| BuildError::minify(&path, e))?;

            fs::write(&path, css).map_err(BuildError::io("write", &path))?;
            minified.push(completed(output_dir, path, AssetKind::Css));
        }

        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> Result<PathBuf, BuildError> {
    let absolute = std::path::absolute(path).map_err(BuildError::io("resolve", path))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    Ok(normalized)
}

/// Read a file that is about to be minified.
fn read_text(path: &Path) -> Result<String, BuildError> {
    let bytes = fs::read(path).map_err(BuildError::io("read", path))?;
    String::from_utf8(bytes).map_err(|_| BuildError::minify(path, MinifyError::InvalidInput))
}

/// Log and record a minified file.
fn completed(output_dir: &Path, path: PathBuf, kind: AssetKind) -> MinifiedFile {
    let relative = path
        .strip_prefix(output_dir)
        .map(Path::to_path_buf)
        .unwrap_or(path);

    tracing::info!("{:<5} {}", format!("{}:", kind), relative.display());

    MinifiedFile {
        path: relative,
        kind,
    }
}

fn log_failure(stage: BuildStage, err: &BuildError) {
    tracing::debug!("Build aborted in {} stage: {}", stage, err);
}
