//! Build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use shipdist_static::{BuildConfig, CssStrategy, StaticBuilder};

const DEFAULT_CONFIG_FILE: &str = "shipdist.toml";

/// Configuration file structure (shipdist.toml).
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    build: BuildSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct PathsConfig {
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_shared")]
    shared: String,
    #[serde(default = "default_output")]
    output: String,
    #[serde(default = "default_shared")]
    shared_mount: String,
    #[serde(default = "default_aux_files")]
    aux_files: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            shared: default_shared(),
            output: default_output(),
            shared_mount: default_shared(),
            aux_files: default_aux_files(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct BuildSettings {
    #[serde(default = "default_minify")]
    minify: bool,
    #[serde(default)]
    css: CssStrategy,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: default_minify(),
            css: CssStrategy::default(),
        }
    }
}

fn default_source() -> String {
    "src".to_string()
}
fn default_shared() -> String {
    "shared".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_aux_files() -> Vec<String> {
    vec!["_redirects".to_string(), "_headers".to_string()]
}
fn default_minify() -> bool {
    true
}

/// Load the config file.
///
/// A missing default config yields the defaults; an explicitly requested
/// config must exist. A malformed file is always an error.
fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = root.join(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                return Ok(ConfigFile::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    tracing::debug!("Loaded config from {}", config_path.display());

    Ok(config)
}

/// Merge the config file with command-line overrides.
fn build_config(
    root: PathBuf,
    file_config: ConfigFile,
    output: Option<PathBuf>,
    minify: Option<bool>,
) -> BuildConfig {
    BuildConfig {
        root,
        source_dir: PathBuf::from(&file_config.paths.source),
        shared_dir: PathBuf::from(&file_config.paths.shared),
        output_dir: output.unwrap_or_else(|| PathBuf::from(&file_config.paths.output)),
        shared_mount: PathBuf::from(&file_config.paths.shared_mount),
        aux_files: file_config.paths.aux_files,
        minify: minify.unwrap_or(file_config.build.minify),
        css: file_config.build.css,
    }
}

/// Run the build command.
pub async fn run(
    root: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    minify: Option<bool>,
) -> Result<()> {
    let root = std::path::absolute(&root)
        .with_context(|| format!("Failed to resolve project root {}", root.display()))?;
    let file_config = load_config(&root, config.as_deref())?;
    let config = build_config(root.clone(), file_config, output, minify);

    let result = StaticBuilder::new(config)
        .build()
        .await
        .context("Build failed")?;

    tracing::info!(
        "Copied {} files, minified {} in {}ms",
        result.copied_files,
        result.minified.len(),
        result.duration_ms
    );
    let output_dir = result
        .output_dir
        .strip_prefix(&root)
        .unwrap_or(&result.output_dir);
    tracing::info!("Build complete → {}/", output_dir.display());

    Ok(())
}
