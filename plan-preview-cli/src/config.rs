//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use plan_preview::PreviewConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Plan files (TOML or JSON)
    #[serde(default)]
    pub plans: Vec<PathBuf>,
    /// Driver profile files (JSON)
    #[serde(default)]
    pub profiles: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

impl AppConfig {
    /// Check that the configuration names something to preview
    pub fn validate(&self) -> Result<()> {
        if self.input.plans.is_empty() {
            bail!("No plan files configured");
        }
        for path in self.input.plans.iter().chain(&self.input.profiles) {
            if !path.exists() {
                bail!("Input file does not exist: {:?}", path);
            }
        }
        Ok(())
    }

    /// Resolve relative input/output paths against `base`
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.input.plans.iter_mut().for_each(resolve);
        self.input.profiles.iter_mut().for_each(resolve);
        if let Some(output) = self.output.output_file.as_mut() {
            resolve(output);
        }
    }
}

/// Load configuration from a TOML file
///
/// Relative paths in the file are taken relative to the file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    log::debug!(
        "Config {:?}: {} plans, {} profiles",
        path,
        config.input.plans.len(),
        config.input.profiles.len()
    );
    Ok(config)
}
