//! Loading plans and driver profiles from disk

use anyhow::{bail, Context, Result};
use plan_preview::{DriverProfile, InMemoryProfileProvider, Plan, ProfileProvider};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Profile provider backed by JSON profile files
#[derive(Debug, Default)]
pub struct FileProfileProvider {
    inner: InMemoryProfileProvider,
}

impl FileProfileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every profile file in `paths`
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut provider = Self::new();
        for path in paths {
            provider.add_file(path.as_ref())?;
        }
        Ok(provider)
    }

    /// Load one JSON profile file
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading driver profile: {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {:?}", path))?;
        let profile = DriverProfile::from_json(&content)
            .with_context(|| format!("Failed to parse profile file: {:?}", path))?;

        log::debug!(
            "Profile {}/{}: {} signals",
            profile.driver,
            profile.name,
            profile.plottable_sequences().len()
        );
        self.inner.insert(profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl ProfileProvider for FileProfileProvider {
    fn profile(&self, driver: &str, profile: &str) -> plan_preview::Result<Arc<DriverProfile>> {
        self.inner.profile(driver, profile)
    }
}

/// Load a plan from a TOML or JSON file
///
/// A plan without a name is named after its file.
pub fn load_plan(path: &Path) -> Result<Plan> {
    log::info!("Loading plan: {:?}", path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file: {:?}", path))?;

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let mut plan: Plan = match extension.as_deref() {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {:?}", path))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {:?}", path))?,
        _ => bail!("Unsupported plan format: {:?}", extension),
    };

    if plan.name.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            plan.name = stem.to_string();
        }
    }
    Ok(plan)
}
