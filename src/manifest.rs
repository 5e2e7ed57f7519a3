use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::recipe::{PackageType, Recipe};
use crate::runtime::Runtime;

/// Package manifest stored next to a package's binaries in the cache.
///
/// The manifest describes what a package provides to its consumers. It
/// is derived from the recipe alone, never from the build settings, so
/// the same recipe always produces byte-identical manifests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub user: String,
    pub package_type: PackageType,
    pub description: Option<String>,
    pub license: Option<String>,
    /// Link libraries this package exports to consumers.
    pub libs: Vec<String>,
    /// Component references of the dependencies consumers also link,
    /// e.g. "xtuml_swa::xtuml_swa".
    pub requires: Vec<String>,
}

impl Manifest {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Manifest {
            name: recipe.name.clone(),
            version: recipe.version.to_string(),
            user: recipe.user.clone(),
            package_type: recipe.package_type,
            description: recipe.description.clone(),
            license: recipe.license.clone(),
            libs: recipe.libs.clone(),
            requires: recipe
                .requires
                .iter()
                .filter(|r| r.transitive_libs)
                .map(|r| {
                    let name = &r.requirement.name;
                    format!("{}::{}", name, name)
                })
                .collect(),
        }
    }

    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Write the manifest atomically: to a temporary file first, then
    /// rename over the final path.
    #[tracing::instrument(skip(self, runtime, path))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");

        runtime.write(&tmp_path, json.as_bytes())?;
        runtime.rename(&tmp_path, path)?;
        Ok(())
    }
}
