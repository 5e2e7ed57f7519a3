use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::cache::Cache;
use crate::manifest::Manifest;
use crate::runtime::Runtime;

/// List all packages in the cache
#[tracing::instrument(skip(runtime, root))]
pub fn list<R: Runtime>(runtime: R, root: Option<PathBuf>) -> Result<()> {
    let cache = Cache::open(&runtime, root)?;
    debug!("Listing packages from {:?}", cache.root());

    let manifest_paths = cache.find_all_manifests(&runtime)?;
    if manifest_paths.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    debug!("Found {} package(s)", manifest_paths.len());

    for path in manifest_paths {
        match Manifest::load(&runtime, &path) {
            Ok(manifest) => {
                let reference =
                    format!("{}/{}@{}", manifest.name, manifest.version, manifest.user);
                let keys = binary_keys(&runtime, &path);
                if keys.is_empty() {
                    println!("{}", reference);
                } else {
                    println!("{} [{}]", reference, keys.join(", "));
                }
            }
            Err(e) => {
                debug!("Failed to load manifest from {:?}: {}", path, e);
            }
        }
    }

    Ok(())
}

/// Binary keys with a staged package directory, read from the pkg
/// directory next to the manifest.
fn binary_keys<R: Runtime>(runtime: &R, manifest_path: &Path) -> Vec<String> {
    let Some(version_dir) = manifest_path.parent() else {
        return Vec::new();
    };
    let pkg_dir = version_dir.join("pkg");
    if !runtime.is_dir(&pkg_dir) {
        return Vec::new();
    }
    let entries = match runtime.read_dir(&pkg_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Failed to read {:?}: {}", pkg_dir, e);
            return Vec::new();
        }
    };
    let mut keys: Vec<String> = entries
        .iter()
        .filter(|entry| runtime.is_dir(entry))
        .filter_map(|entry| entry.file_name().and_then(|name| name.to_str()))
        .map(str::to_string)
        .collect();
    keys.sort();
    keys
}
