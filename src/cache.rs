//! The local package cache.
//!
//! Created packages live under a single cache root, laid out as
//! `<root>/<user>/<name>/<version>/` with the package manifest, the
//! exported sources, and one build and package directory per binary
//! key. Dependency resolution only ever looks at this cache.

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::manifest::Manifest;
use crate::recipe::RequireSpec;
use crate::reference::PackageRef;
use crate::runtime::Runtime;
use crate::version::Version;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Binary key for packages whose recipes declare no settings axes.
pub const NOARCH_KEY: &str = "noarch";

pub fn default_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home_dir.join(".maslpack"))
}

/// A dependency resolved against the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDependency {
    pub reference: PackageRef,
    pub manifest: Manifest,
    /// Directory holding the dependency's packaged artifacts.
    pub package_dir: PathBuf,
    pub transitive_headers: bool,
    pub transitive_libs: bool,
}

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: PathBuf) -> Self {
        Cache { root }
    }

    pub fn open<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(path) => path,
            None => default_root(runtime)?,
        };
        Ok(Cache { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, reference: &PackageRef) -> PathBuf {
        self.root
            .join(&reference.user)
            .join(&reference.name)
            .join(reference.version.as_str())
    }

    pub fn manifest_path(&self, reference: &PackageRef) -> PathBuf {
        self.version_dir(reference).join(MANIFEST_FILE_NAME)
    }

    pub fn src_dir(&self, reference: &PackageRef) -> PathBuf {
        self.version_dir(reference).join("src")
    }

    pub fn build_dir(&self, reference: &PackageRef, key: &str) -> PathBuf {
        self.version_dir(reference).join("build").join(key)
    }

    pub fn package_dir(&self, reference: &PackageRef, key: &str) -> PathBuf {
        self.version_dir(reference).join("pkg").join(key)
    }

    /// All cached versions of a package, oldest first.
    pub fn installed_versions<R: Runtime>(
        &self,
        runtime: &R,
        name: &str,
        user: &str,
    ) -> Result<Vec<Version>> {
        let dir = self.root.join(user).join(name);
        if !runtime.exists(&dir) {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in runtime.read_dir(&dir)? {
            if !runtime.is_dir(&entry) {
                continue;
            }
            let Some(dir_name) = entry.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            match dir_name.parse::<Version>() {
                Ok(version) => versions.push(version),
                Err(e) => debug!("Skipping {:?}: {}", entry, e),
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Resolve a requirement to the newest cached package that satisfies
    /// it and has a usable binary for the given settings key.
    #[tracing::instrument(skip(self, runtime, spec))]
    pub fn resolve<R: Runtime>(
        &self,
        runtime: &R,
        spec: &RequireSpec,
        key: &str,
    ) -> Result<ResolvedDependency> {
        let req = &spec.requirement;
        let versions = self.installed_versions(runtime, &req.name, &req.user)?;
        let candidates: Vec<&Version> = versions.iter().filter(|v| req.matches(v)).collect();

        if candidates.is_empty() {
            if versions.is_empty() {
                bail!(
                    "Requirement {} cannot be satisfied: no versions of {}@{} are in the cache.\n\
                     Build the dependency first with: maslpack create <recipe-dir>",
                    req,
                    req.name,
                    req.user
                );
            }
            let found: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
            bail!(
                "Requirement {} cannot be satisfied. Cached versions: {}.",
                req,
                found.join(", ")
            );
        }

        // Newest matching version first. A version without a manifest is
        // half-built and not a candidate; once a version is selected, a
        // missing binary is an error rather than a reason to try an
        // older version.
        for version in candidates.into_iter().rev() {
            let reference = PackageRef {
                name: req.name.clone(),
                version: version.clone(),
                user: req.user.clone(),
            };

            let manifest_path = self.manifest_path(&reference);
            if !runtime.exists(&manifest_path) {
                debug!("{} has no manifest, skipping", reference);
                continue;
            }
            let Some(package_dir) = self.find_binary(runtime, &reference, key) else {
                bail!(
                    "No binary of {} matches settings '{}'.\n\
                     Rebuild the dependency with matching settings.",
                    reference,
                    key
                );
            };

            let manifest = Manifest::load(runtime, &manifest_path)?;
            debug!("Resolved {} to {}", req, reference);
            return Ok(ResolvedDependency {
                reference,
                manifest,
                package_dir,
                transitive_headers: spec.transitive_headers,
                transitive_libs: spec.transitive_libs,
            });
        }

        bail!(
            "Requirement {} cannot be satisfied: the cached versions of {}@{} are incomplete.\n\
             Rebuild the dependency with: maslpack create <recipe-dir>",
            req,
            req.name,
            req.user
        );
    }

    /// Find a package directory for the key, falling back to "noarch"
    /// binaries, which are valid for any configuration.
    fn find_binary<R: Runtime>(
        &self,
        runtime: &R,
        reference: &PackageRef,
        key: &str,
    ) -> Option<PathBuf> {
        let exact = self.package_dir(reference, key);
        if runtime.is_dir(&exact) {
            return Some(exact);
        }
        let noarch = self.package_dir(reference, NOARCH_KEY);
        if runtime.is_dir(&noarch) {
            return Some(noarch);
        }
        None
    }

    /// All manifest files in the cache, sorted by path.
    pub fn find_all_manifests<R: Runtime>(&self, runtime: &R) -> Result<Vec<PathBuf>> {
        let mut manifests = Vec::new();
        if !runtime.exists(&self.root) {
            return Ok(manifests);
        }
        for user_dir in runtime.read_dir(&self.root)? {
            if !runtime.is_dir(&user_dir) {
                continue;
            }
            for name_dir in runtime.read_dir(&user_dir)? {
                if !runtime.is_dir(&name_dir) {
                    continue;
                }
                for version_dir in runtime.read_dir(&name_dir)? {
                    if !runtime.is_dir(&version_dir) {
                        continue;
                    }
                    let manifest = version_dir.join(MANIFEST_FILE_NAME);
                    if runtime.exists(&manifest) {
                        manifests.push(manifest);
                    }
                }
            }
        }
        manifests.sort();
        Ok(manifests)
    }
}
