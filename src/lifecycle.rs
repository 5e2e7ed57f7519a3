//! The package lifecycle.
//!
//! Creating a package runs a fixed sequence of phases: resolve the
//! recipe's requirements against the cache, lay out the build
//! directories, export the sources, generate the build system inputs,
//! drive the build, and stage the finished artifacts together with
//! their manifest. A failing phase aborts the run; later phases are
//! never entered.

use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::artifacts::expected_artifacts;
use crate::cache::{Cache, ResolvedDependency};
use crate::cmake::{BuildContext, BuildDriver, CmakeDriver};
use crate::export::export_sources;
use crate::layout::Layout;
use crate::manifest::Manifest;
use crate::recipe::{PackageType, Recipe};
use crate::runtime::Runtime;
use crate::settings::Settings;
use crate::toolchain;

#[tracing::instrument(skip(runtime, recipe_dir, root, settings))]
pub async fn create<R: Runtime + 'static>(
    runtime: R,
    recipe_dir: &Path,
    root: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    let cache = Cache::open(&runtime, root)?;
    let packager = Packager::new(runtime, CmakeDriver, cache);
    packager.create(recipe_dir, &settings).await
}

pub struct Packager<R, D> {
    runtime: R,
    driver: D,
    cache: Cache,
}

impl<R: Runtime, D: BuildDriver> Packager<R, D> {
    pub fn new(runtime: R, driver: D, cache: Cache) -> Self {
        Packager {
            runtime,
            driver,
            cache,
        }
    }

    /// Run the full lifecycle for the recipe in the given directory.
    #[tracing::instrument(skip(self, recipe_dir, settings))]
    pub async fn create(&self, recipe_dir: &Path, settings: &Settings) -> Result<()> {
        let recipe = Recipe::load(&self.runtime, recipe_dir)?;
        let reference = recipe.reference();
        println!("Creating {}", reference);

        // Resolve every requirement before touching the build tree
        let dependencies = self.resolve_requirements(&recipe, settings)?;
        for dep in &dependencies {
            println!("Using {}", dep.reference);
        }

        let key = settings.binary_key(&recipe.settings);
        debug!("Binary key for {} is '{}'", reference, key);
        let layout = Layout::new(&self.cache, &reference, &key);
        self.runtime.create_dir_all(&layout.generators_dir)?;

        // Sources are exported fresh on every run
        if self.runtime.exists(&layout.src_dir) {
            self.runtime.remove_dir_all(&layout.src_dir)?;
        }
        self.runtime.create_dir_all(&layout.src_dir)?;
        export_sources(
            &self.runtime,
            &recipe.exports_sources,
            recipe_dir,
            &layout.src_dir,
        )?;

        let toolchain_file = toolchain::write_toolchain(&self.runtime, &layout, settings)?;
        toolchain::write_dependency_configs(&self.runtime, &layout, &dependencies)?;

        let ctx = BuildContext {
            src_dir: layout.src_dir.clone(),
            build_dir: layout.build_dir.clone(),
            toolchain_file,
            build_type: settings.build_type.to_string(),
            install_dir: layout.package_dir.clone(),
        };
        if recipe.package_type == PackageType::HeaderLibrary {
            debug!("{} is header-only, skipping the build", reference);
        } else {
            println!("Building {}", reference);
            self.driver.configure(&ctx).await?;
            self.driver.build(&ctx).await?;
        }

        println!("Packaging {}", reference);
        self.package(&recipe, &layout, &ctx, &settings.os).await?;

        // The manifest is published only once the artifacts are in place
        let manifest = Manifest::from_recipe(&recipe);
        manifest.save(&self.runtime, &self.cache.manifest_path(&reference))?;

        println!("Created {} ({})", reference, key);
        Ok(())
    }

    #[tracing::instrument(skip(self, recipe, settings))]
    fn resolve_requirements(
        &self,
        recipe: &Recipe,
        settings: &Settings,
    ) -> Result<Vec<ResolvedDependency>> {
        let key = settings.full_key();
        recipe
            .requires
            .iter()
            .map(|spec| self.cache.resolve(&self.runtime, spec, &key))
            .collect()
    }

    /// Stage the package directory, wiping any previous contents for
    /// this binary key first. A failed or incomplete install leaves no
    /// half-written package behind.
    async fn package(
        &self,
        recipe: &Recipe,
        layout: &Layout,
        ctx: &BuildContext,
        os: &str,
    ) -> Result<()> {
        if self.runtime.exists(&layout.package_dir) {
            self.runtime.remove_dir_all(&layout.package_dir)?;
        }
        self.runtime.create_dir_all(&layout.package_dir)?;

        let result = if recipe.package_type == PackageType::HeaderLibrary {
            self.stage_headers(layout)
        } else {
            self.driver.install(ctx).await
        };
        if let Err(e) = result {
            self.discard_package(layout);
            return Err(e);
        }

        if self.runtime.read_dir(&layout.package_dir)?.is_empty() {
            self.discard_package(layout);
            bail!("Packaging produced no files for {}.", recipe.reference());
        }
        for artifact in expected_artifacts(recipe, os) {
            if !self.runtime.exists(&layout.package_dir.join(&artifact)) {
                self.discard_package(layout);
                bail!(
                    "Packaging {} did not produce {:?}.\n\
                     Check the install rules in the project's CMakeLists.txt.",
                    recipe.reference(),
                    artifact
                );
            }
        }
        Ok(())
    }

    fn discard_package(&self, layout: &Layout) {
        if let Err(e) = self.runtime.remove_dir_all(&layout.package_dir) {
            warn!("Failed to clean up {:?}: {}", layout.package_dir, e);
        }
    }

    /// Header-only packages skip the build; their include tree is
    /// copied straight from the exported sources.
    fn stage_headers(&self, layout: &Layout) -> Result<()> {
        let include_src = layout.src_dir.join("include");
        if !self.runtime.is_dir(&include_src) {
            bail!("Header library has no include directory in its exported sources.");
        }
        self.copy_tree(&include_src, &layout.package_dir.join("include"))
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()> {
        self.runtime.create_dir_all(to)?;
        for entry in self.runtime.read_dir(from)? {
            let Some(file_name) = entry.file_name() else {
                continue;
            };
            let dest = to.join(file_name);
            if self.runtime.is_dir(&entry) {
                self.copy_tree(&entry, &dest)?;
            } else {
                self.runtime.copy(&entry, &dest)?;
            }
        }
        Ok(())
    }
}
