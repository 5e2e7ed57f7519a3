use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::lifecycle;
use crate::runtime::Runtime;
use crate::settings::Settings;

/// Build and package the recipe in `recipe_dir`.
#[tracing::instrument(skip(runtime, recipe_dir, root))]
pub async fn create<R: Runtime + 'static>(
    runtime: R,
    recipe_dir: &Path,
    root: Option<PathBuf>,
    os: Option<String>,
    compiler: Option<String>,
    build_type: Option<String>,
    arch: Option<String>,
) -> Result<()> {
    let settings = Settings::resolve(os, compiler, build_type, arch)?;
    debug!(
        "Resolved settings: {}/{}/{}/{}",
        settings.os, settings.compiler, settings.build_type, settings.arch
    );
    lifecycle::create(runtime, recipe_dir, root, settings).await
}
