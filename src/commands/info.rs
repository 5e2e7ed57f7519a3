use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::manifest::Manifest;
use crate::recipe::Recipe;
use crate::runtime::Runtime;

/// Print the manifest the recipe in `recipe_dir` would publish.
///
/// The output is derived from the recipe alone. Nothing is built, the
/// cache is not consulted, and running this twice prints identical
/// bytes.
#[tracing::instrument(skip(runtime, recipe_dir))]
pub fn info<R: Runtime>(runtime: R, recipe_dir: &Path) -> Result<()> {
    debug!("Reading recipe from {:?}", recipe_dir);
    let recipe = Recipe::load(&runtime, recipe_dir)?;

    let manifest = Manifest::from_recipe(&recipe);
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
