//! Source export: staging a recipe's sources into the cache.

use anyhow::{Context, Result, bail};
use glob::Pattern;
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Copy the files matching the exports-sources patterns from the
/// recipe directory into the destination, preserving relative paths.
///
/// Patterns follow glob syntax and are matched against paths relative
/// to the recipe directory, so "src/*" exports everything under src/.
/// Returns the number of files copied.
#[tracing::instrument(skip(runtime, patterns, from, to))]
pub fn export_sources<R: Runtime>(
    runtime: &R,
    patterns: &[String],
    from: &Path,
    to: &Path,
) -> Result<usize> {
    if patterns.is_empty() {
        bail!("The recipe does not declare any exports-sources patterns.");
    }

    let compiled = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).with_context(|| format!("Invalid exports-sources pattern '{}'", p))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    collect_files(runtime, from, &mut files)?;

    let mut copied = 0;
    for file in &files {
        let relative = file
            .strip_prefix(from)
            .context("File is outside the recipe directory")?;
        let rel_str = relative.to_string_lossy().replace('\\', "/");
        if !compiled.iter().any(|p| p.matches(&rel_str)) {
            continue;
        }

        let dest = to.join(relative);
        if let Some(parent) = dest.parent() {
            runtime.create_dir_all(parent)?;
        }
        runtime.copy(file, &dest)?;
        copied += 1;
    }

    if copied == 0 {
        bail!(
            "No files in {:?} match the exports-sources patterns: {}.",
            from,
            patterns.join(", ")
        );
    }
    debug!("Exported {} file(s) from {:?}", copied, from);
    Ok(copied)
}

fn collect_files<R: Runtime>(runtime: &R, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in runtime.read_dir(dir)? {
        if runtime.is_dir(&entry) {
            collect_files(runtime, &entry, files)?;
        } else {
            files.push(entry);
        }
    }
    Ok(())
}
