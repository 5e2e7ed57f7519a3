//! Expected artifact paths for a packaged recipe.
//!
//! A finished package must contain the artifacts its recipe declares.
//! File names follow the conventions of the target os from the
//! settings tuple, not the host the tool happens to run on.

use std::path::PathBuf;

use crate::recipe::{PackageType, Recipe};

/// Paths, relative to the package directory, that a finished package
/// of this recipe must contain.
pub fn expected_artifacts(recipe: &Recipe, os: &str) -> Vec<PathBuf> {
    match recipe.package_type {
        PackageType::SharedLibrary => recipe
            .libs
            .iter()
            .flat_map(|lib| shared_library_paths(os, lib))
            .collect(),
        PackageType::StaticLibrary => recipe
            .libs
            .iter()
            .map(|lib| static_library_path(os, lib))
            .collect(),
        PackageType::Application => vec![executable_path(os, &recipe.name)],
        PackageType::HeaderLibrary => vec![PathBuf::from("include")],
    }
}

fn shared_library_paths(os: &str, lib: &str) -> Vec<PathBuf> {
    match os {
        // A dll comes with its import library
        "windows" => vec![
            PathBuf::from("bin").join(format!("{}.dll", lib)),
            PathBuf::from("lib").join(format!("{}.lib", lib)),
        ],
        "macos" => vec![PathBuf::from("lib").join(format!("lib{}.dylib", lib))],
        _ => vec![PathBuf::from("lib").join(format!("lib{}.so", lib))],
    }
}

fn static_library_path(os: &str, lib: &str) -> PathBuf {
    match os {
        "windows" => PathBuf::from("lib").join(format!("{}.lib", lib)),
        _ => PathBuf::from("lib").join(format!("lib{}.a", lib)),
    }
}

fn executable_path(os: &str, name: &str) -> PathBuf {
    match os {
        "windows" => PathBuf::from("bin").join(format!("{}.exe", name)),
        _ => PathBuf::from("bin").join(name),
    }
}
