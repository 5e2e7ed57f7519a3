//! Generation of build system input files.
//!
//! Before a build is configured, two kinds of CMake files are written
//! into the generators directory: a toolchain file that pins the build
//! settings, and one config file per resolved dependency so that
//! `find_package` resolves against the package cache instead of the
//! system.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::cache::ResolvedDependency;
use crate::layout::Layout;
use crate::runtime::Runtime;
use crate::settings::Settings;

pub const TOOLCHAIN_FILE_NAME: &str = "maslpack_toolchain.cmake";

#[tracing::instrument(skip(runtime, layout, settings))]
pub fn write_toolchain<R: Runtime>(
    runtime: &R,
    layout: &Layout,
    settings: &Settings,
) -> Result<PathBuf> {
    let path = layout.generators_dir.join(TOOLCHAIN_FILE_NAME);
    runtime.write(&path, toolchain_contents(layout, settings).as_bytes())?;
    debug!("Wrote {:?}", path);
    Ok(path)
}

#[tracing::instrument(skip(runtime, layout, dependencies))]
pub fn write_dependency_configs<R: Runtime>(
    runtime: &R,
    layout: &Layout,
    dependencies: &[ResolvedDependency],
) -> Result<()> {
    for dep in dependencies {
        let path = layout
            .generators_dir
            .join(format!("{}-config.cmake", dep.reference.name));
        runtime.write(&path, dependency_config_contents(dep).as_bytes())?;
        debug!("Wrote {:?}", path);
    }
    Ok(())
}

fn toolchain_contents(layout: &Layout, settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str("# Generated by maslpack. Do not edit.\n");
    out.push_str(&format!(
        "# os={} compiler={} build_type={} arch={}\n",
        settings.os, settings.compiler, settings.build_type, settings.arch
    ));
    out.push_str(&format!(
        "set(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"\" FORCE)\n",
        settings.build_type
    ));
    if let Some(cxx) = cxx_compiler(&settings.compiler) {
        out.push_str(&format!(
            "set(CMAKE_CXX_COMPILER \"{}\" CACHE FILEPATH \"\" FORCE)\n",
            cxx
        ));
    }
    // Install destinations are pinned so packaged artifacts land in
    // the same places on every platform.
    out.push_str("set(CMAKE_INSTALL_LIBDIR \"lib\" CACHE STRING \"\" FORCE)\n");
    out.push_str("set(CMAKE_INSTALL_BINDIR \"bin\" CACHE STRING \"\" FORCE)\n");
    out.push_str("set(CMAKE_INSTALL_INCLUDEDIR \"include\" CACHE STRING \"\" FORCE)\n");
    out.push_str(&format!(
        "list(PREPEND CMAKE_PREFIX_PATH \"{}\")\n",
        cmake_path(&layout.generators_dir)
    ));
    out
}

/// C++ compiler executable for a compiler setting.
fn cxx_compiler(compiler: &str) -> Option<&'static str> {
    match compiler {
        "gcc" => Some("g++"),
        "clang" | "apple-clang" => Some("clang++"),
        "msvc" => Some("cl"),
        _ => None,
    }
}

/// CMake config declaring one dependency as an imported target.
///
/// The target only exposes the dependency's headers and libraries when
/// the recipe marked them as transitive.
fn dependency_config_contents(dep: &ResolvedDependency) -> String {
    let name = &dep.reference.name;
    let target = format!("{}::{}", name, name);

    let mut out = String::new();
    out.push_str(&format!(
        "# Generated by maslpack for {}. Do not edit.\n",
        dep.reference
    ));
    out.push_str(&format!("if(TARGET {})\n  return()\nendif()\n", target));
    out.push_str(&format!("add_library({} INTERFACE IMPORTED)\n", target));
    if dep.transitive_headers {
        out.push_str(&format!(
            "set_property(TARGET {} PROPERTY INTERFACE_INCLUDE_DIRECTORIES \"{}\")\n",
            target,
            cmake_path(&dep.package_dir.join("include"))
        ));
    }
    if dep.transitive_libs && !dep.manifest.libs.is_empty() {
        out.push_str(&format!(
            "set_property(TARGET {} PROPERTY INTERFACE_LINK_DIRECTORIES \"{}\")\n",
            target,
            cmake_path(&dep.package_dir.join("lib"))
        ));
        out.push_str(&format!(
            "set_property(TARGET {} PROPERTY INTERFACE_LINK_LIBRARIES \"{}\")\n",
            target,
            dep.manifest.libs.join(";")
        ));
    }
    out
}

/// Render a path for use inside a CMake file, which always wants
/// forward slashes.
pub fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
