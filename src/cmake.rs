//! The build driver: how a package actually gets compiled.
//!
//! The lifecycle engine never invokes a compiler itself. It hands a
//! [`BuildContext`] to a [`BuildDriver`], which runs the configure,
//! build and install steps. The real driver shells out to cmake; tests
//! substitute a mock to observe the calls.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use tokio::process::Command;

use crate::toolchain::cmake_path;

/// Everything a driver needs to run one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
    pub src_dir: PathBuf,
    pub build_dir: PathBuf,
    pub toolchain_file: PathBuf,
    /// Passed as --config for multi-config generators.
    pub build_type: String,
    /// Prefix the finished package is installed into.
    pub install_dir: PathBuf,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildDriver: Send + Sync {
    async fn configure(&self, ctx: &BuildContext) -> Result<()>;
    async fn build(&self, ctx: &BuildContext) -> Result<()>;
    async fn install(&self, ctx: &BuildContext) -> Result<()>;
}

/// Build driver that delegates to the cmake binary on PATH.
pub struct CmakeDriver;

#[async_trait]
impl BuildDriver for CmakeDriver {
    #[tracing::instrument(skip(self, ctx))]
    async fn configure(&self, ctx: &BuildContext) -> Result<()> {
        run_cmake("configure", &configure_args(ctx)).await
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn build(&self, ctx: &BuildContext) -> Result<()> {
        run_cmake("build", &build_args(ctx)).await
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn install(&self, ctx: &BuildContext) -> Result<()> {
        run_cmake("install", &install_args(ctx)).await
    }
}

fn configure_args(ctx: &BuildContext) -> Vec<String> {
    vec![
        "-S".to_string(),
        cmake_path(&ctx.src_dir),
        "-B".to_string(),
        cmake_path(&ctx.build_dir),
        format!("-DCMAKE_TOOLCHAIN_FILE={}", cmake_path(&ctx.toolchain_file)),
    ]
}

fn build_args(ctx: &BuildContext) -> Vec<String> {
    vec![
        "--build".to_string(),
        cmake_path(&ctx.build_dir),
        "--config".to_string(),
        ctx.build_type.clone(),
        "--parallel".to_string(),
    ]
}

fn install_args(ctx: &BuildContext) -> Vec<String> {
    vec![
        "--install".to_string(),
        cmake_path(&ctx.build_dir),
        "--prefix".to_string(),
        cmake_path(&ctx.install_dir),
        "--config".to_string(),
        ctx.build_type.clone(),
    ]
}

/// Run cmake with inherited stdio so compiler output stays visible.
async fn run_cmake(step: &str, args: &[String]) -> Result<()> {
    debug!("Running cmake {}", args.join(" "));
    let status = Command::new("cmake")
        .args(args)
        .status()
        .await
        .context("Failed to run cmake. Is cmake installed and on PATH?")?;
    if !status.success() {
        bail!("cmake {} failed with {}", step, status);
    }
    Ok(())
}
