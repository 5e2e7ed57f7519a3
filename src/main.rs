use anyhow::Result;
use clap::Parser;
use maslpack::commands;
use std::path::PathBuf;

/// maslpack - MASL package builder
///
/// Build architecture libraries from declarative recipes and keep the
/// results in a local package cache, ready for dependent builds.
///
/// Examples:
///   maslpack create .    # Build and package the recipe in the current directory
///   maslpack info .      # Show what the recipe declares
///   maslpack list        # List every package in the cache
#[derive(Parser, Debug)]
#[command(author, version = env!("MASLPACK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Package cache directory (overrides the default; also via MASLPACK_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "MASLPACK_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Build the recipe in a directory and store the package in the cache
    Create(CreateArgs),

    /// Show what a recipe declares
    Info(InfoArgs),

    /// List all packages in the cache
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Directory containing recipe.toml
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// Target operating system (defaults to the host)
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Compiler the binaries are built with (defaults per os)
    #[arg(long, value_name = "COMPILER")]
    pub compiler: Option<String>,

    /// CMake build type (defaults to Release)
    #[arg(long = "build-type", value_name = "TYPE")]
    pub build_type: Option<String>,

    /// Target architecture (defaults to the host)
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Directory containing recipe.toml
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = maslpack::runtime::RealRuntime;

    match cli.command {
        Commands::Create(args) => {
            commands::create(
                runtime,
                &args.path,
                cli.root,
                args.os,
                args.compiler,
                args.build_type,
                args.arch,
            )
            .await?
        }
        Commands::Info(args) => commands::info(runtime, &args.path)?,
        Commands::List(_args) => commands::list(runtime, cli.root)?,
    }
    Ok(())
}
