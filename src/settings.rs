//! Build settings: the configuration axes a binary is built for.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// The configuration axes a recipe may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAxis {
    Os,
    Compiler,
    BuildType,
    Arch,
}

/// All axes in canonical order. Binary keys always list axis values in
/// this order, regardless of the order a recipe declares them in.
pub const ALL_AXES: [SettingsAxis; 4] = [
    SettingsAxis::Os,
    SettingsAxis::Compiler,
    SettingsAxis::BuildType,
    SettingsAxis::Arch,
];

impl fmt::Display for SettingsAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingsAxis::Os => "os",
            SettingsAxis::Compiler => "compiler",
            SettingsAxis::BuildType => "build_type",
            SettingsAxis::Arch => "arch",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SettingsAxis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "os" => Ok(SettingsAxis::Os),
            "compiler" => Ok(SettingsAxis::Compiler),
            "build_type" => Ok(SettingsAxis::BuildType),
            "arch" => Ok(SettingsAxis::Arch),
            _ => bail!(
                "Unknown settings axis '{}'. Expected one of: os, compiler, build_type, arch.",
                s
            ),
        }
    }
}

/// The build type, mirroring the CMake configuration names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BuildType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "Release" => Ok(BuildType::Release),
            "RelWithDebInfo" => Ok(BuildType::RelWithDebInfo),
            "MinSizeRel" => Ok(BuildType::MinSizeRel),
            _ => bail!(
                "Unknown build type '{}'. Expected Debug, Release, RelWithDebInfo or MinSizeRel.",
                s
            ),
        }
    }
}

const KNOWN_OS: [&str; 3] = ["linux", "macos", "windows"];
const KNOWN_COMPILERS: [&str; 4] = ["gcc", "clang", "apple-clang", "msvc"];

/// The resolved settings values for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub os: String,
    pub compiler: String,
    pub build_type: BuildType,
    pub arch: String,
}

impl Settings {
    /// Resolve settings from optional overrides, filling in host defaults.
    pub fn resolve(
        os: Option<String>,
        compiler: Option<String>,
        build_type: Option<String>,
        arch: Option<String>,
    ) -> Result<Settings> {
        let os = os.unwrap_or_else(|| host_os().to_string());
        if !KNOWN_OS.contains(&os.as_str()) {
            bail!(
                "Unknown os '{}'. Expected one of: {}.",
                os,
                KNOWN_OS.join(", ")
            );
        }

        let compiler = compiler.unwrap_or_else(|| default_compiler(&os).to_string());
        if !KNOWN_COMPILERS.contains(&compiler.as_str()) {
            bail!(
                "Unknown compiler '{}'. Expected one of: {}.",
                compiler,
                KNOWN_COMPILERS.join(", ")
            );
        }

        let build_type = match build_type {
            Some(s) => s.parse()?,
            None => BuildType::default(),
        };

        let arch = arch.unwrap_or_else(|| std::env::consts::ARCH.to_string());
        if arch.is_empty() {
            bail!("Architecture cannot be empty.");
        }

        Ok(Settings {
            os,
            compiler,
            build_type,
            arch,
        })
    }

    fn axis_value(&self, axis: SettingsAxis) -> String {
        match axis {
            SettingsAxis::Os => self.os.clone(),
            SettingsAxis::Compiler => self.compiler.clone(),
            SettingsAxis::BuildType => self.build_type.to_string(),
            SettingsAxis::Arch => self.arch.clone(),
        }
    }

    /// The binary key for a recipe that declares the given axes.
    ///
    /// The key joins the declared axis values in canonical order, e.g.
    /// "linux-gcc-Release-x86_64". A recipe that declares no axes gets
    /// the key "noarch": its binaries are valid for any configuration.
    pub fn binary_key(&self, declared: &[SettingsAxis]) -> String {
        if declared.is_empty() {
            return "noarch".to_string();
        }
        let values: Vec<String> = ALL_AXES
            .iter()
            .filter(|axis| declared.contains(axis))
            .map(|axis| self.axis_value(*axis))
            .collect();
        values.join("-")
    }

    /// The binary key over all axes, used when looking up dependencies.
    pub fn full_key(&self) -> String {
        self.binary_key(&ALL_AXES)
    }
}

fn host_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "linux"
    }
}

fn default_compiler(os: &str) -> &'static str {
    match os {
        "macos" => "apple-clang",
        "windows" => "msvc",
        _ => "gcc",
    }
}
