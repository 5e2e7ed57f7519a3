//! Recipe loading and validation.
//!
//! A recipe is a declarative `recipe.toml` file describing one package:
//! its identity, the settings axes its binaries depend on, the source
//! files it exports, its dependencies and the libraries it provides.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::reference::{PackageRef, Requirement};
use crate::runtime::Runtime;
use crate::settings::SettingsAxis;
use crate::version::Version;

pub const RECIPE_FILE_NAME: &str = "recipe.toml";

/// What kind of artifact a package produces.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    SharedLibrary,
    StaticLibrary,
    HeaderLibrary,
    Application,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageType::SharedLibrary => "shared-library",
            PackageType::StaticLibrary => "static-library",
            PackageType::HeaderLibrary => "header-library",
            PackageType::Application => "application",
        };
        write!(f, "{}", name)
    }
}

/// A dependency declared by a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RequireSpec {
    pub requirement: Requirement,
    /// Whether the dependency's headers are visible to this package's
    /// consumers.
    pub transitive_headers: bool,
    /// Whether the dependency's libraries are linked by this package's
    /// consumers.
    pub transitive_libs: bool,
}

/// A validated recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub version: Version,
    pub user: String,
    pub package_type: PackageType,
    pub description: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub topics: Vec<String>,
    pub settings: Vec<SettingsAxis>,
    pub exports_sources: Vec<String>,
    pub requires: Vec<RequireSpec>,
    pub libs: Vec<String>,
}

impl Recipe {
    /// Load and validate the recipe in the given directory.
    #[tracing::instrument(skip(runtime, dir))]
    pub fn load<R: Runtime>(runtime: &R, dir: &Path) -> Result<Recipe> {
        let path = dir.join(RECIPE_FILE_NAME);
        if !runtime.exists(&path) {
            bail!("No {} found in {:?}.", RECIPE_FILE_NAME, dir);
        }
        let content = runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Recipe::parse(&content).with_context(|| format!("Invalid recipe {:?}", path))
    }

    /// Parse and validate recipe file contents.
    pub fn parse(content: &str) -> Result<Recipe> {
        let file: RecipeFile = toml::from_str(content).context("Failed to parse recipe")?;
        validate(file)
    }

    /// This package's own reference.
    pub fn reference(&self) -> PackageRef {
        PackageRef {
            name: self.name.clone(),
            version: self.version.clone(),
            user: self.user.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RecipeFile {
    package: PackageSection,
    #[serde(default)]
    requires: Vec<RequireEntry>,
    package_info: Option<PackageInfoSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PackageSection {
    name: String,
    version: String,
    user: String,
    package_type: PackageType,
    description: Option<String>,
    license: Option<String>,
    url: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    settings: Vec<String>,
    #[serde(default)]
    exports_sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RequireEntry {
    r#ref: String,
    #[serde(default)]
    transitive_headers: bool,
    #[serde(default)]
    transitive_libs: bool,
}

#[derive(Debug, Deserialize)]
struct PackageInfoSection {
    #[serde(default)]
    libs: Vec<String>,
}

fn validate(file: RecipeFile) -> Result<Recipe> {
    let package = file.package;

    validate_identifier("package name", &package.name)?;
    validate_identifier("user", &package.user)?;

    let version: Version = package
        .version
        .parse()
        .with_context(|| format!("Invalid version '{}'", package.version))?;

    let mut settings = Vec::new();
    for axis_name in &package.settings {
        let axis: SettingsAxis = axis_name.parse()?;
        if settings.contains(&axis) {
            bail!("Duplicate settings axis '{}'.", axis_name);
        }
        settings.push(axis);
    }

    let mut requires = Vec::new();
    for entry in file.requires {
        let requirement: Requirement = entry.r#ref.parse()?;
        if requires
            .iter()
            .any(|r: &RequireSpec| r.requirement.name == requirement.name)
        {
            bail!("Duplicate requirement for package '{}'.", requirement.name);
        }
        requires.push(RequireSpec {
            requirement,
            transitive_headers: entry.transitive_headers,
            transitive_libs: entry.transitive_libs,
        });
    }

    let libs = file.package_info.map(|info| info.libs).unwrap_or_default();
    if matches!(
        package.package_type,
        PackageType::SharedLibrary | PackageType::StaticLibrary
    ) && libs.is_empty()
    {
        bail!(
            "A {} package must declare its libraries under [package-info].",
            package.package_type
        );
    }

    Ok(Recipe {
        name: package.name,
        version,
        user: package.user,
        package_type: package.package_type,
        description: package.description,
        license: package.license,
        url: package.url,
        topics: package.topics,
        settings,
        exports_sources: package.exports_sources,
        requires,
        libs,
    })
}

fn validate_identifier(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("The {} cannot be empty.", what);
    }
    if value
        .chars()
        .any(|c| c == '/' || c == '@' || c.is_whitespace())
    {
        bail!(
            "Invalid {} '{}': must not contain '/', '@' or whitespace.",
            what,
            value
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::VersionReq;
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    const FULL_RECIPE: &str = r#"
[package]
name = "xtuml_metadata"
version = "1.0"
user = "xtuml"
package-type = "shared-library"
license = "Apache-2.0"
url = "https://github.com/xtuml/masl"
description = "xtUML C++ Software Architecture Meta Data"
topics = ["xtuml", "masl", "metadata"]
settings = ["os", "compiler", "build_type", "arch"]
exports-sources = ["CMakeLists.txt", "src/*", "include/*"]

[[requires]]
ref = "xtuml_swa/[>=1.0 <2]@xtuml"
transitive-headers = true
transitive-libs = true

[package-info]
libs = ["MetaData"]
"#;

    #[test]
    fn test_parse_full_recipe() {
        let recipe = Recipe::parse(FULL_RECIPE).unwrap();
        assert_eq!(recipe.name, "xtuml_metadata");
        assert_eq!(recipe.version.as_str(), "1.0");
        assert_eq!(recipe.user, "xtuml");
        assert_eq!(recipe.package_type, PackageType::SharedLibrary);
        assert_eq!(recipe.license.as_deref(), Some("Apache-2.0"));
        assert_eq!(recipe.url.as_deref(), Some("https://github.com/xtuml/masl"));
        assert_eq!(recipe.topics, vec!["xtuml", "masl", "metadata"]);
        assert_eq!(recipe.settings.len(), 4);
        assert_eq!(
            recipe.exports_sources,
            vec!["CMakeLists.txt", "src/*", "include/*"]
        );
        assert_eq!(recipe.libs, vec!["MetaData"]);
    }

    #[test]
    fn test_parse_requires_with_transitive_flags() {
        let recipe = Recipe::parse(FULL_RECIPE).unwrap();
        assert_eq!(recipe.requires.len(), 1);
        let req = &recipe.requires[0];
        assert_eq!(req.requirement.name, "xtuml_swa");
        assert_eq!(req.requirement.user, "xtuml");
        assert!(matches!(req.requirement.req, VersionReq::Range(_)));
        assert!(req.transitive_headers);
        assert!(req.transitive_libs);
    }

    #[test]
    fn test_parse_minimal_recipe() {
        let recipe = Recipe::parse(
            r#"
[package]
name = "tiny"
version = "0.1"
user = "dev"
package-type = "header-library"
"#,
        )
        .unwrap();
        assert_eq!(recipe.package_type, PackageType::HeaderLibrary);
        assert!(recipe.settings.is_empty());
        assert!(recipe.exports_sources.is_empty());
        assert!(recipe.requires.is_empty());
        assert!(recipe.libs.is_empty());
        assert_eq!(recipe.description, None);
    }

    #[test]
    fn test_transitive_flags_default_to_false() {
        let recipe = Recipe::parse(
            r#"
[package]
name = "app"
version = "1.0"
user = "dev"
package-type = "application"

[[requires]]
ref = "dep/1.0@dev"
"#,
        )
        .unwrap();
        assert!(!recipe.requires[0].transitive_headers);
        assert!(!recipe.requires[0].transitive_libs);
    }

    #[test]
    fn test_reference_round_trips_identity() {
        let recipe = Recipe::parse(FULL_RECIPE).unwrap();
        assert_eq!(format!("{}", recipe.reference()), "xtuml_metadata/1.0@xtuml");
    }

    #[test]
    fn test_missing_field_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "incomplete"
version = "1.0"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_version_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1..0"
user = "dev"
package-type = "application"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_name_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "bad/name"
version = "1.0"
user = "dev"
package-type = "application"
"#,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("package name"));
    }

    #[test]
    fn test_unknown_package_type_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "plugin"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_library_without_libs_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "static-library"
"#,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("[package-info]"));
    }

    #[test]
    fn test_unknown_settings_axis_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "application"
settings = ["os", "flavor"]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_settings_axis_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "application"
settings = ["os", "os"]
"#,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_duplicate_requirement_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "application"

[[requires]]
ref = "dep/1.0@dev"

[[requires]]
ref = "dep/[>=1.0]@dev"
"#,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_invalid_require_ref_fails() {
        let result = Recipe::parse(
            r#"
[package]
name = "p"
version = "1.0"
user = "dev"
package-type = "application"

[[requires]]
ref = "missing-user/1.0"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_recipe_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let result = Recipe::load(&runtime, &PathBuf::from("/project"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains(RECIPE_FILE_NAME)
        );
    }

    #[test]
    fn test_load_reads_recipe_from_directory() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .withf(|p| p.ends_with("recipe.toml"))
            .returning(|_| Ok(FULL_RECIPE.to_string()));

        let recipe = Recipe::load(&runtime, &PathBuf::from("/project")).unwrap();
        assert_eq!(recipe.name, "xtuml_metadata");
    }
}
