use anyhow::{Result, anyhow, bail};
use std::fmt;
use std::str::FromStr;

use crate::version::Version;

/// A concrete package reference
/// Format: "name/version@user" (e.g. "xtuml_metadata/1.0@xtuml")
#[derive(Debug, PartialEq, Clone)]
pub struct PackageRef {
    pub name: String,
    pub version: Version,
    pub user: String,
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.version, self.user)
    }
}

impl FromStr for PackageRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version, user) = split_reference(s)?;
        Ok(PackageRef {
            name: name.to_string(),
            version: version.parse()?,
            user: user.to_string(),
        })
    }
}

/// A dependency requirement on another package
/// Format: "name/version@user" for an exact pin, or
/// "name/[>=1.0 <2]@user" for a version range
#[derive(Debug, PartialEq, Clone)]
pub struct Requirement {
    pub name: String,
    pub req: VersionReq,
    pub user: String,
}

impl Requirement {
    /// Check whether a version satisfies this requirement.
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.name, self.req, self.user)
    }
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, spec, user) = split_reference(s)?;
        Ok(Requirement {
            name: name.to_string(),
            req: spec.parse()?,
            user: user.to_string(),
        })
    }
}

/// Split "name/spec@user" into its three parts.
///
/// The version part may contain '@'-free range syntax, so the user is
/// taken from the last '@' and the name from the first '/'.
fn split_reference(s: &str) -> Result<(&str, &str, &str)> {
    let Some((head, user)) = s.rsplit_once('@') else {
        bail!("Invalid package reference '{}'. Expected 'name/version@user'.", s);
    };
    let Some((name, spec)) = head.split_once('/') else {
        bail!("Invalid package reference '{}'. Expected 'name/version@user'.", s);
    };
    if name.is_empty() || spec.is_empty() || user.is_empty() {
        bail!("Invalid package reference '{}'. Expected 'name/version@user'.", s);
    }
    Ok((name, spec, user))
}

/// A version requirement: either an exact version or a bracketed range.
#[derive(Debug, PartialEq, Clone)]
pub enum VersionReq {
    Exact(Version),
    Range(VersionRange),
}

impl VersionReq {
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionReq::Exact(v) => v == version,
            VersionReq::Range(range) => range.matches(version),
        }
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReq::Exact(v) => write!(f, "{}", v),
            VersionReq::Range(range) => write!(f, "{}", range),
        }
    }
}

impl FromStr for VersionReq {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('[') {
            Ok(VersionReq::Range(s.parse()?))
        } else {
            Ok(VersionReq::Exact(s.parse()?))
        }
    }
}

/// A bracketed version range such as "[>=1.0 <2]".
///
/// The range holds one or more whitespace-separated bounds, all of
/// which must be satisfied.
#[derive(Debug, PartialEq, Clone)]
pub struct VersionRange {
    bounds: Vec<Bound>,
}

#[derive(Debug, PartialEq, Clone)]
struct Bound {
    op: Op,
    version: Version,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Op {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl Op {
    fn symbol(&self) -> &'static str {
        match self {
            Op::Ge => ">=",
            Op::Gt => ">",
            Op::Le => "<=",
            Op::Lt => "<",
            Op::Eq => "=",
        }
    }
}

impl VersionRange {
    pub fn matches(&self, version: &Version) -> bool {
        self.bounds.iter().all(|b| match b.op {
            Op::Ge => *version >= b.version,
            Op::Gt => *version > b.version,
            Op::Le => *version <= b.version,
            Op::Lt => *version < b.version,
            Op::Eq => *version == b.version,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bounds: Vec<String> = self
            .bounds
            .iter()
            .map(|b| format!("{}{}", b.op.symbol(), b.version))
            .collect();
        write!(f, "[{}]", bounds.join(" "))
    }
}

impl FromStr for VersionRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| anyhow!("Invalid version range '{}'. Expected '[<bounds>]'.", s))?;

        let bounds = inner
            .split_whitespace()
            .map(parse_bound)
            .collect::<Result<Vec<_>>>()?;
        if bounds.is_empty() {
            bail!("Invalid version range '{}': no bounds given.", s);
        }
        Ok(VersionRange { bounds })
    }
}

fn parse_bound(token: &str) -> Result<Bound> {
    let (op, rest) = if let Some(rest) = token.strip_prefix(">=") {
        (Op::Ge, rest)
    } else if let Some(rest) = token.strip_prefix("<=") {
        (Op::Le, rest)
    } else if let Some(rest) = token.strip_prefix('>') {
        (Op::Gt, rest)
    } else if let Some(rest) = token.strip_prefix('<') {
        (Op::Lt, rest)
    } else if let Some(rest) = token.strip_prefix('=') {
        (Op::Eq, rest)
    } else {
        (Op::Eq, token)
    };
    let version = rest
        .parse()
        .map_err(|e| anyhow!("Invalid version range bound '{}': {}", token, e))?;
    Ok(Bound { op, version })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_package_ref() {
        let r = PackageRef::from_str("xtuml_metadata/1.0@xtuml").unwrap();
        assert_eq!(r.name, "xtuml_metadata");
        assert_eq!(r.version, v("1.0"));
        assert_eq!(r.user, "xtuml");
    }

    #[test]
    fn test_package_ref_display() {
        let r = PackageRef::from_str("xtuml_metadata/1.0@xtuml").unwrap();
        assert_eq!(format!("{}", r), "xtuml_metadata/1.0@xtuml");
    }

    #[test]
    fn test_parse_package_ref_missing_user_fails() {
        let result = PackageRef::from_str("xtuml_metadata/1.0");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("name/version@user")
        );
    }

    #[test]
    fn test_parse_package_ref_empty_parts_fail() {
        assert!(PackageRef::from_str("/1.0@xtuml").is_err());
        assert!(PackageRef::from_str("name/@xtuml").is_err());
        assert!(PackageRef::from_str("name/1.0@").is_err());
    }

    #[test]
    fn test_parse_requirement_exact() {
        let req = Requirement::from_str("xtuml_swa/1.0@xtuml").unwrap();
        assert_eq!(req.name, "xtuml_swa");
        assert_eq!(req.user, "xtuml");
        assert!(req.matches(&v("1.0")));
        assert!(!req.matches(&v("1.1")));
    }

    #[test]
    fn test_parse_requirement_range() {
        let req = Requirement::from_str("xtuml_swa/[>=1.0 <2]@xtuml").unwrap();
        assert!(req.matches(&v("1.0")));
        assert!(req.matches(&v("1.9.9")));
        assert!(!req.matches(&v("2.0")));
        assert!(!req.matches(&v("0.9")));
    }

    #[test]
    fn test_range_lower_bound_is_inclusive() {
        let req = Requirement::from_str("dep/[>=1.0 <2]@u").unwrap();
        assert!(req.matches(&v("1.0")));
        assert!(req.matches(&v("1.0.0")));
    }

    #[test]
    fn test_range_upper_bound_is_exclusive() {
        let req = Requirement::from_str("dep/[>=1.0 <2]@u").unwrap();
        assert!(!req.matches(&v("2")));
        assert!(!req.matches(&v("2.0.1")));
    }

    #[test]
    fn test_range_strict_and_equal_operators() {
        let range: VersionRange = "[>1.0]".parse().unwrap();
        assert!(!range.matches(&v("1.0")));
        assert!(range.matches(&v("1.0.1")));

        let range: VersionRange = "[=1.0]".parse().unwrap();
        assert!(range.matches(&v("1.0")));
        assert!(!range.matches(&v("1.1")));

        let range: VersionRange = "[<=2.0]".parse().unwrap();
        assert!(range.matches(&v("2.0")));
        assert!(!range.matches(&v("2.1")));
    }

    #[test]
    fn test_range_bare_version_means_equal() {
        let range: VersionRange = "[1.0]".parse().unwrap();
        assert!(range.matches(&v("1.0")));
        assert!(!range.matches(&v("1.1")));
    }

    #[test]
    fn test_empty_range_fails() {
        assert!("[]".parse::<VersionRange>().is_err());
        assert!("[ ]".parse::<VersionRange>().is_err());
    }

    #[test]
    fn test_unclosed_range_fails() {
        assert!("[>=1.0".parse::<VersionRange>().is_err());
    }

    #[test]
    fn test_requirement_display_roundtrip() {
        let req = Requirement::from_str("xtuml_swa/[>=1.0 <2]@xtuml").unwrap();
        assert_eq!(format!("{}", req), "xtuml_swa/[>=1.0 <2]@xtuml");

        let req = Requirement::from_str("xtuml_swa/1.0@xtuml").unwrap();
        assert_eq!(format!("{}", req), "xtuml_swa/1.0@xtuml");
    }

    #[test]
    fn test_invalid_range_bound_fails() {
        let result = "[>=]".parse::<VersionRange>();
        assert!(result.is_err());
    }
}
