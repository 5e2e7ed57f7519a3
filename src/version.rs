//! Version parsing and ordering for packages.
//!
//! Package versions are dotted component strings like "1.0" or "2.3.1".
//! They are not required to be semver: any number of components is
//! allowed and components may be non-numeric.

use anyhow::{Result, bail};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A package version such as "1.0" or "2.3.1".
///
/// Ordering is component-wise: numeric components compare numerically
/// ("1.10" is newer than "1.9"), non-numeric components compare as
/// strings, and missing components count as zero ("1.0" equals "1.0.0").
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    Number(u64),
    Text(String),
}

impl Version {
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            bail!("Version cannot be empty.");
        }
        let parts = s
            .split('.')
            .map(|component| {
                if component.is_empty() {
                    bail!("Invalid version '{}': empty component.", s);
                }
                Ok(match component.parse::<u64>() {
                    Ok(n) => Part::Number(n),
                    Err(_) => Part::Text(component.to_string()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Version {
            raw: s.to_string(),
            parts,
        })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            // A missing component compares as zero, so "1.0" == "1.0.0"
            let ord = match (self.parts.get(i), other.parts.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) => a.cmp(&Part::Number(0)),
                (None, Some(b)) => Part::Number(0).cmp(b),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}
