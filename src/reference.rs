//! Dependency references: what a module asks the resolver to locate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::resolver::ResolutionError;

/// A dependency reference as declared by a module.
///
/// - `NameWithExtension` is a bare file dependency, satisfiable only by a flat
///   directory (`name = "orion_flutter-release", ext = "aar"`).
/// - `Coordinate` is a published package, satisfiable only by a remote index
///   (`co.epsilondelta:orion-flutter:1.0.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyReference {
    NameWithExtension {
        name: String,
        ext: String,
    },
    Coordinate {
        group: String,
        artifact: String,
        version: String,
    },
}

impl DependencyReference {
    pub fn named(name: impl Into<String>, ext: impl Into<String>) -> Self {
        DependencyReference::NameWithExtension {
            name: name.into(),
            ext: ext.into(),
        }
    }

    pub fn coordinate(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        DependencyReference::Coordinate {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Checks every field against the shape rules of its variant.
    pub fn validate(&self) -> Result<(), ResolutionError> {
        let malformed = |reason: String| ResolutionError::Malformed {
            reference: self.to_string(),
            reason,
        };

        match self {
            DependencyReference::NameWithExtension { name, ext } => {
                check_segment("name", name).map_err(malformed)?;
                check_segment("ext", ext).map_err(malformed)?;
                if ext.contains('.') || ext.starts_with('@') {
                    return Err(malformed(format!(
                        "ext '{}' must be a bare extension such as 'aar'",
                        ext
                    )));
                }
            }
            DependencyReference::Coordinate {
                group,
                artifact,
                version,
            } => {
                check_segment("group", group).map_err(malformed)?;
                if group.split('.').any(str::is_empty) {
                    return Err(malformed(format!(
                        "group '{}' must be dot-separated non-empty segments",
                        group
                    )));
                }
                check_segment("artifact", artifact).map_err(malformed)?;
                check_segment("version", version).map_err(malformed)?;
            }
        }
        Ok(())
    }

    /// File name this reference is stored under, given a packaging extension.
    pub fn file_name(&self, ext: &str) -> String {
        match self {
            DependencyReference::NameWithExtension { name, .. } => format!("{}.{}", name, ext),
            DependencyReference::Coordinate {
                artifact, version, ..
            } => format!("{}-{}.{}", artifact, version, ext),
        }
    }
}

fn check_segment(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(format!("{} '{}' contains whitespace", field, value));
    }
    if value.contains(['/', '\\', ':']) {
        return Err(format!(
            "{} '{}' contains a path or coordinate separator",
            field, value
        ));
    }
    Ok(())
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyReference::NameWithExtension { name, ext } => write!(f, "{}@{}", name, ext),
            DependencyReference::Coordinate {
                group,
                artifact,
                version,
            } => write!(f, "{}:{}:{}", group, artifact, version),
        }
    }
}

impl FromStr for DependencyReference {
    type Err = ResolutionError;

    /// Parses `group:artifact:version`, `name@ext` or `:name@ext`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ResolutionError::Malformed {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let reference = if let Some((name, ext)) = s.rsplit_once('@') {
            let name = name.strip_prefix(':').unwrap_or(name);
            if name.contains(':') {
                return Err(malformed(
                    "a coordinate cannot carry an extension; use either group:artifact:version or name@ext",
                ));
            }
            DependencyReference::named(name, ext)
        } else {
            let parts: Vec<&str> = s.split(':').collect();
            match parts.as_slice() {
                [group, artifact, version] => {
                    DependencyReference::coordinate(*group, *artifact, *version)
                }
                _ => {
                    return Err(malformed(
                        "expected 'group:artifact:version' or 'name@ext'",
                    ));
                }
            }
        };

        reference.validate()?;
        Ok(reference)
    }
}
