//! Module declaration: the Android library module this tool resolves for.
//!
//! Stored as JSON with the same vocabulary as the Gradle DSL:
//!
//! ```json
//! {
//!   "namespace": "co.epsilondelta.orion_flutter",
//!   "compileSdk": 35,
//!   "defaultConfig": { "minSdk": 21, "targetSdk": 34 },
//!   "compileOptions": { "sourceCompatibility": "1.8", "targetCompatibility": "1.8" },
//!   "kotlinOptions": { "jvmTarget": "1.8" },
//!   "repositories": [ { "flatDir": "libs" }, "google", "mavenCentral" ],
//!   "dependencies": [ { "name": "orion_flutter-release", "ext": "aar" } ]
//! }
//! ```

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::reference::DependencyReference;
use crate::repository::RepositorySource;
use crate::resolver::ResolutionError;
use crate::runtime::Runtime;

pub const DEFAULT_CONFIG_FILE: &str = "module.json";

/// Java language level, as used by `sourceCompatibility`/`targetCompatibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaVersion(u8);

impl JavaVersion {
    pub const VERSION_1_8: JavaVersion = JavaVersion(8);
    pub const VERSION_11: JavaVersion = JavaVersion(11);
    pub const VERSION_17: JavaVersion = JavaVersion(17);

    const MIN: u8 = 6;
    const MAX: u8 = 21;

    pub fn feature(&self) -> u8 {
        self.0
    }
}

impl Default for JavaVersion {
    fn default() -> Self {
        JavaVersion::VERSION_1_8
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= 8 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for JavaVersion {
    type Err = anyhow::Error;

    /// Accepts `1.8`, `8`, `17`, `VERSION_1_8` and `VERSION_17`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_prefix("VERSION_")
            .map(|v| v.replace('_', "."))
            .unwrap_or_else(|| trimmed.to_string());
        let number = number.strip_prefix("1.").unwrap_or(&number);

        let feature: u8 = number
            .parse()
            .with_context(|| format!("Invalid Java version '{}'", s))?;
        if !(Self::MIN..=Self::MAX).contains(&feature) {
            bail!(
                "Unsupported Java version '{}'. Expected 1.{}..1.8 or 9..{}.",
                s,
                Self::MIN,
                Self::MAX
            );
        }
        Ok(JavaVersion(feature))
    }
}

impl Serialize for JavaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JavaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u8),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(t) => t,
            Raw::Number(n) => n.to_string(),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultConfig {
    pub min_sdk: u32,
    pub target_sdk: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    #[serde(default)]
    pub source_compatibility: JavaVersion,
    #[serde(default)]
    pub target_compatibility: JavaVersion,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KotlinOptions {
    /// Defaults to the target compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm_target: Option<String>,
}

/// One entry of the `repositories` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RepositoryDeclaration {
    /// `"google"`, `"mavenCentral"`
    Named(String),
    FlatDir {
        #[serde(rename = "flatDir")]
        flat_dir: FlatDirs,
    },
    Maven {
        maven: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FlatDirs {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl RepositoryDeclaration {
    /// Expands to sources, in order. A flatDir with several dirs yields one
    /// source per dir.
    pub fn sources(&self) -> Result<Vec<RepositorySource>> {
        Ok(match self {
            RepositoryDeclaration::Named(name) => match name.as_str() {
                "google" | "mavenCentral" => vec![RepositorySource::RemoteIndex(name.clone())],
                other => bail!(
                    "Unknown repository '{}'. Expected 'google', 'mavenCentral', {{\"flatDir\": ...}} or {{\"maven\": ...}}.",
                    other
                ),
            },
            RepositoryDeclaration::FlatDir { flat_dir } => match flat_dir {
                FlatDirs::One(dir) => vec![RepositorySource::LocalDirectory(dir.clone())],
                FlatDirs::Many(dirs) => dirs
                    .iter()
                    .cloned()
                    .map(RepositorySource::LocalDirectory)
                    .collect(),
            },
            RepositoryDeclaration::Maven { maven } => {
                if !(maven.starts_with("https://") || maven.starts_with("http://")) {
                    bail!("Maven repository URL must be http(s): '{}'", maven);
                }
                vec![RepositorySource::RemoteIndex(maven.clone())]
            }
        })
    }
}

/// One entry of the `dependencies` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyDeclaration {
    /// `"group:artifact:version"` or `"name@ext"`
    Notation(String),
    Fields(DependencyFields),
}

/// Map notation. Which fields are present decides the reference variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DependencyFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DependencyDeclaration {
    /// Turns the declaration into a validated reference.
    pub fn to_reference(&self) -> Result<DependencyReference, ResolutionError> {
        match self {
            DependencyDeclaration::Notation(notation) => notation.parse(),
            DependencyDeclaration::Fields(fields) => fields.to_reference(),
        }
    }
}

impl DependencyFields {
    fn to_reference(&self) -> Result<DependencyReference, ResolutionError> {
        let reference = match self {
            DependencyFields {
                name: Some(name),
                ext: Some(ext),
                group: None,
                artifact: None,
                version: None,
            } => DependencyReference::named(name, ext),
            DependencyFields {
                name: None,
                ext: None,
                group: Some(group),
                artifact: Some(artifact),
                version: Some(version),
            } => DependencyReference::coordinate(group, artifact, version),
            _ => {
                return Err(ResolutionError::Malformed {
                    reference: self.describe(),
                    reason: "expected either {name, ext} or {group, artifact, version}".to_string(),
                });
            }
        };
        reference.validate()?;
        Ok(reference)
    }

    fn describe(&self) -> String {
        let fields = [
            ("name", &self.name),
            ("ext", &self.ext),
            ("group", &self.group),
            ("artifact", &self.artifact),
            ("version", &self.version),
        ];
        let present: Vec<String> = fields
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}={}", key, v)))
            .collect();
        format!("{{{}}}", present.join(", "))
    }
}

/// The Android library module declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub namespace: String,
    pub compile_sdk: u32,
    pub default_config: DefaultConfig,
    #[serde(default)]
    pub compile_options: CompileOptions,
    #[serde(default)]
    pub kotlin_options: KotlinOptions,
    #[serde(default)]
    pub repositories: Vec<RepositoryDeclaration>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
}

impl ModuleConfig {
    /// Load and validate a module declaration.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading module declaration from {:?}", path);
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read module declaration {:?}", path))?;
        let config: ModuleConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse module declaration {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid module declaration {:?}", path))?;
        Ok(config)
    }

    /// Effective Kotlin JVM target.
    pub fn jvm_target(&self) -> String {
        self.kotlin_options
            .jvm_target
            .clone()
            .unwrap_or_else(|| self.compile_options.target_compatibility.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace)?;

        let DefaultConfig {
            min_sdk,
            target_sdk,
        } = self.default_config;
        if min_sdk < 1 {
            bail!("minSdk must be at least 1");
        }
        if min_sdk > target_sdk {
            bail!("minSdk ({}) exceeds targetSdk ({})", min_sdk, target_sdk);
        }
        if min_sdk > self.compile_sdk {
            bail!("minSdk ({}) exceeds compileSdk ({})", min_sdk, self.compile_sdk);
        }
        if target_sdk > self.compile_sdk {
            warn!(
                "targetSdk ({}) is higher than compileSdk ({})",
                target_sdk, self.compile_sdk
            );
        }

        let target = self.compile_options.target_compatibility;
        let jvm_target = self.jvm_target();
        let jvm: JavaVersion = jvm_target
            .parse()
            .with_context(|| format!("Invalid jvmTarget '{}'", jvm_target))?;
        if jvm != target {
            bail!(
                "Inconsistent JVM-target compatibility: targetCompatibility is {} but jvmTarget is {}",
                target,
                jvm
            );
        }

        // Surface unknown repositories early
        self.sources()?;
        Ok(())
    }

    /// Repository sources in probe order.
    pub fn sources(&self) -> Result<Vec<RepositorySource>> {
        let mut sources = Vec::new();
        for declaration in &self.repositories {
            sources.extend(declaration.sources()?);
        }
        Ok(sources)
    }

    /// Every dependency as a validated reference.
    pub fn references(&self) -> Result<Vec<DependencyReference>, ResolutionError> {
        self.dependencies
            .iter()
            .map(DependencyDeclaration::to_reference)
            .collect()
    }
}

fn validate_namespace(namespace: &str) -> Result<()> {
    let segments: Vec<&str> = namespace.split('.').collect();
    if segments.len() < 2 {
        bail!(
            "namespace '{}' must have at least two segments, e.g. 'com.example.lib'",
            namespace
        );
    }
    for segment in segments {
        let mut chars = segment.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            bail!(
                "namespace '{}' has an invalid segment '{}'",
                namespace,
                segment
            );
        }
    }
    Ok(())
}
