//! Repository abstraction for artifact lookup.
//!
//! A module declares an ordered list of repository sources. Each source is
//! opened into a [`Repository`] that can tell whether it holds an artifact for
//! a given [`DependencyReference`].
//!
//! - `flat_dir` - local flat directory (`libs/orion_flutter-release.aar`)
//! - `maven` - remote Maven-layout index (Google, Maven Central, custom)
//! - `factory` - turns declared sources into repositories

mod factory;
mod flat_dir;
mod maven;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::reference::DependencyReference;

pub use factory::RepositoryFactory;
pub use flat_dir::FlatDirRepository;
pub use maven::{MavenRepository, extract_packaging, packaging_extension};

pub const GOOGLE_URL: &str = "https://dl.google.com/dl/android/maven2";
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// A declared way of locating artifacts. Order of declaration is probe order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
    /// Flat directory searched by file name.
    LocalDirectory(PathBuf),
    /// Maven-layout index; either an alias (`google`, `mavenCentral`) or a base URL.
    RemoteIndex(String),
}

impl RepositorySource {
    pub fn google() -> Self {
        RepositorySource::RemoteIndex("google".to_string())
    }

    pub fn maven_central() -> Self {
        RepositorySource::RemoteIndex("mavenCentral".to_string())
    }

    pub fn kind(&self) -> RepositoryKind {
        match self {
            RepositorySource::LocalDirectory(_) => RepositoryKind::FlatDir,
            RepositorySource::RemoteIndex(_) => RepositoryKind::Maven,
        }
    }

    /// Expanded base URL of a remote index, without trailing slash.
    /// Returns None for local directories.
    pub fn base_url(&self) -> Option<String> {
        match self {
            RepositorySource::LocalDirectory(_) => None,
            RepositorySource::RemoteIndex(index) => Some(match index.as_str() {
                "google" => GOOGLE_URL.to_string(),
                "mavenCentral" => MAVEN_CENTRAL_URL.to_string(),
                url => url.trim_end_matches('/').to_string(),
            }),
        }
    }
}

impl fmt::Display for RepositorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositorySource::LocalDirectory(path) => write!(f, "flatDir({})", path.display()),
            RepositorySource::RemoteIndex(index) => write!(f, "{}", index),
        }
    }
}

/// Repository kind; decides which reference shapes a repository can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    FlatDir,
    Maven,
}

impl RepositoryKind {
    /// Flat directories hold bare files, remote indexes hold coordinates.
    pub fn accepts(&self, reference: &DependencyReference) -> bool {
        matches!(
            (self, reference),
            (
                RepositoryKind::FlatDir,
                DependencyReference::NameWithExtension { .. }
            ) | (RepositoryKind::Maven, DependencyReference::Coordinate { .. })
        )
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryKind::FlatDir => write!(f, "flatDir"),
            RepositoryKind::Maven => write!(f, "maven"),
        }
    }
}

/// Where a resolved artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLocation {
    File(PathBuf),
    Remote(String),
}

impl ArtifactLocation {
    /// Last path segment of the location.
    pub fn file_name(&self) -> Option<String> {
        match self {
            ArtifactLocation::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ArtifactLocation::Remote(url) => url
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::File(path) => write!(f, "{}", path.display()),
            ArtifactLocation::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// A located binary artifact, ready for the build's link step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    pub reference: DependencyReference,
    /// Display name of the repository that satisfied the reference
    pub repository: String,
    /// Packaging extension (`aar`, `jar`, ...)
    pub extension: String,
    pub location: ArtifactLocation,
}

impl ResolvedArtifact {
    /// File name to use when placing the artifact on disk.
    pub fn file_name(&self) -> String {
        self.location
            .file_name()
            .unwrap_or_else(|| self.reference.file_name(&self.extension))
    }
}

/// Trait for artifact repositories (flat directories, Maven indexes).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// Display name, e.g. `flatDir(libs)` or `google`.
    fn name(&self) -> &str;

    fn kind(&self) -> RepositoryKind;

    /// Look for an artifact matching `reference`.
    ///
    /// `Ok(None)` means this repository does not hold it; `Err` means the
    /// repository could not be probed.
    async fn locate(&self, reference: &DependencyReference) -> Result<Option<ResolvedArtifact>>;
}
