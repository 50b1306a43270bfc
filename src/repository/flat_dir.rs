//! Flat directory repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ArtifactLocation, Repository, RepositoryKind, ResolvedArtifact};
use crate::reference::DependencyReference;
use crate::runtime::Runtime;

/// A local directory searched for `<name>.<ext>` files.
pub struct FlatDirRepository<R: Runtime> {
    runtime: Arc<R>,
    dir: PathBuf,
    name: String,
}

impl<R: Runtime> FlatDirRepository<R> {
    pub fn new(runtime: Arc<R>, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("flatDir({})", dir.display());
        Self { runtime, dir, name }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl<R: Runtime + 'static> Repository for FlatDirRepository<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::FlatDir
    }

    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn locate(&self, reference: &DependencyReference) -> Result<Option<ResolvedArtifact>> {
        let DependencyReference::NameWithExtension { name, ext } = reference else {
            return Ok(None);
        };

        if !self.runtime.is_dir(&self.dir) {
            debug!("{} does not exist, skipping", self.dir.display());
            return Ok(None);
        }

        let candidate = self.dir.join(format!("{}.{}", name, ext));
        if !self.runtime.is_file(&candidate) {
            debug!("No {} in {}", candidate.display(), self.dir.display());
            return Ok(None);
        }

        // Real path, so `libs` and `libs/../libs` locate the same file
        let path = self
            .runtime
            .canonicalize(&candidate)
            .with_context(|| format!("Failed to resolve {}", candidate.display()))?;

        debug!("Found {}", path.display());
        Ok(Some(ResolvedArtifact {
            reference: reference.clone(),
            repository: self.name.clone(),
            extension: ext.clone(),
            location: ArtifactLocation::File(path),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_locate_existing_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("libs")))
            .returning(|_| true);
        runtime
            .expect_is_file()
            .with(eq(PathBuf::from("libs/orion_flutter-release.aar")))
            .returning(|_| true);
        runtime
            .expect_canonicalize()
            .returning(|p| Ok(Path::new("/work").join(p)));

        let repo = FlatDirRepository::new(Arc::new(runtime), "libs");
        let reference = DependencyReference::named("orion_flutter-release", "aar");

        let artifact = repo.locate(&reference).await.unwrap().unwrap();
        assert_eq!(artifact.repository, "flatDir(libs)");
        assert_eq!(artifact.extension, "aar");
        assert_eq!(
            artifact.location,
            ArtifactLocation::File(PathBuf::from("/work/libs/orion_flutter-release.aar"))
        );
    }

    #[tokio::test]
    async fn test_locate_missing_file() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        runtime.expect_is_file().returning(|_| false);

        let repo = FlatDirRepository::new(Arc::new(runtime), "libs");
        let reference = DependencyReference::named("orion_flutter-release", "aar");

        assert!(repo.locate(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_locate_missing_directory_is_not_an_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| false);

        let repo = FlatDirRepository::new(Arc::new(runtime), "libs");
        let reference = DependencyReference::named("orion_flutter-release", "aar");

        assert!(repo.locate(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_coordinate_never_probes_filesystem() {
        // No expectations: any runtime call would panic
        let runtime = MockRuntime::new();
        let repo = FlatDirRepository::new(Arc::new(runtime), "libs");
        let reference = DependencyReference::coordinate("co.epsilondelta", "orion-flutter", "1.0.0");

        assert!(repo.locate(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_locate_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("orion_flutter-release.aar"), b"PK").unwrap();
        // Same name with another extension must not match
        std::fs::write(dir.path().join("other.jar"), b"PK").unwrap();

        let repo = FlatDirRepository::new(Arc::new(RealRuntime), dir.path());

        let found = repo
            .locate(&DependencyReference::named("orion_flutter-release", "aar"))
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = repo
            .locate(&DependencyReference::named("orion_flutter-release", "jar"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_equivalent_directories_locate_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("libs")).unwrap();
        std::fs::write(dir.path().join("libs/orion_flutter-release.aar"), b"PK").unwrap();
        let reference = DependencyReference::named("orion_flutter-release", "aar");

        let plain = FlatDirRepository::new(Arc::new(RealRuntime), dir.path().join("libs"));
        let dotted = FlatDirRepository::new(
            Arc::new(RealRuntime),
            dir.path().join("./libs/../libs"),
        );

        let a = plain.locate(&reference).await.unwrap().unwrap();
        let b = dotted.locate(&reference).await.unwrap().unwrap();
        assert_ne!(a.repository, b.repository);
        assert_eq!(a.location, b.location);
    }
}
