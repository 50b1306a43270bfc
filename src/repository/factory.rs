//! Repository factory: opens declared sources into probe-able repositories.

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use super::{FlatDirRepository, MavenRepository, Repository, RepositorySource};
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Creates repositories for declared sources.
///
/// Relative flat directory paths are joined onto `base_dir`, the directory
/// holding the module declaration.
pub struct RepositoryFactory<R: Runtime> {
    runtime: Arc<R>,
    http_client: HttpClient,
    base_dir: PathBuf,
}

impl<R: Runtime + 'static> RepositoryFactory<R> {
    pub fn new(runtime: Arc<R>, http_client: HttpClient, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            http_client,
            base_dir: base_dir.into(),
        }
    }

    /// Open a single source.
    pub fn open(&self, source: &RepositorySource) -> Result<Arc<dyn Repository>> {
        match source {
            RepositorySource::LocalDirectory(dir) => {
                let dir = if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.base_dir.join(dir)
                };
                Ok(Arc::new(FlatDirRepository::new(self.runtime.clone(), dir)))
            }
            RepositorySource::RemoteIndex(index) => {
                let Some(url) = source.base_url() else {
                    bail!("Remote index {} has no base URL", index);
                };
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    bail!(
                        "Unknown remote index '{}'. Expected 'google', 'mavenCentral' or an http(s) URL.",
                        index
                    );
                }
                Ok(Arc::new(MavenRepository::new(
                    self.http_client.clone(),
                    index.clone(),
                    &url,
                )))
            }
        }
    }

    /// Open every source, preserving declaration order.
    pub fn open_all(&self, sources: &[RepositorySource]) -> Result<Vec<Arc<dyn Repository>>> {
        sources.iter().map(|s| self.open(s)).collect()
    }
}
