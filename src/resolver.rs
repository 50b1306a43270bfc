//! Dependency resolution over an ordered list of repositories.
//!
//! Repositories are probed in declaration order and the first one holding a
//! matching artifact wins. A repository only sees references of the shape it
//! can satisfy: flat directories take `name@ext`, remote indexes take
//! `group:artifact:version`.
//!
//! In strict mode every capable repository is probed and more than one
//! distinct match is reported as [`ResolutionError::Ambiguous`].

use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use crate::reference::DependencyReference;
use crate::repository::{Repository, RepositoryKind, ResolvedArtifact};

#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No repository declared at all; a configuration error.
    #[error("No repositories declared. Declare at least one flatDir or remote index.")]
    NoSources,

    #[error("Malformed dependency reference '{reference}': {reason}")]
    Malformed { reference: String, reason: String },

    #[error("Could not find {reference}. {}", describe_searched(.searched))]
    NotFound {
        reference: String,
        searched: Vec<String>,
    },

    #[error("{reference} is ambiguous; it was found in: {}", .candidates.join(", "))]
    Ambiguous {
        reference: String,
        candidates: Vec<String>,
    },

    #[error("Repository '{repository}' could not be probed for {reference}: {message}")]
    Probe {
        repository: String,
        reference: String,
        message: String,
    },
}

fn describe_searched(searched: &[String]) -> String {
    if searched.is_empty() {
        "No declared repository can hold this kind of reference.".to_string()
    } else {
        format!("Searched in: {}", searched.join(", "))
    }
}

/// Resolves dependency references against an ordered repository list.
///
/// Holds no mutable state; repeated calls see the same repositories.
pub struct Resolver {
    repositories: Vec<Arc<dyn Repository>>,
    strict: bool,
    offline: bool,
}

impl Resolver {
    pub fn new(repositories: Vec<Arc<dyn Repository>>) -> Self {
        Self {
            repositories,
            strict: false,
            offline: false,
        }
    }

    /// Probe every capable repository and reject multiple distinct matches.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Skip remote indexes.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn repositories(&self) -> &[Arc<dyn Repository>] {
        &self.repositories
    }

    fn is_capable(&self, repository: &dyn Repository, reference: &DependencyReference) -> bool {
        let kind = repository.kind();
        if self.offline && kind == RepositoryKind::Maven {
            return false;
        }
        kind.accepts(reference)
    }

    /// Resolve one reference to exactly one artifact.
    #[tracing::instrument(skip(self), fields(reference = %reference))]
    pub async fn resolve(
        &self,
        reference: &DependencyReference,
    ) -> Result<ResolvedArtifact, ResolutionError> {
        if self.repositories.is_empty() {
            return Err(ResolutionError::NoSources);
        }
        reference.validate()?;

        let mut searched = Vec::new();
        let mut found: Vec<ResolvedArtifact> = Vec::new();

        for repository in &self.repositories {
            if !self.is_capable(repository.as_ref(), reference) {
                debug!("Skipping {} for {}", repository.name(), reference);
                continue;
            }

            searched.push(repository.name().to_string());
            let located = repository.locate(reference).await.map_err(|e| {
                ResolutionError::Probe {
                    repository: repository.name().to_string(),
                    reference: reference.to_string(),
                    message: format!("{:#}", e),
                }
            })?;

            let Some(artifact) = located else {
                continue;
            };

            if !self.strict {
                info!("Resolved {} from {}", reference, artifact.repository);
                return Ok(artifact);
            }
            // Flat dirs report real paths, so one file seen twice is one candidate
            if !found.iter().any(|a| a.location == artifact.location) {
                found.push(artifact);
            }
        }

        match found.len() {
            0 => Err(ResolutionError::NotFound {
                reference: reference.to_string(),
                searched,
            }),
            1 => {
                let artifact = found.remove(0);
                info!("Resolved {} from {}", reference, artifact.repository);
                Ok(artifact)
            }
            _ => Err(ResolutionError::Ambiguous {
                reference: reference.to_string(),
                candidates: found
                    .iter()
                    .map(|a| format!("{} ({})", a.location, a.repository))
                    .collect(),
            }),
        }
    }

    /// Resolve every reference, failing on the first error.
    pub async fn resolve_all(
        &self,
        references: &[DependencyReference],
    ) -> Result<Vec<ResolvedArtifact>, ResolutionError> {
        let mut artifacts = Vec::with_capacity(references.len());
        for reference in references {
            artifacts.push(self.resolve(reference).await?);
        }
        Ok(artifacts)
    }
}
