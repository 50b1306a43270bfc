pub mod archive;
pub mod commands;
pub mod config;
pub mod download;
pub mod http;
pub mod reference;
pub mod repository;
pub mod resolver;
pub mod runtime;

pub use reference::DependencyReference;
pub use repository::{ArtifactLocation, RepositorySource, ResolvedArtifact};
pub use resolver::{ResolutionError, Resolver};
