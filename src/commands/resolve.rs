use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use super::config::{Config, ResolveOptions};
use crate::runtime::Runtime;

/// Resolve every declared dependency and print where each one comes from.
#[tracing::instrument(skip(runtime, module_path))]
pub async fn resolve<R: Runtime + 'static>(
    runtime: R,
    module_path: Option<PathBuf>,
    options: ResolveOptions,
    json: bool,
) -> Result<()> {
    let config = Config::load(runtime, module_path)?;
    let references = config.references()?;

    if references.is_empty() {
        println!("No dependencies declared.");
        return Ok(());
    }

    let resolver = config.resolver(options)?;
    debug!(
        "Resolving {} dependency(ies) against {} repository(ies)",
        references.len(),
        resolver.repositories().len()
    );
    let artifacts = resolver.resolve_all(&references).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
    } else {
        for artifact in &artifacts {
            println!(
                "{} -> {} ({})",
                artifact.reference, artifact.location, artifact.repository
            );
        }
    }
    Ok(())
}
