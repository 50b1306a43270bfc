use anyhow::Result;
use std::path::PathBuf;

use super::config::{Config, ResolveOptions};
use crate::download::place_artifact;
use crate::runtime::Runtime;

pub const DEFAULT_OUT_DIR: &str = "build/libs";

/// Resolve every dependency, then copy or download it into the output directory.
///
/// All references are resolved before anything is written, so a missing
/// dependency leaves the output directory untouched.
#[tracing::instrument(skip(runtime, module_path, out_dir))]
pub async fn fetch<R: Runtime + 'static>(
    runtime: R,
    module_path: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    options: ResolveOptions,
) -> Result<()> {
    let config = Config::load(runtime, module_path)?;
    let references = config.references()?;

    if references.is_empty() {
        println!("No dependencies declared.");
        return Ok(());
    }

    let artifacts = config.resolver(options)?.resolve_all(&references).await?;

    let out_dir = match out_dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => config.base_dir.join(dir),
        None => config.base_dir.join(DEFAULT_OUT_DIR),
    };

    for artifact in &artifacts {
        let placed = place_artifact(
            config.runtime.as_ref(),
            &config.http_client,
            artifact,
            &out_dir,
        )
        .await?;
        println!("{} -> {}", artifact.reference, placed.display());
    }
    Ok(())
}
