//! Placing resolved artifacts into an output directory.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive::verify_artifact;
use crate::http::HttpClient;
use crate::repository::{ArtifactLocation, ResolvedArtifact};
use crate::runtime::Runtime;

/// Copy or download `artifact` into `out_dir` and verify it.
///
/// Both local and remote artifacts are staged in `<file>.part`, verified and
/// then renamed into place, so a failed placement only ever removes files
/// written here. An artifact that already is the destination file is
/// verified but left untouched.
#[tracing::instrument(skip(runtime, http_client, artifact), fields(reference = %artifact.reference))]
pub async fn place_artifact<R: Runtime>(
    runtime: &R,
    http_client: &HttpClient,
    artifact: &ResolvedArtifact,
    out_dir: &Path,
) -> Result<PathBuf> {
    runtime
        .create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let file_name = artifact.file_name();
    let dest = out_dir.join(&file_name);

    if let ArtifactLocation::File(src) = &artifact.location
        && is_same_file(runtime, src, &dest)
    {
        debug!("{:?} is already in place", dest);
        verify_artifact(runtime, &dest, &artifact.extension)?;
        return Ok(dest);
    }

    let part = out_dir.join(format!("{}.part", file_name));
    match &artifact.location {
        ArtifactLocation::File(src) => {
            debug!("Copying {:?} to {:?}", src, dest);
            if let Err(e) = runtime.copy(src, &part) {
                discard(runtime, &part);
                return Err(e.context(format!("Failed to copy {:?} to {:?}", src, part)));
            }
        }
        ArtifactLocation::Remote(url) => {
            info!("Downloading {} from {}...", artifact.reference, url);
            let downloaded = http_client
                .download_file(url, || {
                    runtime
                        .create_file(&part)
                        .with_context(|| format!("Failed to create temporary file at {:?}", part))
                })
                .await;

            if let Err(e) = downloaded {
                discard(runtime, &part);
                return Err(e.context(format!("Failed to download {}", url)));
            }
        }
    }

    if let Err(e) = verify_artifact(runtime, &part, &artifact.extension) {
        discard(runtime, &part);
        return Err(e);
    }

    runtime
        .rename(&part, &dest)
        .with_context(|| format!("Failed to move {:?} to {:?}", part, dest))?;

    info!("Placed {} at {:?}", artifact.reference, dest);
    Ok(dest)
}

/// True when both paths exist and resolve to the same file.
fn is_same_file<R: Runtime>(runtime: &R, a: &Path, b: &Path) -> bool {
    match (runtime.canonicalize(a), runtime.canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Best-effort removal of a staged file; failures are logged, not returned.
fn discard<R: Runtime>(runtime: &R, path: &Path) {
    if runtime.exists(path)
        && let Err(e) = runtime.remove_file(path)
    {
        warn!("Failed to remove {:?}: {:#}", path, e);
    }
}
