//! Archive verification for placed artifacts.
//!
//! An `aar` is a ZIP that must carry `AndroidManifest.xml` at its root; a
//! `jar` only has to be a readable ZIP. Other extensions are not inspected.

use anyhow::{Context, Result, bail};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::runtime::Runtime;

const ANDROID_MANIFEST: &str = "AndroidManifest.xml";

/// Verify the archive at `path` matches its packaging `extension`.
#[tracing::instrument(skip(runtime))]
pub fn verify_artifact<R: Runtime>(runtime: &R, path: &Path, extension: &str) -> Result<()> {
    if !matches!(extension, "aar" | "jar") {
        debug!("Not verifying {:?}: unknown packaging '{}'", path, extension);
        return Ok(());
    }

    // zip needs Read + Seek, Runtime::open only gives Read
    let mut buffer = Vec::new();
    runtime
        .open(path)
        .with_context(|| format!("Failed to open artifact {:?}", path))?
        .read_to_end(&mut buffer)
        .with_context(|| format!("Failed to read artifact {:?}", path))?;

    let archive = ZipArchive::new(std::io::Cursor::new(buffer))
        .with_context(|| format!("{:?} is not a valid {} archive", path, extension))?;

    if extension == "aar" && archive.index_for_name(ANDROID_MANIFEST).is_none() {
        bail!("{:?} is not an Android library: missing {}", path, ANDROID_MANIFEST);
    }

    debug!("{:?} verified ({} entries)", path, archive.len());
    Ok(())
}
