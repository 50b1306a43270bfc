use anyhow::Result;

use crate::reference::DependencyReference;

/// Validate a reference string and print its normalized form and kind.
pub fn check(reference: &str) -> Result<()> {
    let reference: DependencyReference = reference.parse()?;
    println!("{} ({})", reference, describe(&reference));
    Ok(())
}

fn describe(reference: &DependencyReference) -> &'static str {
    match reference {
        DependencyReference::NameWithExtension { .. } => "file dependency, resolved from flatDir",
        DependencyReference::Coordinate { .. } => "module coordinate, resolved from remote indexes",
    }
}
