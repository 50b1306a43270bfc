use anyhow::Result;
use std::path::PathBuf;

use crate::config::{DEFAULT_CONFIG_FILE, ModuleConfig};
use crate::runtime::Runtime;

/// Print the module declaration: identity, SDK levels, toolchain, repositories
/// in probe order and dependencies.
#[tracing::instrument(skip(runtime, module_path))]
pub fn show<R: Runtime>(runtime: R, module_path: Option<PathBuf>) -> Result<()> {
    let module_path = module_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let module = ModuleConfig::load(&runtime, &module_path)?;
    print!("{}", render(&module)?);
    Ok(())
}

fn render(module: &ModuleConfig) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("Namespace:   {}\n", module.namespace));
    out.push_str(&format!("compileSdk:  {}\n", module.compile_sdk));
    out.push_str(&format!("minSdk:      {}\n", module.default_config.min_sdk));
    out.push_str(&format!("targetSdk:   {}\n", module.default_config.target_sdk));
    out.push_str(&format!(
        "Java:        source {} / target {}\n",
        module.compile_options.source_compatibility, module.compile_options.target_compatibility
    ));
    out.push_str(&format!("jvmTarget:   {}\n", module.jvm_target()));

    let sources = module.sources()?;
    out.push_str("\nRepositories:\n");
    if sources.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, source) in sources.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, source));
    }

    out.push_str("\nDependencies:\n");
    if module.dependencies.is_empty() {
        out.push_str("  (none)\n");
    }
    for declaration in &module.dependencies {
        match declaration.to_reference() {
            Ok(reference) => out.push_str(&format!("  {}\n", reference)),
            Err(e) => out.push_str(&format!("  (invalid) {}\n", e)),
        }
    }
    Ok(out)
}
