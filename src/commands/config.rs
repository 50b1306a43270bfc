use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    config::{DEFAULT_CONFIG_FILE, ModuleConfig},
    http::HttpClient,
    reference::DependencyReference,
    repository::RepositoryFactory,
    resolver::{ResolutionError, Resolver},
    runtime::Runtime,
};

/// Environment variable holding a bearer token for private repositories.
pub const TOKEN_ENV: &str = "ARTRES_TOKEN";

/// Flags shared by commands that resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub strict: bool,
    pub offline: bool,
}

/// Everything a command needs: runtime, HTTP client and the loaded module.
pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub http_client: HttpClient,
    pub module: ModuleConfig,
    pub module_path: PathBuf,
    /// Directory relative flatDir paths are resolved against
    pub base_dir: PathBuf,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn load(runtime: R, module_path: Option<PathBuf>) -> Result<Self> {
        let module_path = module_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let module = ModuleConfig::load(&runtime, &module_path)?;

        let parent = module_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let base_dir = if parent.is_absolute() {
            parent
        } else {
            runtime.current_dir()?.join(parent)
        };
        debug!("Module base directory: {:?}", base_dir);

        let http_client = build_http_client(&runtime)?;

        Ok(Self {
            runtime: Arc::new(runtime),
            http_client,
            module,
            module_path,
            base_dir,
        })
    }

    /// The declared dependencies as references.
    ///
    /// A module that declares dependencies but no repositories fails with
    /// [`ResolutionError::NoSources`] before any reference is validated.
    pub fn references(&self) -> Result<Vec<DependencyReference>> {
        if !self.module.dependencies.is_empty() && self.module.sources()?.is_empty() {
            return Err(ResolutionError::NoSources.into());
        }
        Ok(self.module.references()?)
    }

    /// Build a resolver over the module's repositories, in declaration order.
    pub fn resolver(&self, options: ResolveOptions) -> Result<Resolver> {
        let factory = RepositoryFactory::new(
            self.runtime.clone(),
            self.http_client.clone(),
            &self.base_dir,
        );
        let repositories = factory.open_all(&self.module.sources()?)?;
        Ok(Resolver::new(repositories)
            .strict(options.strict)
            .offline(options.offline))
    }
}

fn build_http_client<R: Runtime>(runtime: &R) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    if let Ok(token) = runtime.env_var(TOKEN_ENV) {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .with_context(|| format!("{} contains invalid characters", TOKEN_ENV))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using {} for authentication: {}", TOKEN_ENV, mask(&token));
    }

    let client = Client::builder()
        .user_agent("artres-cli")
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Keep the first and last four characters of long secrets.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
