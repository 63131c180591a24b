//! Named secret lookup (the access token lives here, never in config).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub trait CredentialStore {
    fn get_property(&self, name: &str) -> Option<String>;
}

/// Reads properties from the process environment. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Loads `.env` from the working directory (if any) before reading the environment.
    pub fn with_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(target: "sheetsync::credentials", "loaded {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(target: "sheetsync::credentials", ".env not loaded: {}", e),
        }
        Self
    }
}

impl CredentialStore for EnvCredentials {
    fn get_property(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// Properties kept in a flat JSON object file: `{"GITHUB_PAT": "..."}`.
#[derive(Debug, Clone, Default)]
pub struct FileCredentials {
    props: HashMap<String, String>,
}

impl FileCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials file {}", path.display()))?;
        let props: HashMap<String, String> = serde_json::from_str(&text)
            .with_context(|| format!("credentials file {} is not a JSON object of strings", path.display()))?;
        Ok(Self { props })
    }
}

impl CredentialStore for FileCredentials {
    fn get_property(&self, name: &str) -> Option<String> {
        self.props.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

impl CredentialStore for HashMap<String, String> {
    fn get_property(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

impl<C: CredentialStore + ?Sized> CredentialStore for Box<C> {
    fn get_property(&self, name: &str) -> Option<String> {
        (**self).get_property(name)
    }
}
