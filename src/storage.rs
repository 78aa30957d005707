use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Abstract credential lookup interface
pub trait TokenStorage {
    /// Return the stored token. If none is stored, returns Ok(None)
    fn load(&self) -> Result<Option<String>>;
}

/// Token taken from the `GITHUB_TOKEN` environment variable.
pub struct EnvTokenStorage<'a> {
    env: &'a HashMap<String, String>,
}

impl<'a> EnvTokenStorage<'a> {
    pub const VAR: &'static str = "GITHUB_TOKEN";

    pub fn new(env: &'a HashMap<String, String>) -> Self {
        EnvTokenStorage { env }
    }
}

impl TokenStorage for EnvTokenStorage<'_> {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .env
            .get(Self::VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

/// File-based token lookup at `<home>/.milestone-closer/token`.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(home: &Path) -> Self {
        FileTokenStorage {
            path: home.join(".milestone-closer").join("token"),
        }
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read token file")?;
        let token = content.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }
}

/// Returns the first token found, trying `storages` in order.
pub fn load_token(storages: &[&dyn TokenStorage]) -> Result<Option<String>> {
    for storage in storages {
        if let Some(token) = storage.load()? {
            return Ok(Some(token));
        }
    }
    Ok(None)
}
