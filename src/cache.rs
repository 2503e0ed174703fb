use crate::error::Result;
use crate::token::CachedToken;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// File-backed store for one cached token.
///
/// The cache is a dumb store: freshness policy (the expiry buffer, the
/// decision to refetch) lives entirely in the token provider. `read` never
/// fails — a missing, unreadable or corrupt file is simply no cached token.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Create a cache backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenCache { path: path.into() }
    }

    /// The file this cache persists to
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the cached token, if any.
    /// Missing file, I/O failure and corrupt content all return `None`.
    pub fn read(&self) -> Option<CachedToken> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(token) => Some(token),
            Err(_) => {
                debug!(path = %self.path.display(), "discarding corrupt token cache");
                None
            }
        }
    }

    /// Durably persist a token, creating parent directories as needed
    pub fn write(&self, token: &CachedToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(token)?)?;
        Ok(())
    }

    /// Remove the persisted token; an already-absent file is success
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for TokenCache {
    /// Cache at the well-known temp location
    fn default() -> Self {
        TokenCache::new(std::env::temp_dir().join("etims").join("token.json"))
    }
}
