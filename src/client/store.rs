use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Failure while reading or writing persisted credentials.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct StoreError(String);

impl StoreError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        StoreError(message.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError(err.to_string())
    }
}

/// Persisted access/refresh token pair. The client reads it on every outbound
/// request and writes it from the auth flow and the refresh sub-flow; it does
/// not own the lifecycle beyond that.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Result<Option<String>, StoreError>;
    fn set_access_token(&self, token: &str) -> Result<(), StoreError>;
    fn refresh_token(&self) -> Result<Option<String>, StoreError>;
    fn set_refresh_token(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// On-disk representation, matching the platform's `token`/`refreshToken`
/// key names.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TokenPair {
    token: Option<String>,
    refresh_token: Option<String>,
}

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<TokenPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a store pre-seeded with a token pair.
    pub fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        Self {
            inner: RwLock::new(TokenPair {
                token: Some(access.to_string()),
                refresh_token: refresh.map(str::to_string),
            }),
        }
    }

    fn read(&self) -> Result<TokenPair, StoreError> {
        self.inner
            .read()
            .map(|pair| pair.clone())
            .map_err(|_| StoreError::new("credential store lock poisoned"))
    }

    fn write(&self, apply: impl FnOnce(&mut TokenPair)) -> Result<(), StoreError> {
        let mut pair = self
            .inner
            .write()
            .map_err(|_| StoreError::new("credential store lock poisoned"))?;
        apply(&mut pair);
        Ok(())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.token)
    }

    fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.write(|pair| pair.token = Some(token.to_string()))
    }

    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.refresh_token)
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.write(|pair| pair.refresh_token = Some(token.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.write(|pair| *pair = TokenPair::default())
    }
}

/// JSON-file-backed store, the CLI analogue of the web app's persisted
/// key/value storage. Last writer wins; there is no cross-process locking.
pub struct FileCredentialStore {
    path: PathBuf,
    cache: RwLock<TokenPair>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, loading any existing token pair. A missing
    /// file is an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let pair = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => TokenPair::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            cache: RwLock::new(pair),
        })
    }

    fn update(&self, apply: impl FnOnce(&mut TokenPair)) -> Result<(), StoreError> {
        let mut pair = self
            .cache
            .write()
            .map_err(|_| StoreError::new("credential store lock poisoned"))?;
        apply(&mut pair);
        fs::write(&self.path, serde_json::to_string_pretty(&*pair)?)?;
        Ok(())
    }

    fn read(&self) -> Result<TokenPair, StoreError> {
        self.cache
            .read()
            .map(|pair| pair.clone())
            .map_err(|_| StoreError::new("credential store lock poisoned"))
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.token)
    }

    fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.update(|pair| pair.token = Some(token.to_string()))
    }

    fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.refresh_token)
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.update(|pair| pair.refresh_token = Some(token.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|pair| *pair = TokenPair::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_tokens() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);

        store.set_access_token("access-1").unwrap();
        store.set_refresh_token("refresh-1").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));

        store.clear().unwrap();
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        {
            let store = FileCredentialStore::open(&path).unwrap();
            store.set_access_token("access-1").unwrap();
            store.set_refresh_token("refresh-1").unwrap();
        }

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(
            reopened.access_token().unwrap().as_deref(),
            Some("access-1")
        );
        assert_eq!(
            reopened.refresh_token().unwrap().as_deref(),
            Some("refresh-1")
        );

        reopened.clear().unwrap();
        let cleared = FileCredentialStore::open(&path).unwrap();
        assert_eq!(cleared.access_token().unwrap(), None);
        assert_eq!(cleared.refresh_token().unwrap(), None);
    }

    #[test]
    fn file_store_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn file_store_uses_platform_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileCredentialStore::open(&path).unwrap();
        store.set_access_token("a").unwrap();
        store.set_refresh_token("r").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["token"], "a");
        assert_eq!(value["refreshToken"], "r");
    }
}
