//! Persistent credential record and the stores that hold it
//!
//! The record mirrors what a browser session keeps across reloads: the access
//! token, the refresh token and the signed-in user's profile. The serialized
//! layout uses the `accessToken`, `refreshToken` and `userInfo` keys.

use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Profile of the signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub account_id: String,
    pub user_name: String,
    pub email: String,
    pub role: String,
}

/// Session credentials persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserProfile>,
}

impl CredentialRecord {
    /// Build a complete record, as produced by a login or a refresh
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_info: UserProfile,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            user_info: Some(user_info),
        }
    }

    /// True when nothing is stored
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user_info.is_none()
    }

    /// Access and refresh token, only when both are present
    pub fn token_pair(&self) -> Option<(&str, &str)> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some((access.as_str(), refresh.as_str())),
            _ => None,
        }
    }
}

/// Key-value persistence for the credential record
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the current record; an empty store yields an empty record
    async fn load(&self) -> CoreResult<CredentialRecord>;

    /// Replace the stored record
    async fn save(&self, record: &CredentialRecord) -> CoreResult<()>;

    /// Remove every stored credential
    async fn clear(&self) -> CoreResult<()>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    record: RwLock<CredentialRecord>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record
    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> CoreResult<CredentialRecord> {
        Ok(self.record.read().await.clone())
    }

    async fn save(&self, record: &CredentialRecord) -> CoreResult<()> {
        *self.record.write().await = record.clone();
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        *self.record.write().await = CredentialRecord::default();
        Ok(())
    }
}

/// JSON file store that survives restarts
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a reader never observes a half-written record.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> CoreResult<CredentialRecord> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(CredentialRecord::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CoreError::storage_error(format!(
                    "Failed to parse credentials at {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, record: &CredentialRecord) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(record)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content).await?;

        // On Unix, owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&temp_path, permissions).await?;
        }

        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// Mock implementation for testing
#[cfg(any(test, feature = "tests"))]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub CredentialStore {}

        #[async_trait]
        impl CredentialStore for CredentialStore {
            async fn load(&self) -> CoreResult<CredentialRecord>;
            async fn save(&self, record: &CredentialRecord) -> CoreResult<()>;
            async fn clear(&self) -> CoreResult<()>;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            account_id: "acc-1".to_string(),
            user_name: "manager".to_string(),
            email: "manager@example.com".to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn test_record_serializes_with_storage_keys() {
        let record = CredentialRecord::new("tok1", "ref1", profile());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["accessToken"], "tok1");
        assert_eq!(value["refreshToken"], "ref1");
        assert_eq!(value["userInfo"]["accountId"], "acc-1");
        assert_eq!(value["userInfo"]["userName"], "manager");
    }

    #[test]
    fn test_empty_record_omits_absent_fields() {
        let value = serde_json::to_value(CredentialRecord::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_token_pair_requires_both_tokens() {
        let mut record = CredentialRecord::new("tok1", "ref1", profile());
        assert_eq!(record.token_pair(), Some(("tok1", "ref1")));

        record.refresh_token = None;
        assert!(record.token_pair().is_none());
        assert!(!record.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_save_and_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_empty());

        let record = CredentialRecord::new("tok1", "ref1", profile());
        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), record);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("credentials.json");

        let record = CredentialRecord::new("tok1", "ref1", profile());
        FileCredentialStore::new(&path).save(&record).await.unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.load().await.unwrap(), record);
        assert!(!dir.path().join("session").join("credentials.json.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store
            .save(&CredentialRecord::new("tok1", "ref1", profile()))
            .await
            .unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("absent.json"));

        assert!(store.load().await.unwrap().is_empty());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store
            .save(&CredentialRecord::new("tok1", "ref1", profile()))
            .await
            .unwrap();
        store.clear().await.unwrap();

        assert!(!store.path().exists());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = FileCredentialStore::new(&path).load().await;
        assert!(matches!(result, Err(CoreError::Storage { .. })));
    }
}
