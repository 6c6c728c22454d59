use super::{CredentialItem, CredentialKey, CredentialStore, ServiceClass};

use crate::error::CredentialStoreError;

use common::{ErrorLocation, RedactedSecret};

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, info};

const CREDENTIALS_FILE_NAME: &str = "credentials.json";
const APP_DIR_NAME: &str = "capture-sdk";

/// On-disk layout: `{ "client": { "clientId": "..." }, "user": { ... } }`.
type StoredValues = BTreeMap<String, BTreeMap<String, String>>;

/// JSON file store.
///
/// Every mutation rewrites the whole file through a temp file + rename, under
/// one lock, so readers never see a partial write.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `{data_dir}/capture-sdk/credentials.json`.
    pub fn in_default_location() -> Result<Self, CredentialStoreError> {
        let dir = dirs::data_local_dir().ok_or_else(|| CredentialStoreError::Value {
            message: "Could not determine local data directory".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self::new(dir.join(APP_DIR_NAME).join(CREDENTIALS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoredValues, CredentialStoreError> {
        if !self.path.exists() {
            return Ok(StoredValues::new());
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| CredentialStoreError::Read {
                path: self.path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        if contents.trim().is_empty() {
            return Ok(StoredValues::new());
        }

        serde_json::from_str(&contents).map_err(|e| CredentialStoreError::Format {
            path: self.path.clone(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn persist(&self, values: &StoredValues) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CredentialStoreError::Write {
                path: parent.to_path_buf(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let json = serde_json::to_string_pretty(values).map_err(|e| CredentialStoreError::Format {
            path: self.path.clone(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = self.path.with_extension("json.tmp");

        write_private(&temp_path, &json).map_err(|e| CredentialStoreError::Write {
            path: temp_path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| CredentialStoreError::Write {
            path: self.path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!("Credentials written to {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), CredentialStoreError>
    where
        F: FnOnce(&mut StoredValues),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        mutate(&mut values);
        values.retain(|_, class| !class.is_empty());
        self.persist(&values)
    }
}

/// Write `contents` to a fresh file readable by the owner only.
///
/// On unix the mode is set at creation, so the secrets are never exposed with
/// default permissions. A leftover file from an interrupted write is removed first.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

impl CredentialStore for FileCredentialStore {
    fn get(
        &self,
        service_class: ServiceClass,
        key: CredentialKey,
    ) -> Result<Option<RedactedSecret>, CredentialStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let values = self.load()?;

        Ok(values
            .get(service_class.as_str())
            .and_then(|class| class.get(key.as_str()))
            .map(|value| RedactedSecret::new(value.as_str())))
    }

    fn set_all(&self, items: Vec<CredentialItem>) -> Result<(), CredentialStoreError> {
        self.update(|values| {
            for item in items {
                values
                    .entry(item.service_class.as_str().to_string())
                    .or_default()
                    .insert(item.key.as_str().to_string(), item.value.expose().to_string());
            }
        })
    }

    fn delete_all(
        &self,
        service_class: ServiceClass,
        keys: &[CredentialKey],
    ) -> Result<(), CredentialStoreError> {
        self.update(|values| {
            if let Some(class) = values.get_mut(service_class.as_str()) {
                for key in keys {
                    class.remove(key.as_str());
                }
            }
        })
    }

    fn clear_all(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| CredentialStoreError::Write {
                path: self.path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;
            info!("Credentials cleared at {}", self.path.display());
        }

        Ok(())
    }
}
