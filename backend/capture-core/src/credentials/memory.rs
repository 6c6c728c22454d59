use super::{CredentialItem, CredentialKey, CredentialStore, ServiceClass};

use crate::error::CredentialStoreError;

use common::RedactedSecret;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Process-local store. One lock covers every value, so multi-key writes are
/// atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    values: Mutex<HashMap<(ServiceClass, CredentialKey), RedactedSecret>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(
        &self,
        service_class: ServiceClass,
        key: CredentialKey,
    ) -> Result<Option<RedactedSecret>, CredentialStoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&(service_class, key)).cloned())
    }

    fn set_all(&self, items: Vec<CredentialItem>) -> Result<(), CredentialStoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            values.insert((item.service_class, item.key), item.value);
        }
        Ok(())
    }

    fn delete_all(
        &self,
        service_class: ServiceClass,
        keys: &[CredentialKey],
    ) -> Result<(), CredentialStoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            values.remove(&(service_class, *key));
        }
        Ok(())
    }

    fn clear_all(&self) -> Result<(), CredentialStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
