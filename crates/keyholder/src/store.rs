//! Secret store - where key values actually live
//!
//! Values go to the OS keychain under a fixed service namespace. Nothing in
//! this crate writes a secret value to disk itself.

use anyhow::{bail, Result};

use crate::error::KeyholderError;

/// Backend holding secret values, addressed by (namespace, name)
pub trait SecretStore: Send + Sync {
    /// Store or overwrite a value
    fn set(&self, namespace: &str, name: &str, secret: &str) -> Result<()>;

    /// Fetch a value, `None` when absent
    fn get(&self, namespace: &str, name: &str) -> Result<Option<String>>;

    /// Remove a value. Absent entries are an error.
    fn delete(&self, namespace: &str, name: &str) -> Result<()>;
}

/// OS keychain via the `keyring` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(namespace: &str, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(namespace, name)
            .map_err(|e| KeyholderError::Store(e.to_string()).into())
    }
}

impl SecretStore for KeyringStore {
    fn set(&self, namespace: &str, name: &str, secret: &str) -> Result<()> {
        tracing::debug!(namespace, name, "keyring set");
        Self::entry(namespace, name)?
            .set_password(secret)
            .map_err(|e| KeyholderError::Store(e.to_string()))?;
        Ok(())
    }

    fn get(&self, namespace: &str, name: &str) -> Result<Option<String>> {
        tracing::debug!(namespace, name, "keyring get");
        match Self::entry(namespace, name)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => bail!(KeyholderError::Store(e.to_string())),
        }
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        tracing::debug!(namespace, name, "keyring delete");
        match Self::entry(namespace, name)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => bail!(KeyholderError::Store(format!(
                "No keychain entry for '{}'",
                name
            ))),
            Err(e) => bail!(KeyholderError::Store(e.to_string())),
        }
    }
}
