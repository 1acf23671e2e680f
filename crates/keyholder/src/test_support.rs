//! In-memory doubles for the keychain and the clipboard

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::clipboard::ClipboardSink;
use crate::error::KeyholderError;
use crate::store::SecretStore;

/// Keychain double keyed by (namespace, name)
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
    fail_on: Option<String>,
    unavailable: bool,
}

impl MemoryStore {
    /// `set` for this name fails as if the backend went away
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Every call fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn value(&self, namespace: &str, name: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.unavailable || self.fail_on.as_deref() == Some(name) {
            bail!(KeyholderError::Store("secret service not running".to_string()));
        }
        Ok(())
    }
}

impl SecretStore for MemoryStore {
    fn set(&self, namespace: &str, name: &str, secret: &str) -> Result<()> {
        self.check(name)?;
        self.entries
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), secret.to_string());
        Ok(())
    }

    fn get(&self, namespace: &str, name: &str) -> Result<Option<String>> {
        self.check(name)?;
        Ok(self.value(namespace, name))
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.check(name)?;
        let removed = self
            .entries
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()));
        if removed.is_none() {
            bail!(KeyholderError::Store(format!("No keychain entry for '{}'", name)));
        }
        Ok(())
    }
}

/// Clipboard double that remembers every write
#[derive(Default)]
pub struct RecordingClipboard {
    history: Mutex<Vec<String>>,
    broken: bool,
}

impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    /// Current contents, "" if never written
    pub fn contents(&self) -> String {
        self.history.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        if self.broken {
            bail!(KeyholderError::ClipboardUnavailable("no display".to_string()));
        }
        self.history.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
