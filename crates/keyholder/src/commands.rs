//! Command handlers
//!
//! Every write goes to the keychain first and then rewrites the index, so
//! the index names exactly the keys this tool believes are stored.

use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::clipboard::{ClipboardClearScheduler, ClipboardSink};
use crate::config::Config;
use crate::error::{validate_name, KeyholderError};
use crate::index::NameIndex;
use crate::migrate::{MigrationOutcome, Migrator};
use crate::store::SecretStore;

/// Result of `get`
#[derive(Debug)]
pub enum Retrieved {
    /// The key is on the clipboard
    Copied {
        /// Delay before the clipboard is wiped, if any
        clears_in: Option<Duration>,
        /// Pending clear; dropping it detaches the thread
        clear_task: Option<JoinHandle<()>>,
    },
    /// Clipboard failed; the caller has to deliver the key some other way
    NotCopied {
        secret: String,
        error: anyhow::Error,
    },
}

/// The keyholder: name index + keychain + clipboard
pub struct Keyholder {
    config: Config,
    index: NameIndex,
    store: Arc<dyn SecretStore>,
    clipboard: Arc<dyn ClipboardSink>,
}

impl Keyholder {
    pub fn new(
        config: Config,
        store: Arc<dyn SecretStore>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let index = NameIndex::new(&config.index_path);
        Self {
            config,
            index,
            store,
            clipboard,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Move a legacy JSON store into the keychain, if one exists
    pub fn migrate<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<MigrationOutcome> {
        Migrator::new(&self.config, self.store.as_ref(), &self.index).run(input, output)
    }

    /// Store a key. An existing key with the same name is overwritten.
    pub fn set(&self, name: &str, secret: &str) -> Result<()> {
        validate_name(name)?;

        self.store.set(&self.config.namespace, name, secret)?;
        self.index.insert(name)?;

        tracing::info!(name, "key stored");
        Ok(())
    }

    /// Copy a key to the clipboard, wiping it again after `timeout`
    pub fn get(&self, name: &str, timeout: Duration) -> Result<Retrieved> {
        let Some(secret) = self.store.get(&self.config.namespace, name)? else {
            bail!(KeyholderError::NotFound(name.to_string()));
        };

        if let Err(error) = self.clipboard.copy(&secret) {
            tracing::debug!(name, "clipboard copy failed, falling back to stdout");
            return Ok(Retrieved::NotCopied { secret, error });
        }

        let clear_task = ClipboardClearScheduler::new(Arc::clone(&self.clipboard)).schedule(timeout);
        let clears_in = (!timeout.is_zero()).then_some(timeout);

        Ok(Retrieved::Copied {
            clears_in,
            clear_task,
        })
    }

    /// All known names, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.index.load()?.into_iter().collect())
    }

    /// Delete a key from the keychain and the index.
    ///
    /// The name leaves the index even when the keychain delete fails; that
    /// error is still returned.
    pub fn remove(&self, name: &str) -> Result<()> {
        if !self.index.contains(name)? {
            bail!(KeyholderError::NotFound(name.to_string()));
        }

        let deleted = self.store.delete(&self.config.namespace, name);
        self.index.remove(name)?;

        if deleted.is_err() {
            tracing::debug!(name, "keychain delete failed after index removal");
        }
        deleted?;

        tracing::info!(name, "key removed");
        Ok(())
    }
}
