//! One-shot migration from the plaintext JSON store
//!
//! Older releases kept every key in ~/.keyholder.json. On start-up, if that
//! file still exists, the user is asked once whether to move its contents
//! into the keychain. The file is deleted only after every entry landed.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, Write};

use crate::config::Config;
use crate::error::{validate_name, KeyholderError};
use crate::index::NameIndex;
use crate::store::SecretStore;

/// What a migration attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No legacy file, nothing to do
    NoLegacyStore,
    /// User said no; nothing was touched
    Declined,
    /// This many entries moved into the keychain
    Migrated(usize),
}

pub struct Migrator<'a> {
    config: &'a Config,
    store: &'a dyn SecretStore,
    index: &'a NameIndex,
}

impl<'a> Migrator<'a> {
    pub fn new(config: &'a Config, store: &'a dyn SecretStore, index: &'a NameIndex) -> Self {
        Self {
            config,
            store,
            index,
        }
    }

    /// Run the migration, asking for confirmation on `input`/`output`
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<MigrationOutcome> {
        let legacy_path = &self.config.legacy_path;
        if !legacy_path.exists() {
            return Ok(MigrationOutcome::NoLegacyStore);
        }

        let question = format!(
            "Found legacy plaintext key file {}. Move its keys to the system keychain and delete it?",
            legacy_path.display()
        );
        if !confirm(input, output, &question)? {
            tracing::info!("legacy migration declined");
            return Ok(MigrationOutcome::Declined);
        }

        let entries = self.read_legacy()?;
        for name in entries.keys() {
            validate_name(name)?;
        }

        let mut names = self.index.load()?;
        for (name, secret) in &entries {
            if let Err(e) = self.store.set(&self.config.namespace, name, secret) {
                // Keys already in the keychain must stay listed
                self.index.save(&names)?;
                return Err(e.context(format!("Migration stopped at '{}'", name)));
            }
            names.insert(name.clone());
            tracing::debug!(name = name.as_str(), "migrated");
        }

        self.index.save(&names)?;

        fs::remove_file(legacy_path).with_context(|| {
            format!("Failed to delete legacy key file: {}", legacy_path.display())
        })?;

        tracing::info!(count = entries.len(), "legacy migration complete");
        Ok(MigrationOutcome::Migrated(entries.len()))
    }

    fn read_legacy(&self) -> Result<BTreeMap<String, String>> {
        let path = &self.config.legacy_path;
        let corrupt = |reason: String| KeyholderError::CorruptData {
            path: path.clone(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let entries = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        Ok(entries)
    }
}

/// Ask a yes/no question, defaulting to yes on an empty answer.
/// End of input and anything other than y/yes count as no.
pub fn confirm<R: BufRead, W: Write>(mut input: R, mut output: W, question: &str) -> Result<bool> {
    write!(output, "{} [Y/n] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }

    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Ok(true),
        _ => Ok(false),
    }
}
