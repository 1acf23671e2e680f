//! keyholder - API keys in the OS keychain
//!
//! "Copy it, paste it, forget it."
//!
//! Secret values live in the system keychain (macOS Keychain, Windows
//! Credential Manager, Secret Service on Linux) under one service
//! namespace. The keychain can't be enumerated, so a small index file
//! tracks which names exist. `get` puts a key on the clipboard and wipes
//! it again after a delay.
//!
//! Older releases kept keys in a plaintext JSON file; it is migrated into
//! the keychain the first time a newer release runs.

pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod migrate;
pub mod store;

#[cfg(test)]
mod test_support;

pub use clipboard::{Backend, ClipboardClearScheduler, ClipboardSink};
pub use commands::{Keyholder, Retrieved};
pub use config::{Config, Settings};
pub use error::KeyholderError;
pub use index::NameIndex;
pub use migrate::{MigrationOutcome, Migrator};
pub use store::{KeyringStore, SecretStore};
