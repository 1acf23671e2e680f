//! keyholder - manage API keys from the command line
//!
//! Commands:
//! - set <NAME> [KEY]: Store a key (prompts if no key given)
//! - get <NAME> [--timeout N]: Copy a key to the clipboard, clear after N seconds
//! - list: List stored key names
//! - remove <NAME>: Delete a key

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keyholder::{
    Backend, Config, KeyholderError, Keyholder, KeyringStore, MigrationOutcome, Retrieved,
};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keyholder")]
#[command(about = "Keyholder: A simple CLI to manage and retrieve API keys.")]
#[command(version)]
#[command(after_help = r#"STORAGE:
    - Keys are stored in the system keychain under the service "keyholder"
    - Key names are listed in ~/.keyholder_index (mode 0600)
    - A legacy ~/.keyholder.json is offered for migration on first run

ENVIRONMENT:
    RUST_LOG    Log filter for diagnostics on stderr (e.g. keyholder=debug)"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save an API key for a service
    Set {
        /// Name of the service (e.g., 'elevenlabs', 'openai')
        name: String,
        /// The API key itself (omit for a hidden prompt)
        key: Option<String>,
    },

    /// Retrieve an API key and copy it to the clipboard
    Get {
        /// Name of the service
        name: String,
        /// Seconds before the clipboard is cleared (0 keeps it)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List all saved service names
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Remove an API key from storage
    Remove {
        /// Name of the service
        name: String,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries keys and listings
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<KeyholderError>()
                .map(KeyholderError::exit_code)
                .unwrap_or(2);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let keyholder = Keyholder::new(
        config,
        Arc::new(KeyringStore::new()),
        Arc::new(Backend::detect()),
    );

    migrate(&keyholder);

    match cli.command {
        Some(Commands::Set { name, key }) => cmd_set(&keyholder, &name, key),
        Some(Commands::Get { name, timeout }) => cmd_get(&keyholder, &name, timeout),
        Some(Commands::List { json }) => cmd_list(&keyholder, json),
        Some(Commands::Remove { name }) => cmd_remove(&keyholder, &name),
        None => cmd_list(&keyholder, false),
    }
}

/// Offer to migrate the legacy JSON store. Failure never blocks the command.
fn migrate(keyholder: &Keyholder) {
    let outcome = keyholder.migrate(io::stdin().lock(), io::stderr());
    // stdout is reserved for command output (e.g. `list --json`)
    let _ = report_migration(outcome, io::stderr());
}

/// Describe a migration attempt on the status stream
fn report_migration<W: Write>(outcome: Result<MigrationOutcome>, mut status: W) -> io::Result<()> {
    match outcome {
        Ok(MigrationOutcome::Migrated(count)) => {
            writeln!(status, "Migrated {} key(s) to the system keychain.", count)
        }
        Ok(MigrationOutcome::Declined) => {
            writeln!(status, "Migration skipped. You will be asked again next time.")
        }
        Ok(MigrationOutcome::NoLegacyStore) => Ok(()),
        Err(e) => writeln!(
            status,
            "Error: Migration aborted, legacy file left in place: {:#}",
            e
        ),
    }
}

/// The clear thread dies with the process, so don't promise it
fn clear_notice(delay: Duration) -> String {
    format!(
        "Clipboard clear scheduled in {} seconds (only happens if keyholder is still running).",
        delay.as_secs()
    )
}

/// Store a key
fn cmd_set(keyholder: &Keyholder, name: &str, key: Option<String>) -> Result<()> {
    let secret = match key {
        Some(k) => k,
        None => {
            let entered = rpassword::prompt_password(format!("API key for '{}': ", name))
                .context("Failed to read API key")?;

            if entered.is_empty() {
                bail!("Empty key not allowed");
            }

            entered
        }
    };

    keyholder.set(name, &secret)?;
    println!("Key for '{}' saved successfully.", name);

    Ok(())
}

/// Copy a key to the clipboard
fn cmd_get(keyholder: &Keyholder, name: &str, timeout: Option<u64>) -> Result<()> {
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or(keyholder.config().clipboard_timeout);

    match keyholder.get(name, timeout)? {
        Retrieved::Copied { clears_in, .. } => {
            println!("Key for '{}' has been copied to your clipboard.", name);
            if let Some(delay) = clears_in {
                println!("{}", clear_notice(delay));
            }
        }
        Retrieved::NotCopied { secret, error } => {
            eprintln!("Error: {:#}", error);
            println!("Key: {}", secret);
        }
    }

    Ok(())
}

/// List stored names
fn cmd_list(keyholder: &Keyholder, json: bool) -> Result<()> {
    let names = keyholder.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No keys saved currently.");
        return Ok(());
    }

    println!("Saved service keys:");
    for name in &names {
        println!("  - {}", name);
    }

    Ok(())
}

/// Delete a key
fn cmd_remove(keyholder: &Keyholder, name: &str) -> Result<()> {
    keyholder.remove(name)?;
    println!("Key for '{}' removed successfully.", name);
    Ok(())
}
