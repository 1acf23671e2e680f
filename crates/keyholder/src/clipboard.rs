//! Clipboard backends and the deferred clear
//!
//! Copying shells out to whatever the platform provides:
//! macOS (pbcopy), WSL/Windows (clip.exe), Wayland (wl-copy), X11 (xclip/xsel).

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::KeyholderError;

/// Something that can replace the system clipboard contents
pub trait ClipboardSink: Send + Sync {
    fn copy(&self, text: &str) -> Result<()>;
}

/// Available clipboard backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS pbcopy
    Pbcopy,
    /// Windows or WSL clip.exe
    Clip,
    /// Wayland wl-copy
    WlCopy,
    /// X11 xclip
    Xclip,
    /// X11 xsel
    Xsel,
    /// No clipboard reachable (headless, SSH without forwarding)
    None,
}

impl Backend {
    /// Detect the best available backend for the current session
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            return Self::Pbcopy;
        }

        #[cfg(target_os = "windows")]
        {
            return Self::Clip;
        }

        #[cfg(target_os = "linux")]
        {
            if std::env::var("WSL_DISTRO_NAME").is_ok() {
                return Self::Clip;
            }
            if std::env::var_os("WAYLAND_DISPLAY").is_some() && Self::command_exists("wl-copy") {
                return Self::WlCopy;
            }
            if std::env::var_os("DISPLAY").is_some() {
                if Self::command_exists("xclip") {
                    return Self::Xclip;
                }
                if Self::command_exists("xsel") {
                    return Self::Xsel;
                }
            }
            return Self::None;
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Self::None
        }
    }

    #[allow(dead_code)]
    fn command_exists(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pbcopy => "pbcopy",
            Self::Clip => "clip.exe",
            Self::WlCopy => "wl-copy",
            Self::Xclip => "xclip",
            Self::Xsel => "xsel",
            Self::None => "none",
        }
    }

    /// Program and arguments used to write `text`
    fn command_line(&self, text: &str) -> Option<(&'static str, Vec<&'static str>)> {
        let clearing = text.is_empty();
        match self {
            Self::Pbcopy => Some(("pbcopy", vec![])),
            Self::Clip => Some(("clip.exe", vec![])),
            Self::WlCopy if clearing => Some(("wl-copy", vec!["--clear"])),
            Self::WlCopy => Some(("wl-copy", vec![])),
            Self::Xclip => Some(("xclip", vec!["-selection", "clipboard"])),
            Self::Xsel if clearing => Some(("xsel", vec!["--clipboard", "--clear"])),
            Self::Xsel => Some(("xsel", vec!["--clipboard", "--input"])),
            Self::None => None,
        }
    }
}

impl ClipboardSink for Backend {
    fn copy(&self, text: &str) -> Result<()> {
        let Some((program, args)) = self.command_line(text) else {
            bail!(KeyholderError::ClipboardUnavailable(
                "no clipboard tool found (install wl-clipboard, xclip or xsel)".to_string()
            ));
        };

        tracing::debug!(backend = self.name(), clearing = text.is_empty(), "clipboard write");
        pipe_to(program, &args, text)
    }
}

/// Feed `text` to `program` on stdin and wait for it to exit
fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    // xclip and wl-copy fork a child that keeps serving the selection;
    // its stdout/stderr must not be pipes we wait on.
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| KeyholderError::ClipboardUnavailable(format!("{}: {}", program, e)))?;

    // Dropping stdin before the wait lets the tool see EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {}", program))?;

    if let Err(e) = written {
        bail!(KeyholderError::ClipboardUnavailable(format!(
            "failed to write to {}: {}",
            program, e
        )));
    }
    if !status.success() {
        bail!(KeyholderError::ClipboardUnavailable(format!(
            "{} exited with {}",
            program, status
        )));
    }

    Ok(())
}

/// Wipes the clipboard some time after a key was copied
pub struct ClipboardClearScheduler {
    clipboard: Arc<dyn ClipboardSink>,
}

impl ClipboardClearScheduler {
    pub fn new(clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self { clipboard }
    }

    /// Overwrite the clipboard with "" once `after` has elapsed.
    ///
    /// Runs on a detached thread, so it never holds the process open: if
    /// the process exits first the clear simply does not happen. A zero
    /// delay schedules nothing. Failures at fire time are logged and
    /// dropped.
    pub fn schedule(&self, after: Duration) -> Option<JoinHandle<()>> {
        if after.is_zero() {
            return None;
        }

        let clipboard = Arc::clone(&self.clipboard);
        let spawned = thread::Builder::new()
            .name("clipboard-clear".to_string())
            .spawn(move || {
                thread::sleep(after);
                match clipboard.copy("") {
                    Ok(()) => tracing::debug!("clipboard cleared"),
                    Err(e) => tracing::warn!("clipboard clear failed: {:#}", e),
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("could not schedule clipboard clear: {}", e);
                None
            }
        }
    }
}
