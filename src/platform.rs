//! OS integration for the terminal host: the desktop opener, the terminal
//! clipboard and the user's editor.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{info, warn};

use finder_tree::error::{Result, TreeError};

/// Program that hands a path to the desktop's default application.
pub fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Launch the default application for `path` without waiting for it.
pub fn open_with_system(path: &Path) -> Result<()> {
    let program = opener();
    Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| TreeError::Terminal(format!("failed to run {program}: {e}")))?;
    info!(path = %path.display(), program, "opened externally");
    Ok(())
}

/// OSC 52 sequence that sets the system clipboard to `text`.
pub fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// The desktop clipboard when one is reachable, the terminal emulator's
/// OSC 52 clipboard otherwise (headless sessions, SSH).
///
/// The `arboard` handle lives as long as the host: on X11 the copied text is
/// served by this process and disappears with the handle.
pub struct SystemClipboard {
    desktop: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let desktop = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                warn!(error = %err, "no desktop clipboard, falling back to OSC 52");
                None
            }
        };
        Self { desktop }
    }

    /// Handle that always goes through the terminal.
    pub fn terminal_only() -> Self {
        Self { desktop: None }
    }

    pub fn uses_desktop(&self) -> bool {
        self.desktop.is_some()
    }

    pub fn copy(&mut self, text: &str) -> Result<()> {
        if let Some(desktop) = self.desktop.as_mut() {
            match desktop.set_text(text.to_owned()) {
                Ok(()) => return Ok(()),
                Err(err) => warn!(error = %err, "desktop clipboard failed, using OSC 52"),
            }
        }
        write_osc52(&mut io::stdout(), text)
    }
}

fn write_osc52<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(osc52(text).as_bytes())?;
    out.flush()?;
    Ok(())
}

/// `$VISUAL`, then `$EDITOR`, then `vi`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Run the editor on `path` in the foreground and wait for it to exit.
pub fn run_editor(path: &Path) -> Result<()> {
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| TreeError::Terminal(format!("failed to open editor {program}: {e}")))?;
    if !status.success() {
        return Err(TreeError::Terminal(format!(
            "editor exited with status {status}"
        )));
    }
    Ok(())
}
