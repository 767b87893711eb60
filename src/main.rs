mod app;
mod components;
mod event;
mod handler;
mod logging;
mod platform;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use finder_tree::config::{AppConfig, GeneralConfig, LogConfig, TreeConfig};
use finder_tree::error::{Result, TreeError};
use finder_tree::Tree;

use crate::app::{App, Command};
use crate::event::{Event, EventHandler};
use crate::platform::SystemClipboard;
use crate::tui::{install_panic_hook, Tui};

/// A line-oriented terminal directory browser.
#[derive(Parser, Debug)]
#[command(name = "finder", version, about)]
struct Cli {
    /// Root path to display (defaults to `general.default_path`, then the
    /// current directory)
    path: Option<PathBuf>,

    /// Explicit config file, layered over the discovered ones
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trash directory for soft deletes
    #[arg(long)]
    trash_dir: Option<PathBuf>,

    /// Write logs to this file (filter with $FINDER_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags expressed as a config layer so they merge like any other.
    fn overrides(&self) -> AppConfig {
        let lossy = |p: &PathBuf| p.to_string_lossy().to_string();
        AppConfig {
            general: GeneralConfig {
                default_path: self.path.as_ref().map(lossy),
                ..Default::default()
            },
            tree: TreeConfig {
                trash_dir: self.trash_dir.as_ref().map(lossy),
                ..Default::default()
            },
            log: LogConfig {
                file: self.log_file.as_ref().map(lossy),
                ..Default::default()
            },
        }
    }
}

/// Carry out what the last command queued: OS opens, the clipboard and the
/// editor, which needs the terminal handed over.
fn perform_effects(app: &mut App, tui: &mut Tui, clipboard: &mut SystemClipboard) -> Result<()> {
    let outbox = app.take_outbox();
    if outbox.is_empty() {
        return Ok(());
    }
    for path in &outbox.external {
        if let Err(err) = platform::open_with_system(path) {
            app.show_error(&err);
        }
    }
    if let Some(text) = &outbox.clipboard {
        if let Err(err) = clipboard.copy(text) {
            app.show_error(&err);
        }
    }
    if let Some(path) = &outbox.edit {
        tui.suspend()?;
        let edited = platform::run_editor(path);
        tui.resume()?;
        match edited {
            Ok(()) => app.execute(Command::Refresh, None),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "editor failed");
                app.show_error(&err);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    logging::init_logging(config.log_file().as_deref(), config.log_level())?;

    let start = config
        .general
        .default_path
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let path = start
        .canonicalize()
        .map_err(|_| TreeError::InvalidPath(format!("{} does not exist", start.display())))?;

    let tree = Tree::new(&path, config.settings()?)?;
    info!(root = %path.display(), "starting");

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut app = App::new(tree, config.confirm_delete())?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let mut clipboard = SystemClipboard::new();
    info!(desktop = clipboard.uses_desktop(), "clipboard ready");

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => app.clear_expired_status(),
            Event::Resize => {}
        }

        perform_effects(&mut app, &mut tui, &mut clipboard)?;

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
