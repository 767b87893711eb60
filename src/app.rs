use std::mem;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::warn;

use finder_tree::error::{Result, TreeError};
use finder_tree::fs::node::{File, NodeRef};
use finder_tree::{Host, Tree};

/// A tree operation bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Toggle,
    ToggleRec,
    Select,
    ToggleSelectAll,
    ReverseSelected,
    UnselectAll,
    NewFile,
    NewDir,
    Rename,
    Move,
    Remove,
    RemovePermanently,
    Restore,
    Copy,
    Paste,
    Yank,
    OpenExternally,
    OpenDirExternally,
    Cd,
    Home,
    FsRoot,
    Trash,
    Project,
    Refresh,
}

/// What a command needs from the user before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Input(&'static str),
    Confirm(&'static str),
}

impl Command {
    pub fn prompt(self) -> Option<Prompt> {
        match self {
            Command::NewFile => Some(Prompt::Input("New file")),
            Command::NewDir => Some(Prompt::Input("New directory")),
            Command::Rename => Some(Prompt::Input("Rename")),
            Command::Move => Some(Prompt::Input("Move to")),
            Command::Cd => Some(Prompt::Input("Change directory")),
            Command::Remove => Some(Prompt::Confirm("Move to trash?")),
            Command::RemovePermanently => Some(Prompt::Confirm("Delete permanently?")),
            Command::Restore => Some(Prompt::Confirm("Restore?")),
            _ => None,
        }
    }
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    Input {
        command: Command,
        title: String,
        targets: Vec<PathBuf>,
    },
    Confirm {
        command: Command,
        title: String,
        targets: Vec<PathBuf>,
    },
    Error {
        message: String,
    },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset into `input`.
    pub cursor_position: usize,
}

/// The host-side view of the tree: the rendered lines and the cursor.
#[derive(Debug, Default)]
pub struct Panel {
    pub lines: Vec<String>,
    pub cursor: usize,
    pub scroll_offset: usize,
}

impl Panel {
    /// Keep the cursor inside the visible window.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor + 1 - visible_height;
        }
    }

    fn last(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }
}

/// Side effects a command asked for that need the terminal or the OS.
/// The event loop drains them after each key.
#[derive(Debug, Default)]
pub struct Outbox {
    pub edit: Option<PathBuf>,
    pub external: Vec<PathBuf>,
    pub clipboard: Option<String>,
}

impl Outbox {
    pub fn is_empty(&self) -> bool {
        self.edit.is_none() && self.external.is_empty() && self.clipboard.is_none()
    }
}

/// A pre-collected answer to the one prompt a command may raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Names(Vec<String>),
    Confirm(bool),
}

/// [`Host`] implementation lent to the tree for one command. Prompts are
/// answered from `answer`; an absent or mismatched answer means cancelled.
struct Bridge<'a> {
    panel: &'a mut Panel,
    outbox: &'a mut Outbox,
    answer: Option<Answer>,
}

impl Host for Bridge<'_> {
    fn cursor(&self) -> Result<usize> {
        Ok(self.panel.cursor)
    }

    fn set_cursor(&mut self, position: usize) -> Result<()> {
        self.panel.cursor = position;
        Ok(())
    }

    fn text(&mut self, _request: &str, _targets: &[NodeRef<'_>]) -> Result<Option<String>> {
        Ok(match self.answer.take() {
            Some(Answer::Text(text)) => Some(text),
            _ => None,
        })
    }

    fn texts(&mut self, _request: &str, _targets: &[NodeRef<'_>]) -> Result<Option<Vec<String>>> {
        Ok(match self.answer.take() {
            Some(Answer::Names(names)) => Some(names),
            Some(Answer::Text(text)) => Some(vec![text]),
            _ => None,
        })
    }

    fn confirm(&mut self, _request: &str, _targets: &[NodeRef<'_>]) -> Result<bool> {
        Ok(matches!(self.answer.take(), Some(Answer::Confirm(true))))
    }

    fn render(&mut self, lines: Vec<String>) -> Result<()> {
        self.panel.lines = lines;
        self.panel.cursor = self.panel.cursor.min(self.panel.last());
        Ok(())
    }

    fn open_file(&mut self, file: &File) -> Result<()> {
        self.outbox.edit = Some(file.path());
        Ok(())
    }

    fn open_externally(&mut self, path: &Path) -> Result<()> {
        self.outbox.external.push(path.to_path_buf());
        Ok(())
    }

    fn set_clipboard(&mut self, text: &str) -> Result<()> {
        self.outbox.clipboard = Some(text.to_string());
        Ok(())
    }
}

/// Main application state.
pub struct App {
    pub tree: Tree,
    pub panel: Panel,
    pub should_quit: bool,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, Instant)>,
    pub outbox: Outbox,
    confirm_delete: bool,
}

impl App {
    /// Wrap a tree and draw its first frame.
    pub fn new(tree: Tree, confirm_delete: bool) -> Result<Self> {
        let mut app = Self {
            tree,
            panel: Panel::default(),
            should_quit: false,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            outbox: Outbox::default(),
            confirm_delete,
        };
        let mut bridge = Bridge {
            panel: &mut app.panel,
            outbox: &mut app.outbox,
            answer: None,
        };
        app.tree.render(&mut bridge)?;
        Ok(app)
    }

    /// Run a command, opening a dialog first when it needs an answer.
    pub fn run(&mut self, command: Command) {
        match command.prompt() {
            None => self.execute(command, None),
            Some(Prompt::Confirm(_)) if !self.confirm_delete => {
                self.execute(command, Some(Answer::Confirm(true)))
            }
            Some(prompt) => {
                if let Err(err) = self.open_prompt(command, prompt) {
                    self.show_error(&err);
                }
            }
        }
    }

    fn open_prompt(&mut self, command: Command, prompt: Prompt) -> Result<()> {
        let targets = self.prompt_targets(command)?;
        let kind = match prompt {
            Prompt::Input(title) => DialogKind::Input {
                command,
                title: title.to_string(),
                targets,
            },
            Prompt::Confirm(title) => DialogKind::Confirm {
                command,
                title: title.to_string(),
                targets,
            },
        };
        self.open_dialog(kind);
        Ok(())
    }

    /// Paths shown in a command's dialog.
    fn prompt_targets(&mut self, command: Command) -> Result<Vec<PathBuf>> {
        let bridge = Bridge {
            panel: &mut self.panel,
            outbox: &mut self.outbox,
            answer: None,
        };
        match command {
            Command::Cd => Ok(vec![self.tree.root_path()]),
            Command::NewFile | Command::NewDir => {
                let position = bridge.cursor()?;
                let node = self.tree.index_of(position).ok_or_else(|| {
                    TreeError::NotFound(format!("no node at position {position}"))
                })?;
                Ok(vec![node.nearest_dir_path()])
            }
            _ => Ok(self
                .tree
                .targets(&bridge)?
                .into_iter()
                .map(|node| node.path())
                .collect()),
        }
    }

    /// Turn the dialog input into the answer the command expects.
    fn answer_for(&self, command: Command, input: String) -> Answer {
        match command {
            Command::Rename if self.tree.has_selected() => {
                Answer::Names(input.split('/').map(str::to_string).collect())
            }
            Command::NewFile | Command::NewDir => Answer::Names(vec![input]),
            _ => Answer::Text(input),
        }
    }

    /// Submit the current dialog: run the pending command with its answer.
    pub fn submit_dialog(&mut self) {
        let mode = mem::take(&mut self.mode);
        let input = mem::take(&mut self.dialog_state).input;
        match mode {
            AppMode::Dialog(DialogKind::Input { command, .. }) => {
                let answer = self.answer_for(command, input);
                self.execute(command, Some(answer));
            }
            AppMode::Dialog(DialogKind::Confirm { command, .. }) => {
                self.execute(command, Some(Answer::Confirm(true)));
            }
            AppMode::Dialog(DialogKind::Error { .. }) | AppMode::Normal => {}
        }
    }

    /// Dispatch one command against the tree.
    pub fn execute(&mut self, command: Command, answer: Option<Answer>) {
        let mut bridge = Bridge {
            panel: &mut self.panel,
            outbox: &mut self.outbox,
            answer,
        };
        let tree = &mut self.tree;
        let result = match command {
            Command::Up => tree.up(&mut bridge),
            Command::Down => tree.down(&mut bridge),
            Command::Toggle => tree.toggle(&mut bridge),
            Command::ToggleRec => tree.toggle_rec(&mut bridge),
            Command::Select => tree.select(&mut bridge),
            Command::ToggleSelectAll => tree.toggle_select_all(&mut bridge),
            Command::ReverseSelected => tree.reverse_selected(&mut bridge),
            Command::UnselectAll => tree.unselect_all(&mut bridge),
            Command::NewFile => tree.create_file(&mut bridge),
            Command::NewDir => tree.create_dir(&mut bridge),
            Command::Rename => tree.rename(&mut bridge),
            Command::Move => tree.move_to(&mut bridge),
            Command::Remove => tree.remove(&mut bridge),
            Command::RemovePermanently => tree.remove_permanently(&mut bridge),
            Command::Restore => tree.restore(&mut bridge),
            Command::Copy => tree.copy(&mut bridge),
            Command::Paste => tree.paste(&mut bridge),
            Command::Yank => tree.yank(&mut bridge),
            Command::OpenExternally => tree.open_externally(&mut bridge),
            Command::OpenDirExternally => tree.open_dir_externally(&mut bridge),
            Command::Cd => tree.cd(&mut bridge),
            Command::Home => tree.home(&mut bridge),
            Command::FsRoot => tree.fs_root(&mut bridge),
            Command::Trash => tree.trash(&mut bridge),
            Command::Project => tree.project(&mut bridge),
            Command::Refresh => tree.refresh(&mut bridge),
        };
        match result {
            Ok(()) => self.report(command),
            Err(err) => {
                warn!(?command, error = %err, "command failed");
                self.show_error(&err);
            }
        }
    }

    fn report(&mut self, command: Command) {
        match command {
            Command::Copy => {
                let count = self.tree.registry().len();
                self.set_status_message(format!("{count} item(s) in registry"));
            }
            Command::Paste if !self.tree.registry().is_empty() => {
                let count = self.tree.registry().len();
                self.set_status_message(format!("Pasted {count} item(s)"));
            }
            Command::Yank => self.set_status_message("Path copied to clipboard".to_string()),
            _ => {}
        }
    }

    /// Take the pending side effects, leaving an empty outbox.
    pub fn take_outbox(&mut self) -> Outbox {
        mem::take(&mut self.outbox)
    }

    pub fn show_error(&mut self, err: &TreeError) {
        self.open_dialog(DialogKind::Error {
            message: err.to_string(),
        });
    }

    /// Open a dialog of the given kind. Rename dialogs start with the
    /// current names, `/`-separated for a batch.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::Input {
            command: Command::Rename,
            ref targets,
            ..
        } = kind
        {
            let names: Vec<String> = targets
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect();
            let input = names.join("/");
            self.dialog_state.cursor_position = input.len();
            self.dialog_state.input = input;
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog without running anything.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(prev) = state.input[..state.cursor_position].chars().next_back() {
            state.cursor_position -= prev.len_utf8();
            state.input.remove(state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(prev) = state.input[..state.cursor_position].chars().next_back() {
            state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let state = &mut self.dialog_state;
        if let Some(next) = state.input[state.cursor_position..].chars().next() {
            state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn select_next(&mut self) {
        if self.panel.cursor < self.panel.last() {
            self.panel.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.panel.cursor = self.panel.cursor.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.panel.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.panel.cursor = self.panel.last();
    }
}
