use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode, Command, DialogKind};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match app.mode {
        AppMode::Normal => handle_normal_mode(app, key),
        AppMode::Dialog(DialogKind::Input { .. }) => handle_input_dialog(app, key),
        AppMode::Dialog(DialogKind::Confirm { .. }) => handle_confirm_dialog(app, key),
        AppMode::Dialog(DialogKind::Error { .. }) => handle_error_dialog(app, key),
    }
}

/// Command bound to a key in normal mode.
pub fn command_for(key: KeyEvent) -> Option<Command> {
    let command = match key.code {
        KeyCode::Char('l') | KeyCode::Enter | KeyCode::Right => Command::Down,
        KeyCode::Char('h') | KeyCode::Backspace | KeyCode::Left => Command::Up,
        KeyCode::Char('o') | KeyCode::Tab => Command::Toggle,
        KeyCode::Char('O') => Command::ToggleRec,
        KeyCode::Char(' ') => Command::Select,
        KeyCode::Char('a') => Command::ToggleSelectAll,
        KeyCode::Char('i') => Command::ReverseSelected,
        KeyCode::Esc => Command::UnselectAll,
        KeyCode::Char('n') => Command::NewFile,
        KeyCode::Char('N') => Command::NewDir,
        KeyCode::Char('r') => Command::Rename,
        KeyCode::Char('m') => Command::Move,
        KeyCode::Char('d') => Command::Remove,
        KeyCode::Char('D') => Command::RemovePermanently,
        KeyCode::Char('u') => Command::Restore,
        KeyCode::Char('y') => Command::Copy,
        KeyCode::Char('p') => Command::Paste,
        KeyCode::Char('Y') => Command::Yank,
        KeyCode::Char('x') => Command::OpenExternally,
        KeyCode::Char('X') => Command::OpenDirExternally,
        KeyCode::Char('c') => Command::Cd,
        KeyCode::Char('~') => Command::Home,
        KeyCode::Char('\\') => Command::FsRoot,
        KeyCode::Char('t') => Command::Trash,
        KeyCode::Char('P') => Command::Project,
        KeyCode::Char('R') => Command::Refresh,
        _ => return None,
    };
    Some(command)
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        _ => {
            if let Some(command) = command_for(key) {
                app.run(command);
            }
        }
    }
}

fn handle_input_dialog(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_dialog(),
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

fn handle_confirm_dialog(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.submit_dialog(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

fn handle_error_dialog(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
        app.close_dialog();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finder_tree::{Tree, TreeSettings};
    use std::fs::{self, File};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup_app() -> (TempDir, PathBuf, App) {
        let dir = TempDir::new().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        let work = base.join("work");
        fs::create_dir_all(work.join("sub")).unwrap();
        File::create(work.join("a.txt")).unwrap();
        let settings = TreeSettings::with_trash_dir(base.join("trash")).unwrap();
        let app = App::new(Tree::new(&work, settings).unwrap(), true).unwrap();
        (dir, work, app)
    }

    #[test]
    fn bindings_cover_uppercase_variants() {
        assert_eq!(command_for(key(KeyCode::Char('o'))), Some(Command::Toggle));
        assert_eq!(command_for(key(KeyCode::Char('O'))), Some(Command::ToggleRec));
        assert_eq!(command_for(key(KeyCode::Char('d'))), Some(Command::Remove));
        assert_eq!(
            command_for(key(KeyCode::Char('D'))),
            Some(Command::RemovePermanently)
        );
        assert_eq!(command_for(key(KeyCode::Char('y'))), Some(Command::Copy));
        assert_eq!(command_for(key(KeyCode::Char('Y'))), Some(Command::Yank));
        assert_eq!(command_for(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let (_dir, _work, mut app) = setup_app();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let (_dir, _work, mut app) = setup_app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn j_and_k_move_cursor() {
        let (_dir, _work, mut app) = setup_app();
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.panel.cursor, 2);
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.panel.cursor, 1);
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        assert_eq!(app.panel.cursor, 2);
    }

    #[test]
    fn typing_in_dialog_does_not_trigger_commands() {
        let (_dir, work, mut app) = setup_app();
        handle_key_event(&mut app, key(KeyCode::Char('N')));
        for c in "qdx".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }
        assert!(!app.should_quit);
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(work.join("qdx").is_dir());
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn confirm_dialog_answers_y_and_n() {
        let (_dir, work, mut app) = setup_app();
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        handle_key_event(&mut app, key(KeyCode::Char('d')));
        handle_key_event(&mut app, key(KeyCode::Char('n')));
        assert!(work.join("a.txt").exists());

        handle_key_event(&mut app, key(KeyCode::Char('d')));
        handle_key_event(&mut app, key(KeyCode::Char('y')));
        assert!(!work.join("a.txt").exists());
    }

    #[test]
    fn error_dialog_dismisses_on_esc() {
        let (_dir, _work, mut app) = setup_app();
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        handle_key_event(&mut app, key(KeyCode::Char('o')));
        assert!(matches!(
            app.mode,
            AppMode::Dialog(DialogKind::Error { .. })
        ));
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, AppMode::Normal);
    }
}
