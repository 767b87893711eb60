//! The boundary between the tree core and whatever UI drives it.

use std::path::Path;

use crate::error::Result;
use crate::fs::node::{File, NodeRef};

/// Capabilities the tree borrows from its host for the duration of one
/// operation: a cursor, prompts, a render sink and a few OS hooks.
///
/// Prompts return `Ok(None)` (or `Ok(false)` for confirmation) when the user
/// cancels; the tree then skips the mutation but still refreshes.
pub trait Host {
    /// Current flattened cursor position.
    fn cursor(&self) -> Result<usize>;

    fn set_cursor(&mut self, position: usize) -> Result<()>;

    /// Ask for one line of text. `targets` are the nodes the answer applies to.
    fn text(&mut self, request: &str, targets: &[NodeRef<'_>]) -> Result<Option<String>>;

    /// Ask for one answer per target, in target order.
    fn texts(&mut self, request: &str, targets: &[NodeRef<'_>]) -> Result<Option<Vec<String>>>;

    fn confirm(&mut self, request: &str, targets: &[NodeRef<'_>]) -> Result<bool>;

    /// Receive the full line payload after a state change.
    fn render(&mut self, lines: Vec<String>) -> Result<()>;

    /// Open a file for editing.
    fn open_file(&mut self, file: &File) -> Result<()>;

    /// Hand a path to the platform's default handler.
    fn open_externally(&mut self, path: &Path) -> Result<()>;

    fn set_clipboard(&mut self, text: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use super::*;
    use crate::error::TreeError;

    /// Host double with scripted answers that records every callback.
    #[derive(Debug, Default)]
    pub struct ScriptedHost {
        pub cursor: Option<usize>,
        pub texts: VecDeque<Option<String>>,
        pub text_lists: VecDeque<Option<Vec<String>>>,
        pub confirms: VecDeque<bool>,
        pub renders: Vec<Vec<String>>,
        pub opened_files: Vec<PathBuf>,
        pub opened_externally: Vec<PathBuf>,
        pub clipboard: Option<String>,
        pub prompted_targets: Vec<Vec<PathBuf>>,
    }

    impl ScriptedHost {
        pub fn at(cursor: usize) -> Self {
            Self {
                cursor: Some(cursor),
                ..Default::default()
            }
        }

        pub fn with_text(mut self, text: &str) -> Self {
            self.texts.push_back(Some(text.to_string()));
            self
        }

        pub fn with_texts(mut self, texts: &[&str]) -> Self {
            self.text_lists
                .push_back(Some(texts.iter().map(|t| t.to_string()).collect()));
            self
        }

        pub fn with_confirm(mut self, answer: bool) -> Self {
            self.confirms.push_back(answer);
            self
        }

        /// Lines of the most recent render.
        pub fn last_render(&self) -> &[String] {
            self.renders.last().map(Vec::as_slice).unwrap_or(&[])
        }

        fn record_targets(&mut self, targets: &[NodeRef<'_>]) {
            self.prompted_targets
                .push(targets.iter().map(|t| t.path()).collect());
        }
    }

    impl Host for ScriptedHost {
        fn cursor(&self) -> Result<usize> {
            self.cursor
                .ok_or_else(|| TreeError::NotFound("no cursor".to_string()))
        }

        fn set_cursor(&mut self, position: usize) -> Result<()> {
            self.cursor = Some(position);
            Ok(())
        }

        fn text(&mut self, _request: &str, targets: &[NodeRef<'_>]) -> Result<Option<String>> {
            self.record_targets(targets);
            Ok(self.texts.pop_front().flatten())
        }

        fn texts(&mut self, _request: &str, targets: &[NodeRef<'_>]) -> Result<Option<Vec<String>>> {
            self.record_targets(targets);
            Ok(self.text_lists.pop_front().flatten())
        }

        fn confirm(&mut self, _request: &str, targets: &[NodeRef<'_>]) -> Result<bool> {
            self.record_targets(targets);
            Ok(self.confirms.pop_front().unwrap_or(false))
        }

        fn render(&mut self, lines: Vec<String>) -> Result<()> {
            self.renders.push(lines);
            Ok(())
        }

        fn open_file(&mut self, file: &File) -> Result<()> {
            self.opened_files.push(file.path());
            Ok(())
        }

        fn open_externally(&mut self, path: &Path) -> Result<()> {
            self.opened_externally.push(path.to_path_buf());
            Ok(())
        }

        fn set_clipboard(&mut self, text: &str) -> Result<()> {
            self.clipboard = Some(text.to_string());
            Ok(())
        }
    }
}
