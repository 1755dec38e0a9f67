use std::path::{Path, PathBuf};

use ratatui::Frame;

use crate::app::{Action, Flow, Screen};
use crate::note::NoteDocument;
use crate::ui::{draw_list_screen, DefaultRenderer, ListViewport};

const HELP: &str = "↑/k up • ↓/j down • enter choose • q quit";

/// One-line-per-note picker. Enter records the chosen path and exits.
pub struct NoteSelector {
    title: String,
    list: ListViewport<NoteDocument>,
    choice: Option<PathBuf>,
    status: Option<String>,
}

impl NoteSelector {
    pub fn new(title: impl Into<String>, mut notes: Vec<NoteDocument>) -> Self {
        notes.sort_by(|a, b| a.title().to_lowercase().cmp(&b.title().to_lowercase()));
        let status = Some(format!("{} notes", notes.len()));
        Self {
            title: title.into(),
            list: ListViewport::new(notes, DefaultRenderer::with_spacing(0), 0, 0),
            choice: None,
            status,
        }
    }

    pub fn list(&self) -> &ListViewport<NoteDocument> {
        &self.list
    }

    pub fn choice(&self) -> Option<&Path> {
        self.choice.as_deref()
    }

    pub fn into_choice(self) -> Option<PathBuf> {
        self.choice
    }
}

impl Screen for NoteSelector {
    fn draw(&mut self, frame: &mut Frame) {
        draw_list_screen(
            frame,
            &mut self.list,
            &self.title,
            self.status.as_deref(),
            HELP,
        );
    }

    fn apply(&mut self, action: Action) -> Flow {
        match action {
            Action::Quit => return Flow::Exit,
            Action::CursorUp => self.list.cursor_up(),
            Action::CursorDown => self.list.cursor_down(),
            Action::GoToTop => self.list.home(),
            Action::GoToBottom => self.list.end(),
            Action::Choose => {
                if let Some(note) = self.list.selected() {
                    tracing::debug!(path = %note.path().display(), "note chosen");
                    self.choice = Some(note.path().to_path_buf());
                    return Flow::Exit;
                }
            }
            Action::SetInProgress | Action::SetComplete | Action::ClearStatus => {}
        }
        Flow::Continue
    }
}
