use std::path::Path;

use anyhow::{Context, Result};
use ratatui::Frame;

use crate::app::{Action, Flow, Screen};
use crate::config::TaskMarkers;
use crate::note::{desegmentize, segmentize, Journal, NoteDocument, Segment};
use crate::ui::{draw_list_screen, DefaultRenderer, ListViewport};

const HELP: &str = "↑/k up • ↓/j down • p in progress • C complete • c clear • q quit";

/// Interactive view over the segments of one note. Marker changes are
/// written back to the note file immediately.
pub struct TaskBoard {
    journal: Journal,
    note: NoteDocument,
    list: ListViewport<Segment>,
    markers: TaskMarkers,
    status: Option<String>,
    // segments cannot express a final newline after a non-blank line
    trailing_newline: bool,
}

impl TaskBoard {
    pub fn open(journal: Journal, path: &Path, markers: TaskMarkers) -> Result<Self> {
        let note = journal
            .load(path)
            .with_context(|| format!("could not open note {}", path.display()))?;
        let segments = segmentize(note.body());
        let trailing_newline = note.body().ends_with('\n');
        let mut list = ListViewport::new(segments, DefaultRenderer::default(), 0, 0);
        if let Some(first_task) = list.items().iter().position(Segment::is_task) {
            list.select(first_task);
        }
        Ok(Self {
            journal,
            note,
            list,
            markers,
            status: None,
            trailing_newline,
        })
    }

    pub fn note(&self) -> &NoteDocument {
        &self.note
    }

    pub fn list(&self) -> &ListViewport<Segment> {
        &self.list
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The body as it would be saved, keeping the loaded final newline.
    pub fn body(&self) -> String {
        let mut body = desegmentize(self.list.items());
        if self.trailing_newline && !body.ends_with('\n') {
            body.push('\n');
        }
        body
    }

    /// Sets the marker of the selected task and saves the note.
    pub fn mark_selected(&mut self, marker: Option<char>) -> Result<bool> {
        let mut changed = false;
        self.list.update_selected(|segment| {
            changed = segment.set_task_marker(marker);
        });
        if !changed {
            return Ok(false);
        }
        self.note.set_body(self.body());
        self.journal
            .save(&self.note)
            .with_context(|| format!("saving {}", self.note.path().display()))?;
        Ok(true)
    }

    fn apply_marker(&mut self, marker: Option<char>, label: &str) {
        match self.mark_selected(marker) {
            Ok(true) => self.status = Some(format!("Marked {label}")),
            Ok(false) => self.status = Some("Not a task".to_string()),
            Err(err) => {
                tracing::error!(?err, "failed to save task marker");
                self.status = Some(format!("Save failed: {err:#}"));
            }
        }
    }
}

impl Screen for TaskBoard {
    fn draw(&mut self, frame: &mut Frame) {
        let title = format!("{}: Tasks", self.note.title());
        draw_list_screen(frame, &mut self.list, &title, self.status.as_deref(), HELP);
    }

    fn apply(&mut self, action: Action) -> Flow {
        match action {
            Action::Quit => return Flow::Exit,
            Action::CursorUp => self.list.cursor_up(),
            Action::CursorDown => self.list.cursor_down(),
            Action::GoToTop => self.list.home(),
            Action::GoToBottom => self.list.end(),
            Action::Choose => {}
            Action::SetInProgress => {
                self.apply_marker(Some(self.markers.in_progress), "in progress")
            }
            Action::SetComplete => self.apply_marker(Some(self.markers.complete), "complete"),
            Action::ClearStatus => self.apply_marker(Some(self.markers.clear), "open"),
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const NOTE: &str = "title: chores\ntags: home\n------\n\n2024-05-01:\n\n-[]: dishes\n-[x]: laundry\nnotes\n";

    fn board(dir: &TempDir) -> (TaskBoard, std::path::PathBuf) {
        let path = dir.path().join("chores.txt");
        fs::write(&path, NOTE).expect("write note");
        let board = TaskBoard::open(Journal::default(), &path, TaskMarkers::default())
            .expect("open board");
        (board, path)
    }

    #[test]
    fn opens_on_first_task() {
        let dir = TempDir::new().expect("tempdir");
        let (board, _) = board(&dir);
        assert_eq!(board.list().cursor(), 2);
        assert_eq!(board.list().len(), 5);
    }

    #[test]
    fn completing_a_task_rewrites_the_file() {
        let dir = TempDir::new().expect("tempdir");
        let (mut board, path) = board(&dir);
        assert_eq!(board.apply(Action::SetComplete), Flow::Continue);
        assert_eq!(board.status(), Some("Marked complete"));
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(
            written,
            "title: chores\ntags: home\n------\n\n2024-05-01:\n\n-[x]: dishes\n-[x]: laundry\nnotes\n"
        );
    }

    #[test]
    fn repeated_marker_edits_keep_every_other_byte() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("t.txt");
        fs::write(&path, "title: t\n------\n\n-[]: dishes\nnotes\n").expect("write note");
        let mut board = TaskBoard::open(Journal::default(), &path, TaskMarkers::default())
            .expect("open board");
        board.apply(Action::SetComplete);
        board.apply(Action::ClearStatus);
        assert_eq!(
            fs::read_to_string(&path).expect("read back"),
            "title: t\n------\n\n-[ ]: dishes\nnotes\n"
        );
    }

    #[test]
    fn body_without_final_newline_stays_without_one() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("t.txt");
        fs::write(&path, "title: t\n------\n\n-[]: a\n\n").expect("write note");
        let mut board = TaskBoard::open(Journal::default(), &path, TaskMarkers::default())
            .expect("open board");
        board.apply(Action::SetComplete);
        assert_eq!(board.body(), "-[x]: a\n\n");

        fs::write(&path, "title: t\n------\n\n-[]: b").expect("write note");
        let mut board = TaskBoard::open(Journal::default(), &path, TaskMarkers::default())
            .expect("open board");
        board.apply(Action::SetComplete);
        assert_eq!(board.body(), "-[x]: b");
    }

    #[test]
    fn clearing_and_progress_use_configured_markers() {
        let dir = TempDir::new().expect("tempdir");
        let (mut board, _) = board(&dir);
        board.apply(Action::CursorDown);
        board.apply(Action::ClearStatus);
        assert!(board.body().contains("-[ ]: laundry"));
        board.apply(Action::SetInProgress);
        assert!(board.body().contains("-[-]: laundry"));
    }

    #[test]
    fn markers_on_plain_lines_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let (mut board, path) = board(&dir);
        board.apply(Action::GoToTop);
        board.apply(Action::SetComplete);
        assert_eq!(board.status(), Some("Not a task"));
        assert_eq!(fs::read_to_string(&path).expect("read"), NOTE);
    }

    #[test]
    fn quit_exits() {
        let dir = TempDir::new().expect("tempdir");
        let (mut board, _) = board(&dir);
        assert_eq!(board.apply(Action::Quit), Flow::Exit);
    }
}
