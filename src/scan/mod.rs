use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use walkdir::WalkDir;

use crate::note::{NoteDocument, NoteParser};

pub const DEFAULT_WORKERS: usize = 10;

/// Parses many notes on a fixed pool of worker threads.
///
/// Paths flow through a bounded work channel, parsed notes through a result
/// channel, and every worker reports on a completion channel before the
/// results are drained. Files that cannot be opened or parsed are logged and
/// left out, so the result may be shorter than the input. Result order is not
/// related to input order.
#[derive(Debug, Clone)]
pub struct Scanner {
    parser: NoteParser,
    workers: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(NoteParser::default(), DEFAULT_WORKERS)
    }
}

impl Scanner {
    pub fn new(parser: NoteParser, workers: usize) -> Self {
        Self {
            parser,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn collect(&self, paths: &[PathBuf], header_only: bool) -> Vec<NoteDocument> {
        let (work_tx, work_rx) = bounded::<&Path>(self.workers);
        let (result_tx, result_rx) = unbounded::<NoteDocument>();
        let (done_tx, done_rx) = bounded::<usize>(self.workers);
        let parser = &self.parser;

        thread::scope(|scope| {
            for worker in 0..self.workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    let mut parsed = 0usize;
                    for path in work_rx.iter() {
                        match parser.parse_file(path, header_only) {
                            Ok(note) => {
                                if result_tx.send(note).is_err() {
                                    break;
                                }
                                parsed += 1;
                            }
                            Err(err) => {
                                tracing::warn!(%err, path = %path.display(), "skipping note");
                            }
                        }
                    }
                    tracing::trace!(worker, parsed, "scan worker finished");
                    let _ = done_tx.send(worker);
                });
            }
            drop(work_rx);
            drop(result_tx);
            drop(done_tx);

            for path in paths {
                if work_tx.send(path.as_path()).is_err() {
                    break;
                }
            }
            drop(work_tx);

            for _ in 0..self.workers {
                if done_rx.recv().is_err() {
                    break;
                }
            }
        });

        let notes: Vec<NoteDocument> = result_rx.iter().collect();
        tracing::debug!(requested = paths.len(), parsed = notes.len(), "scan complete");
        notes
    }
}

/// Recursively lists files under `dir` whose extension matches `extension`
/// (case-insensitive).
pub fn list_note_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(|entry| entry.into_path())
        .collect()
}

pub fn filter_by_tag(notes: Vec<NoteDocument>, tag: &str) -> Vec<NoteDocument> {
    notes
        .into_iter()
        .filter(|note| note.has_tag_containing(tag))
        .collect()
}
