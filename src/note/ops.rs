use std::fs::{self, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::{Date, OffsetDateTime};

use super::{NoteDocument, NoteFormat, NoteParser, NoteWriter, ParseError};

pub const NOTE_EXTENSION: &str = "txt";

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("could not parse note: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("file `{0}` already exists")]
    AlreadyExists(PathBuf),

    #[error("invalid date format description: {0}")]
    DateFormat(#[from] time::error::InvalidFormatDescription),

    #[error("could not format date: {0}")]
    DateRender(#[from] time::error::Format),
}

/// Single-file operations that read a note, change its body and write it back.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    parser: NoteParser,
    writer: NoteWriter,
}

impl Journal {
    pub fn new(format: NoteFormat) -> Self {
        let writer = NoteWriter::new(&format);
        Self {
            parser: NoteParser::new(format),
            writer,
        }
    }

    pub fn parser(&self) -> &NoteParser {
        &self.parser
    }

    pub fn format(&self) -> &NoteFormat {
        self.parser.format()
    }

    pub fn load(&self, path: &Path) -> Result<NoteDocument, NoteError> {
        Ok(self.parser.parse_file(path, false)?)
    }

    pub fn save(&self, note: &NoteDocument) -> Result<(), NoteError> {
        Ok(self.writer.save(note)?)
    }

    /// Prepends a `<date>:` journal heading to the body of the note at `path`.
    pub fn add_timestamp(&self, path: &Path, date: Date) -> Result<NoteDocument, NoteError> {
        let stamp = self.format().format_journal_date(date)?;
        self.rewrite_body(path, |body| format!("{stamp}:\n\n\n{body}"))
    }

    pub fn add_task(&self, path: &Path, details: &str) -> Result<NoteDocument, NoteError> {
        self.rewrite_body(path, |body| self.insert_task(body, details))
    }

    /// Inserts `-[]: <details>` as the first line, or as the second one when
    /// the body opens with a dated line.
    pub fn insert_task(&self, body: &str, details: &str) -> String {
        let task = format!("-[]: {details}\n");
        let first_line = body.split('\n').next().unwrap_or_default();
        let prefix_end = first_line
            .char_indices()
            .nth(10)
            .map(|(index, _)| index)
            .unwrap_or(first_line.len());
        let dated = self
            .format()
            .parse_task_date(&first_line[..prefix_end])
            .is_some();
        if !dated {
            return format!("{task}{body}");
        }
        match body.find('\n') {
            Some(newline) => {
                let (head, tail) = body.split_at(newline + 1);
                format!("{head}{task}{tail}")
            }
            None => format!("{body}\n{task}"),
        }
    }

    /// Creates a new note with an empty tag list, titled after the file stem.
    pub fn create(&self, path: &Path) -> Result<(), NoteError> {
        if path.exists() {
            return Err(NoteError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => NoteError::AlreadyExists(path.to_path_buf()),
                _ => NoteError::Io(err),
            })?;
        write!(file, "title: {title}\ntags:\n{}\n", self.format().divider)?;
        tracing::info!(path = %path.display(), "created note");
        Ok(())
    }

    fn rewrite_body<F>(&self, path: &Path, edit: F) -> Result<NoteDocument, NoteError>
    where
        F: FnOnce(&str) -> String,
    {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut note = self.parser.parse(BufReader::new(&file), path, false)?;
        let body = edit(note.body());
        note.set_body(body);
        self.writer.write(&note, &mut file)?;
        Ok(note)
    }
}

/// Resolves a user supplied note name to `<dir>/<name>.<extension>`.
pub fn note_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let suffix = format!(".{extension}");
    if name.ends_with(&suffix) {
        dir.join(name)
    } else {
        dir.join(format!("{name}{suffix}"))
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use time::macros::date;

    fn write_note(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn timestamp_is_prepended_and_header_kept() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write_note(&dir, "diary.txt", "title: diary\nmood: ok\n------\n\nold entry\n");
        let journal = Journal::default();
        journal.add_timestamp(&path, date!(2024 - 03 - 09))?;
        assert_eq!(
            fs::read_to_string(&path)?,
            "title: diary\nmood: ok\n------\n\n2024-03-09:\n\n\nold entry\n"
        );
        Ok(())
    }

    #[test]
    fn task_goes_first_without_leading_date() {
        let journal = Journal::default();
        assert_eq!(journal.insert_task("plain\nbody", "call"), "-[]: call\nplain\nbody");
        assert_eq!(journal.insert_task("", "call"), "-[]: call\n");
        // the task date check uses slashes, hyphenated stamps do not count
        assert_eq!(
            journal.insert_task("2024-03-09:\nrest", "call"),
            "-[]: call\n2024-03-09:\nrest"
        );
    }

    #[test]
    fn task_follows_a_slash_dated_first_line() {
        let journal = Journal::default();
        assert_eq!(
            journal.insert_task("2024/03/09 monday\nrest", "call"),
            "2024/03/09 monday\n-[]: call\nrest"
        );
        assert_eq!(
            journal.insert_task("2024/03/09", "call"),
            "2024/03/09\n-[]: call\n"
        );
    }

    #[test]
    fn add_task_rewrites_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write_note(&dir, "todo.txt", "title: todo\n------\n\n2024/01/02\n-[x]: done\n");
        let note = Journal::default().add_task(&path, "new thing")?;
        assert_eq!(note.body(), "2024/01/02\n-[]: new thing\n-[x]: done\n");
        assert_eq!(
            fs::read_to_string(&path)?,
            "title: todo\n------\n\n2024/01/02\n-[]: new thing\n-[x]: done\n"
        );
        Ok(())
    }

    #[test]
    fn add_task_surfaces_parse_errors() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = write_note(&dir, "broken.txt", "------\nbody\n");
        assert_matches!(
            Journal::default().add_task(&path, "x"),
            Err(NoteError::Parse(ParseError::EmptyHeader))
        );
        assert_eq!(fs::read_to_string(&path)?, "------\nbody\n");
        Ok(())
    }

    #[test]
    fn create_writes_template_and_refuses_existing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("ideas.txt");
        let journal = Journal::default();
        journal.create(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "title: ideas\ntags:\n------\n");
        let note = journal.load(&path)?;
        assert_eq!(note.title(), "ideas");
        assert!(note.tags().is_empty());
        assert_matches!(journal.create(&path), Err(NoteError::AlreadyExists(_)));
        Ok(())
    }

    #[test]
    fn note_path_appends_extension_once() {
        let dir = Path::new("/notes");
        assert_eq!(note_path(dir, "a", NOTE_EXTENSION), PathBuf::from("/notes/a.txt"));
        assert_eq!(note_path(dir, "a.txt", NOTE_EXTENSION), PathBuf::from("/notes/a.txt"));
    }
}
