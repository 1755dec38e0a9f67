use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description;
use time::Date;

pub mod ops;
pub mod segment;

pub use ops::{note_path, today, Journal, NoteError, NOTE_EXTENSION};
pub use segment::{desegmentize, segmentize, Segment, SegmentKind};

pub const DEFAULT_DIVIDER: &str = "------";
pub const DEFAULT_JOURNAL_DATE_FORMAT: &str = "[year]-[month]-[day]";
pub const DEFAULT_TASK_DATE_FORMAT: &str = "[year]/[month]/[day]";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("empty header")]
    EmptyHeader,

    #[error("could not parse header line: {0}")]
    InvalidHeaderLine(String),

    #[error("reached end of note without a divider line")]
    MissingDivider,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Layout constants shared by the parser, the writer and the journal helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFormat {
    pub divider: String,
    /// `time` format description used for journal timestamps.
    pub journal_date_format: String,
    /// `time` format description recognised at the top of a body when inserting tasks.
    pub task_date_format: String,
}

impl Default for NoteFormat {
    fn default() -> Self {
        Self {
            divider: DEFAULT_DIVIDER.to_string(),
            journal_date_format: DEFAULT_JOURNAL_DATE_FORMAT.to_string(),
            task_date_format: DEFAULT_TASK_DATE_FORMAT.to_string(),
        }
    }
}

impl NoteFormat {
    pub fn format_journal_date(&self, date: Date) -> Result<String, NoteError> {
        let description = format_description::parse_owned::<2>(&self.journal_date_format)?;
        Ok(date.format(&description)?)
    }

    pub fn parse_task_date(&self, input: &str) -> Option<Date> {
        let description = format_description::parse_owned::<2>(&self.task_date_format).ok()?;
        Date::parse(input, &description).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDocument {
    path: PathBuf,
    title: String,
    tags: Vec<String>,
    body: String,
    // header may hold fields this struct does not model
    raw_header: String,
}

impl NoteDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    pub fn description(&self) -> String {
        self.tags.join(", ")
    }

    pub fn has_tag_containing(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteParser {
    format: NoteFormat,
}

impl NoteParser {
    pub fn new(format: NoteFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &NoteFormat {
        &self.format
    }

    pub fn parse_file(&self, path: &Path, header_only: bool) -> Result<NoteDocument, ParseError> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), path, header_only)
    }

    /// Reads a header up to the divider and, unless `header_only` is set,
    /// everything after it as the body.
    ///
    /// With `header_only` the reader is left positioned right after the
    /// divider line.
    pub fn parse<R: BufRead>(
        &self,
        mut reader: R,
        identity: impl Into<PathBuf>,
        header_only: bool,
    ) -> Result<NoteDocument, ParseError> {
        let path = identity.into();
        let mut raw_header = String::new();
        let mut header_lines = 0usize;
        let mut title = String::new();
        let mut tags = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(ParseError::MissingDivider);
            }
            let content = strip_line_ending(&line);
            if content.trim() == self.format.divider {
                if header_lines == 0 {
                    return Err(ParseError::EmptyHeader);
                }
                break;
            }
            raw_header.push_str(&line);
            if content.trim().is_empty() {
                continue;
            }
            let Some((field, value)) = content.split_once(':') else {
                return Err(ParseError::InvalidHeaderLine(content.to_string()));
            };
            header_lines += 1;
            match field.trim().to_lowercase().as_str() {
                "title" => title = value.trim().to_string(),
                "tags" => {
                    let parsed = parse_tags(value);
                    if !parsed.is_empty() {
                        tags = parsed;
                    }
                }
                _ => {}
            }
        }

        let mut body = String::new();
        if !header_only {
            reader.read_to_string(&mut body)?;
            // one blank separator line is dropped; the writer always emits it
            let separator = if body.starts_with("\r\n") {
                2
            } else if body.starts_with('\n') {
                1
            } else {
                0
            };
            body.drain(..separator);
        }

        if title.trim().is_empty() {
            title = path.display().to_string();
        }
        tracing::debug!(path = %path.display(), header_only, "parsed note");

        Ok(NoteDocument {
            path,
            title,
            tags,
            body,
            raw_header,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NoteWriter {
    divider: String,
}

impl Default for NoteWriter {
    fn default() -> Self {
        Self::new(&NoteFormat::default())
    }
}

impl NoteWriter {
    pub fn new(format: &NoteFormat) -> Self {
        Self {
            divider: format.divider.clone(),
        }
    }

    pub fn render(&self, document: &NoteDocument) -> String {
        let mut out = String::with_capacity(
            document.raw_header.len() + self.divider.len() + 2 + document.body.len(),
        );
        out.push_str(&document.raw_header);
        out.push_str(&self.divider);
        out.push_str("\n\n");
        out.push_str(&document.body);
        out
    }

    /// Truncates `file` and rewrites the whole note from the start.
    pub fn write(&self, document: &NoteDocument, file: &mut File) -> io::Result<()> {
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        self.write_to(document, file)
    }

    pub fn write_to<W: Write>(&self, document: &NoteDocument, out: &mut W) -> io::Result<()> {
        let rendered = self.render(document);
        write_fully(out, rendered.as_bytes())?;
        out.flush()
    }

    pub fn save(&self, document: &NoteDocument) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&document.path)?;
        self.write(document, &mut file)?;
        tracing::debug!(path = %document.path.display(), "saved note");
        Ok(())
    }
}

fn write_fully<W: Write>(out: &mut W, mut remaining: &[u8]) -> io::Result<()> {
    while !remaining.is_empty() {
        match out.write(remaining) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "problem writing to file: no bytes accepted",
                ))
            }
            Ok(written) => {
                if written < remaining.len() {
                    tracing::trace!(written, left = remaining.len() - written, "short write");
                }
                remaining = &remaining[written..];
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn parse_tags(value: &str) -> Vec<String> {
    let mut seen: IndexMap<String, String> = IndexMap::new();
    for tag in value.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        seen.entry(tag.to_lowercase())
            .or_insert_with(|| tag.to_string());
    }
    seen.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::{Cursor, Read};

    const DIARY: &str = "title: my_test_diary\ntags:secret,plzdontlook,test\n------\n\n2022-04-23:\n\nDear Diary,\n\nToday I started adding unit tests.\n";

    fn parse(input: &str, header_only: bool) -> Result<NoteDocument, ParseError> {
        NoteParser::default().parse(Cursor::new(input), "notes/diary.txt", header_only)
    }

    #[test]
    fn parses_header_fields_and_body() {
        let note = parse(DIARY, false).expect("parse");
        assert_eq!(note.title(), "my_test_diary");
        assert_eq!(note.tags(), ["secret", "plzdontlook", "test"]);
        assert_eq!(
            note.body(),
            "2022-04-23:\n\nDear Diary,\n\nToday I started adding unit tests.\n"
        );
        assert_eq!(
            note.raw_header(),
            "title: my_test_diary\ntags:secret,plzdontlook,test\n"
        );
    }

    #[test]
    fn tags_are_deduplicated_case_insensitively() {
        let note = parse(
            "title: t\ntags: secret, Secret, PLZDONTLOOK, plzdontlook,test\n------\n",
            true,
        )
        .expect("parse");
        assert_eq!(note.tags(), ["secret", "PLZDONTLOOK", "test"]);
    }

    #[test]
    fn empty_title_falls_back_to_path() {
        let note = parse("title:\ntags: a\n------\nbody", false).expect("parse");
        assert_eq!(note.title(), "notes/diary.txt");
    }

    #[test]
    fn divider_without_header_is_rejected() {
        assert_matches!(parse("------\nbody\n", false), Err(ParseError::EmptyHeader));
        assert_matches!(
            parse("\n   \n------\nbody\n", false),
            Err(ParseError::EmptyHeader)
        );
    }

    #[test]
    fn header_line_without_colon_is_rejected() {
        assert_matches!(
            parse("title: ok\njust words\n------\n", false),
            Err(ParseError::InvalidHeaderLine(line)) if line == "just words"
        );
    }

    #[test]
    fn missing_divider_is_reported() {
        assert_matches!(parse("title: a\n", false), Err(ParseError::MissingDivider));
    }

    #[test]
    fn header_only_leaves_body_unread() {
        let mut reader = Cursor::new(DIARY.as_bytes());
        let note = NoteParser::default()
            .parse(&mut reader, "diary.txt", true)
            .expect("parse");
        assert!(note.body().is_empty());
        let mut rest = String::new();
        reader.read_to_string(&mut rest).expect("read rest");
        assert!(rest.starts_with("\n2022-04-23:"));
    }

    // Header bytes round-trip exactly. The body side is exact only when the
    // file has the single blank separator line the writer emits; without it
    // a save inserts one.
    #[test]
    fn missing_separator_line_is_added_on_save() {
        let note = parse("title: t\n------\nbody\n", false).expect("parse");
        assert_eq!(note.body(), "body\n");
        assert_eq!(
            NoteWriter::default().render(&note),
            "title: t\n------\n\nbody\n"
        );

        let fresh = parse("title: t\n------\n", false).expect("parse");
        assert_eq!(fresh.body(), "");
        assert_eq!(NoteWriter::default().render(&fresh), "title: t\n------\n\n");
    }

    #[test]
    fn unknown_fields_and_colons_in_values_survive_round_trip() {
        let input = "title: mic: drop\ntags: DROPTHEMIC\nmic:        @@@@@@\n\ndrop:       @@...,,,*@\n  ------  \n\nbody line\n";
        let note = parse(input, false).expect("parse");
        assert_eq!(note.title(), "mic: drop");
        let mut out = Vec::new();
        NoteWriter::default()
            .write_to(&note, &mut out)
            .expect("write");
        let written = String::from_utf8(out).expect("utf8");
        assert_eq!(written, input.replace("  ------  ", "------"));
    }

    #[test]
    fn writer_output_reparses_identically() {
        let note = parse(DIARY, false).expect("parse");
        let rendered = NoteWriter::default().render(&note);
        assert_eq!(rendered, DIARY);
        let reparsed = parse(&rendered, false).expect("reparse");
        assert_eq!(reparsed, note);
    }

    struct TrickleWriter {
        inner: Vec<u8>,
        calls: usize,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 3 == 0 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let take = buf.len().min(4);
            self.inner.extend_from_slice(&buf[..take]);
            Ok(take)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_writes_are_retried_until_complete() {
        let note = parse(DIARY, false).expect("parse");
        let mut writer = TrickleWriter {
            inner: Vec::new(),
            calls: 0,
        };
        NoteWriter::default()
            .write_to(&note, &mut writer)
            .expect("write");
        assert_eq!(String::from_utf8(writer.inner).expect("utf8"), DIARY);
    }

    #[test]
    fn custom_divider_is_honoured() {
        let format = NoteFormat {
            divider: "===".to_string(),
            ..NoteFormat::default()
        };
        let note = NoteParser::new(format.clone())
            .parse(Cursor::new("title: x\n===\n\nhello"), "x.txt", false)
            .expect("parse");
        assert_eq!(note.body(), "hello");
        assert_eq!(NoteWriter::new(&format).render(&note), "title: x\n===\n\nhello");
    }

    #[test]
    fn save_truncates_longer_previous_contents() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "title: t\n------\n\na much longer body than what follows\n")?;
        let parser = NoteParser::default();
        let mut note = parser.parse_file(&path, false)?;
        note.set_body("short");
        NoteWriter::default().save(&note)?;
        assert_eq!(std::fs::read_to_string(&path)?, "title: t\n------\n\nshort");
        Ok(())
    }
}
