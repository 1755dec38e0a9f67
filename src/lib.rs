pub mod app;
pub mod cli;
pub mod config;
pub mod note;
pub mod scan;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use note::{
    desegmentize, segmentize, Journal, NoteDocument, NoteError, NoteFormat, NoteParser,
    NoteWriter, ParseError, Segment, SegmentKind,
};
pub use scan::Scanner;
