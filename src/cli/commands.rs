use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::{run_screen, NoteSelector, TaskBoard};
use crate::config::{AppConfig, TaskMarkers};
use crate::note::{note_path, today, Journal, NoteDocument, NoteParser};
use crate::scan::{filter_by_tag, list_note_files, Scanner};

#[derive(Args, Debug, Clone)]
pub struct NoteArgs {
    /// Note name, resolved to `<notes dir>/<name>.<extension>`
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct TaggedArgs {
    /// Case-insensitive substring matched against every tag
    pub tag: String,
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    /// Note to add the task to
    pub name: String,
    /// Task text (prompted if omitted)
    pub details: Vec<String>,
}

/// Everything a subcommand needs, built once from the loaded config.
pub struct Workspace {
    notes_dir: PathBuf,
    extension: String,
    journal: Journal,
    scanner: Scanner,
    markers: TaskMarkers,
}

impl Workspace {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let notes_dir = config.resolve_notes_dir()?;
        Ok(Self::at(notes_dir, config))
    }

    pub fn at(notes_dir: PathBuf, config: &AppConfig) -> Self {
        let parser = NoteParser::new(config.format.clone());
        Self {
            notes_dir,
            extension: config.extension.clone(),
            journal: Journal::new(config.format.clone()),
            scanner: Scanner::new(parser, config.scanner.workers),
            markers: config.tasks,
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            bail!("note name cannot be empty");
        }
        Ok(note_path(&self.notes_dir, name, &self.extension))
    }

    /// Path of a note that must already exist.
    pub fn existing(&self, name: &str) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            bail!("note `{}` does not exist", path.display());
        }
        Ok(path)
    }

    fn scan(&self) -> Vec<NoteDocument> {
        let paths = list_note_files(&self.notes_dir, &self.extension);
        tracing::debug!(dir = %self.notes_dir.display(), files = paths.len(), "scanning notes");
        self.scanner.collect(&paths, true)
    }
}

pub fn new_note(workspace: &Workspace, args: NoteArgs) -> Result<()> {
    let path = create_note(workspace, &args.name)?;
    println!("Created {}", path.display());
    Ok(())
}

pub(crate) fn create_note(workspace: &Workspace, name: &str) -> Result<PathBuf> {
    let path = workspace.path_for(name)?;
    workspace
        .journal
        .create(&path)
        .with_context(|| format!("creating note {}", path.display()))?;
    Ok(path)
}

pub fn check_note(workspace: &Workspace, args: NoteArgs) -> Result<()> {
    print!("{}", check_output(workspace, &args.name)?);
    Ok(())
}

pub(crate) fn check_output(workspace: &Workspace, name: &str) -> Result<String> {
    let path = workspace.existing(name)?;
    let note = workspace
        .journal
        .load(&path)
        .with_context(|| format!("could not parse {}", path.display()))?;
    Ok(format!(
        "loaded file:\n「{}」\n{:?}\n{}\n",
        note.title(),
        note.tags(),
        note.body()
    ))
}

pub fn cat_note(workspace: &Workspace, args: NoteArgs) -> Result<()> {
    let path = workspace.existing(&args.name)?;
    let note = workspace
        .journal
        .load(&path)
        .with_context(|| format!("could not parse {}", path.display()))?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(note.body().as_bytes())
        .context("writing note body")?;
    stdout.flush().context("flushing stdout")
}

pub fn tagged_notes(workspace: &Workspace, args: TaggedArgs) -> Result<()> {
    print!("{}", tagged_output(workspace, &args.tag));
    Ok(())
}

pub(crate) fn tagged_output(workspace: &Workspace, tag: &str) -> String {
    let mut notes = filter_by_tag(workspace.scan(), tag);
    notes.sort_by(|a, b| a.title().cmp(b.title()).then_with(|| a.path().cmp(b.path())));
    let mut output = String::new();
    for note in notes {
        let _ = writeln!(output, "{} : {}", note.title(), note.path().display());
    }
    output
}

pub fn add_entry(workspace: &Workspace, args: NoteArgs) -> Result<()> {
    let path = workspace.existing(&args.name)?;
    workspace
        .journal
        .add_timestamp(&path, today())
        .with_context(|| format!("could not add timestamp to {}", path.display()))?;
    Ok(())
}

pub fn add_task(workspace: &Workspace, args: TaskArgs) -> Result<()> {
    let path = workspace.existing(&args.name)?;
    let mut details = args.details.join(" ").trim().to_string();
    if details.is_empty() {
        details = prompt("New task")?;
    }
    if details.trim().is_empty() {
        bail!("task cannot be empty");
    }
    workspace
        .journal
        .add_task(&path, details.trim())
        .with_context(|| format!("could not add task to {}", path.display()))?;
    Ok(())
}

pub fn task_board(workspace: &Workspace, args: NoteArgs) -> Result<()> {
    let path = workspace.existing(&args.name)?;
    let mut board = TaskBoard::open(workspace.journal.clone(), &path, workspace.markers)?;
    run_screen(&mut board)
}

pub fn select_note(workspace: &Workspace) -> Result<()> {
    let notes = workspace.scan();
    let mut selector = NoteSelector::new("Notes", notes);
    run_screen(&mut selector)?;
    if let Some(choice) = selector.into_choice() {
        println!("{}", choice.display());
    }
    Ok(())
}

pub fn version() -> Result<()> {
    println!("notes version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}
