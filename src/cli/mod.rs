use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, NOTES_DIR_ENV};

pub mod commands;

use self::commands::{NoteArgs, TaggedArgs, TaskArgs, Workspace};

#[derive(Parser, Debug)]
#[command(name = "notes", version, about = "Plain-text notes, journal entries and tasks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over NOTES_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the notes (takes precedence over NOTES_DIR)
    #[arg(long, global = true)]
    pub notes_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new note
    #[command(visible_alias = "n")]
    New(NoteArgs),
    /// Parse a note and print its title, tags and body
    Check(NoteArgs),
    /// Print the body of a note without its header
    Cat(NoteArgs),
    /// List notes with a tag containing the given text
    Tagged(TaggedArgs),
    /// Add today's timestamp to the top of a note
    #[command(visible_alias = "e")]
    Entry(NoteArgs),
    /// Add a task to a note
    #[command(visible_alias = "t")]
    Task(TaskArgs),
    /// Interactively mark the tasks of a note
    Tasks(NoteArgs),
    /// Pick a note interactively and print its path
    Select,
    /// Print the current version
    Version,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.notes_dir {
        env::set_var(NOTES_DIR_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    if let Commands::Version = cli.command {
        return commands::version();
    }

    let loader = ConfigLoader::discover()?;
    let config = loader.load_or_init()?;
    let workspace = Workspace::new(&config)?;
    tracing::debug!(notes_dir = %workspace.notes_dir().display(), "workspace ready");

    match cli.command {
        Commands::New(args) => commands::new_note(&workspace, args),
        Commands::Check(args) => commands::check_note(&workspace, args),
        Commands::Cat(args) => commands::cat_note(&workspace, args),
        Commands::Tagged(args) => commands::tagged_notes(&workspace, args),
        Commands::Entry(args) => commands::add_entry(&workspace, args),
        Commands::Task(args) => commands::add_task(&workspace, args),
        Commands::Tasks(args) => commands::task_board(&workspace, args),
        Commands::Select => commands::select_note(&workspace),
        Commands::Version => commands::version(),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow::anyhow!("{err}"))
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_details_and_global_flags() {
        let cli = Cli::try_parse_from([
            "notes",
            "--notes-dir",
            "/tmp/n",
            "task",
            "todo",
            "buy",
            "milk",
        ])
        .expect("parse");
        assert_eq!(cli.notes_dir, Some(PathBuf::from("/tmp/n")));
        match cli.command {
            Commands::Task(args) => {
                assert_eq!(args.name, "todo");
                assert_eq!(args.details, ["buy", "milk"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn aliases_resolve() {
        let cli = Cli::try_parse_from(["notes", "e", "diary"]).expect("parse");
        assert!(matches!(cli.command, Commands::Entry(NoteArgs { ref name }) if name == "diary"));
    }
}
