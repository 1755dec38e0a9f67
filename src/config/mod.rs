use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use time::format_description;

use crate::note::{NoteFormat, NOTE_EXTENSION};
use crate::scan::DEFAULT_WORKERS;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "PlainNotes";
const APP_NAME: &str = "notes";

pub const CONFIG_ENV: &str = "NOTES_CONFIG";
pub const NOTES_DIR_ENV: &str = "NOTES_DIR";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    /// Notes directory forced through the environment, ahead of the config file.
    pub notes_dir: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let notes_dir = env::var_os(NOTES_DIR_ENV).map(PathBuf::from);

        let config_dir = match &override_config {
            Some(p) if p.is_dir() => p.clone(),
            Some(p) => p
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| p.clone()),
            None => ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
                .context("resolving XDG project directories")?
                .config_dir()
                .to_path_buf(),
        };

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self {
            config_dir,
            config_file,
            notes_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!("creating config directory {}", self.config_dir.display())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where note names are resolved and scanned. Unset means the working directory.
    pub notes_dir: Option<PathBuf>,
    pub extension: String,
    pub format: NoteFormat,
    pub scanner: ScannerOptions,
    pub tasks: TaskMarkers,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notes_dir: None,
            extension: NOTE_EXTENSION.to_string(),
            format: NoteFormat::default(),
            scanner: ScannerOptions::default(),
            tasks: TaskMarkers::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        if let Some(dir) = &paths.notes_dir {
            self.notes_dir = Some(dir.clone());
        }
        let defaults = AppConfig::default();

        let extension = self.extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            tracing::warn!("empty note extension in config, using {}", defaults.extension);
            self.extension = defaults.extension.clone();
        } else {
            self.extension = extension.to_string();
        }

        if self.format.divider.trim().is_empty() {
            tracing::warn!("empty divider in config, using {}", defaults.format.divider);
            self.format.divider = defaults.format.divider.clone();
        } else {
            self.format.divider = self.format.divider.trim().to_string();
        }
        if format_description::parse_owned::<2>(&self.format.journal_date_format).is_err() {
            tracing::warn!(
                format = %self.format.journal_date_format,
                "invalid journal date format in config, using default"
            );
            self.format.journal_date_format = defaults.format.journal_date_format.clone();
        }
        if format_description::parse_owned::<2>(&self.format.task_date_format).is_err() {
            tracing::warn!(
                format = %self.format.task_date_format,
                "invalid task date format in config, using default"
            );
            self.format.task_date_format = defaults.format.task_date_format;
        }

        if self.scanner.workers == 0 {
            tracing::warn!("scanner.workers must be at least 1, using {DEFAULT_WORKERS}");
            self.scanner.workers = DEFAULT_WORKERS;
        }

        if ['[', ']', '\n'].iter().any(|c| self.tasks.contains(*c)) {
            tracing::warn!(?self.tasks, "task markers cannot be brackets or newlines, using defaults");
            self.tasks = TaskMarkers::default();
        }
    }

    /// Directory note names resolve against: configured, else the working directory.
    pub fn resolve_notes_dir(&self) -> Result<PathBuf> {
        match &self.notes_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::current_dir().context("resolving working directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerOptions {
    pub workers: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Characters written between the brackets of a task line by the task board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskMarkers {
    pub clear: char,
    pub in_progress: char,
    pub complete: char,
}

impl Default for TaskMarkers {
    fn default() -> Self {
        Self {
            clear: ' ',
            in_progress: '-',
            complete: 'x',
        }
    }
}

impl TaskMarkers {
    fn contains(&self, c: char) -> bool {
        [self.clear, self.in_progress, self.complete].contains(&c)
    }
}
