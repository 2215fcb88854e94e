//! Run and per-state log files.
//!
//! `logs/run.log` receives every line of the run. While a state is being
//! processed its lines also go to `logs/<state>.log` (the state's file stem,
//! lower-cased). Each line is forwarded to `tracing` as well, so console
//! verbosity follows the subscriber filter while the files keep everything.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use certdb_core::jurisdictions::file_stem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

pub struct RunLog {
    dir: PathBuf,
    run: File,
    state: Option<(String, File)>,
}

impl RunLog {
    /// Create `dir` if needed and truncate `run.log`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be created.
    pub fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let run = File::create(dir.join("run.log"))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            run,
            state: None,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the per-state log for `state`.
    #[must_use]
    pub fn state_log_path(&self, state: &str) -> PathBuf {
        self.dir.join(format!("{}.log", file_stem(state).to_lowercase()))
    }

    /// Start routing lines to the state's own log file (truncated).
    pub fn begin_state(&mut self, state: &str) {
        let path = self.state_log_path(state);
        match File::create(&path) {
            Ok(file) => self.state = Some((state.to_string(), file)),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "cannot open state log");
                self.state = None;
            }
        }
    }

    pub fn end_state(&mut self) {
        self.state = None;
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Info, message.as_ref());
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.write(LogLevel::Error, message.as_ref());
    }

    fn write(&mut self, level: LogLevel, message: &str) {
        let state = self.state.as_ref().map(|(name, _)| name.as_str());
        match level {
            LogLevel::Info => tracing::info!(state, "{message}"),
            LogLevel::Warn => tracing::warn!(state, "{message}"),
            LogLevel::Error => tracing::error!(state, "{message}"),
        }

        let line = format!(
            "{} - {} - {message}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            level.label()
        );
        if let Err(error) = self.run.write_all(line.as_bytes()) {
            tracing::warn!(%error, "run log write failed");
        }
        if let Some((_, file)) = self.state.as_mut() {
            if let Err(error) = file.write_all(line.as_bytes()) {
                tracing::warn!(%error, "state log write failed");
            }
        }
    }
}
