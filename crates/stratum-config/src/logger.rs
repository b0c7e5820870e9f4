//! File logger for configuration diagnostics.

use crate::environment::EnvironmentConfig;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment key naming the log directory.
pub const LOG_DIR_PARAM: &str = "log_directory";

/// How [`Logger::log`] opens its target file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Append,
    Truncate,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Unable to create log directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write log file {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Appends messages to files inside a log directory.
///
/// The directory is chosen once: an explicit override, else the
/// `log_directory` environment value, else `var/log` under the current
/// directory. It is created if missing.
#[derive(Debug, Clone)]
pub struct Logger {
    log_directory: PathBuf,
}

impl Logger {
    pub fn new(
        override_directory: Option<&Path>,
        environment: &dyn EnvironmentConfig,
    ) -> Result<Self, LogError> {
        let log_directory = match override_directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => match environment.environment_value(LOG_DIR_PARAM) {
                Some(dir) => PathBuf::from(dir),
                None => fallback_directory(),
            },
        };

        ensure_directory(&log_directory)?;
        Ok(Self { log_directory })
    }

    /// Write `message` verbatim to `filename`, returning the bytes written.
    ///
    /// Relative names resolve inside the log directory.
    pub fn log(&self, message: &str, filename: &str, mode: WriteMode) -> Result<usize, LogError> {
        let path = self.log_directory.join(filename);
        let write_error = |source| LogError::Write {
            file: path.display().to_string(),
            source,
        };

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.write(true).truncate(true),
        };

        let mut file = options.open(&path).map_err(write_error)?;
        file.write_all(message.as_bytes()).map_err(write_error)?;
        Ok(message.len())
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn set_log_directory(&mut self, directory: impl Into<PathBuf>) -> Result<(), LogError> {
        let directory = directory.into();
        ensure_directory(&directory)?;
        self.log_directory = directory;
        Ok(())
    }
}

fn fallback_directory() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join("var")
        .join("log")
}

fn ensure_directory(dir: &Path) -> Result<(), LogError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| LogError::Directory {
        path: dir.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MapEnvironment;

    #[test]
    fn test_override_wins_over_environment() {
        let base = tempfile::tempdir().unwrap();
        let explicit = base.path().join("explicit");
        let from_env = base.path().join("env");
        let env = MapEnvironment::new().with_value(LOG_DIR_PARAM, from_env.display().to_string());

        let logger = Logger::new(Some(explicit.as_path()), &env).unwrap();
        assert_eq!(logger.log_directory(), explicit.as_path());
        assert!(explicit.is_dir());
        assert!(!from_env.exists());
    }

    #[test]
    fn test_environment_directory() {
        let base = tempfile::tempdir().unwrap();
        let from_env = base.path().join("nested/log");
        let env = MapEnvironment::new().with_value(LOG_DIR_PARAM, from_env.display().to_string());

        let logger = Logger::new(None, &env).unwrap();
        assert_eq!(logger.log_directory(), from_env.as_path());
        assert!(from_env.is_dir());
    }

    #[test]
    fn test_append_and_truncate() {
        let base = tempfile::tempdir().unwrap();
        let logger = Logger::new(Some(base.path()), &MapEnvironment::new()).unwrap();

        assert_eq!(logger.log("first\n", "config.log", WriteMode::Append).unwrap(), 6);
        logger.log("second\n", "config.log", WriteMode::Append).unwrap();
        let path = base.path().join("config.log");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        logger.log("third\n", "config.log", WriteMode::Truncate).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "third\n");
    }

    #[test]
    fn test_absolute_file_name() {
        let base = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let logger = Logger::new(Some(base.path()), &MapEnvironment::new()).unwrap();

        let target = other.path().join("elsewhere.log");
        logger
            .log("x", &target.display().to_string(), WriteMode::default())
            .unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "x");
    }

    #[test]
    fn test_directory_error() {
        let base = tempfile::tempdir().unwrap();
        let blocker = base.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let err = Logger::new(Some(blocker.join("log").as_path()), &MapEnvironment::new()).unwrap_err();
        assert!(matches!(err, LogError::Directory { .. }));

        let mut logger = Logger::new(Some(base.path()), &MapEnvironment::new()).unwrap();
        assert!(logger.set_log_directory(blocker.join("log")).is_err());
        assert_eq!(logger.log_directory(), base.path());
    }

    #[test]
    fn test_write_error() {
        let base = tempfile::tempdir().unwrap();
        std::fs::create_dir(base.path().join("taken")).unwrap();
        let logger = Logger::new(Some(base.path()), &MapEnvironment::new()).unwrap();

        let err = logger.log("x", "taken", WriteMode::Append).unwrap_err();
        assert!(matches!(err, LogError::Write { .. }));
    }
}
