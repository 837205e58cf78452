//! Board configuration.
//!
//! Defaults suit a single process owning a `data` directory next to the
//! working directory. [`BoardConfig::from_env`] overlays the `TASKBOARD_*`
//! environment variables on those defaults.

use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fmt;
use thiserror::Error;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "TASKBOARD_DATA_DIR";

/// Environment variable setting how many backups are kept per collection.
pub const BACKUP_RETENTION_ENV: &str = "TASKBOARD_BACKUP_RETENTION";

/// Environment variable selecting the [`MissingDependencyPolicy`].
pub const MISSING_DEPENDENCIES_ENV: &str = "TASKBOARD_MISSING_DEPENDENCIES";

/// Backups kept per collection unless configured otherwise.
pub const DEFAULT_BACKUP_RETENTION: usize = 50;

const DEFAULT_DATA_DIR: &str = "data";
const BACKUP_DIR_NAME: &str = "backups";
const LEDGER_FILE_NAME: &str = "audit.jsonl";

/// How the dependency gate treats a dependency that no longer exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MissingDependencyPolicy {
    /// A missing dependency blocks the move like an unfinished one.
    #[default]
    Block,
    /// A missing dependency is skipped.
    Ignore,
}

impl MissingDependencyPolicy {
    /// Returns the configuration name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for MissingDependencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MissingDependencyPolicy {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "ignore" => Ok(Self::Ignore),
            _ => Err(ConfigError::InvalidValue {
                variable: MISSING_DEPENDENCIES_ENV,
                value: value.to_owned(),
                expected: "`block` or `ignore`",
            }),
        }
    }
}

/// Settings shared by the store, ledger, and lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    data_dir: Utf8PathBuf,
    backup_retention: usize,
    missing_dependency_policy: MissingDependencyPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from(DEFAULT_DATA_DIR),
            backup_retention: DEFAULT_BACKUP_RETENTION,
            missing_dependency_policy: MissingDependencyPolicy::default(),
        }
    }
}

impl BoardConfig {
    /// Reads configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to a value that is not
    /// valid UTF-8 or cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(data_dir) = read_var(DATA_DIR_ENV)? {
            config.data_dir = Utf8PathBuf::from(data_dir);
        }
        if let Some(retention) = read_var(BACKUP_RETENTION_ENV)? {
            config.backup_retention = parse_retention(&retention)?;
        }
        if let Some(policy) = read_var(MISSING_DEPENDENCIES_ENV)? {
            config.missing_dependency_policy = MissingDependencyPolicy::try_from(policy.as_str())?;
        }
        Ok(config)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<Utf8PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets how many backups are kept per collection.
    #[must_use]
    pub const fn with_backup_retention(mut self, backup_retention: usize) -> Self {
        self.backup_retention = backup_retention;
        self
    }

    /// Sets the missing dependency policy.
    #[must_use]
    pub const fn with_missing_dependency_policy(
        mut self,
        policy: MissingDependencyPolicy,
    ) -> Self {
        self.missing_dependency_policy = policy;
        self
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Returns how many backups are kept per collection.
    #[must_use]
    pub const fn backup_retention(&self) -> usize {
        self.backup_retention
    }

    /// Returns the missing dependency policy.
    #[must_use]
    pub const fn missing_dependency_policy(&self) -> MissingDependencyPolicy {
        self.missing_dependency_policy
    }

    /// Returns the directory holding collection backups.
    #[must_use]
    pub fn backup_dir(&self) -> Utf8PathBuf {
        self.data_dir.join(BACKUP_DIR_NAME)
    }

    /// Returns the audit ledger path.
    #[must_use]
    pub fn ledger_path(&self) -> Utf8PathBuf {
        self.data_dir.join(LEDGER_FILE_NAME)
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The variable is set but not valid UTF-8.
    #[error("{variable} is not valid UTF-8")]
    NotUnicode {
        /// Offending variable.
        variable: &'static str,
    },

    /// The variable holds a value that cannot be used.
    #[error("{variable} has invalid value `{value}`: expected {expected}")]
    InvalidValue {
        /// Offending variable.
        variable: &'static str,
        /// Value found in the environment.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}

fn read_var(variable: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(variable) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { variable }),
    }
}

fn parse_retention(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|retention| *retention > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            variable: BACKUP_RETENTION_ENV,
            value: value.to_owned(),
            expected: "a positive integer",
        })
}
