//! Layered configuration loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::Config;

/// Default location of the hot-reloadable env file.
pub const DEFAULT_ENV_PATH: &str = "/app/.env";

/// Source of environment overrides.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    /// The live process environment, re-read on every load.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl Environment {
    /// Returns a snapshot of the variables.
    #[must_use]
    pub fn vars(&self) -> HashMap<String, String> {
        match self {
            Self::Process => std::env::vars().collect(),
            Self::Fixed(vars) => vars.clone(),
        }
    }

    /// Looks up a single variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(vars) => vars.get(key).cloned(),
        }
    }
}

/// Merges the env file (defaults) with the environment (overrides).
///
/// Nothing is cached: every [`load`](Self::load) re-reads both layers, so
/// edits to the file become visible on the next call.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
    environment: Environment,
}

impl ConfigSource {
    /// Creates a source reading the given env file and the process environment.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            environment: Environment::Process,
        }
    }

    /// Replaces the environment layer.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Returns the env file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads a fresh configuration snapshot.
    ///
    /// Never fails: a missing or malformed file contributes no overrides and
    /// malformed values fall back to their defaults.
    #[must_use]
    pub fn load(&self) -> Config {
        let mut merged = read_env_file(&self.path);
        merged.extend(self.environment.vars());
        Config::from_vars(&merged)
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PATH)
    }
}

/// Reads `KEY=value` pairs from an env file without touching the process
/// environment.
///
/// Returns an empty map when the file is absent or any line fails to parse.
#[must_use]
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "env file not found");
            return HashMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open env file");
            return HashMap::new();
        }
    };

    match iter.collect::<Result<HashMap<_, _>, _>>() {
        Ok(vars) => vars,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed env file ignored");
            HashMap::new()
        }
    }
}
