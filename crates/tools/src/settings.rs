//! Best-effort loading of the local settings file.
//!
//! The settings file (`config.env` by default) is a dotenv-format list of
//! `KEY=value` pairs. Unlike a classic dotenv loader, nothing is written back
//! into the process environment: the values are collected into a [`Settings`]
//! value that is handed to whoever needs them.
//!
//! Lookup order:
//!
//! 1. Process environment
//! 2. Settings file
//!
//! A missing or unreadable file is never an error. Misconfiguration surfaces
//! later, when a required variable is consumed.

use std::collections::HashMap;
use std::path::Path;

/// Default settings file, relative to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "config.env";

/// Variables available to the configuration layer
#[derive(Debug, Clone, Default)]
pub struct Settings {
    vars: HashMap<String, String>,
}

impl Settings {
    /// Load the settings file at `path` and overlay the process environment.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::from_sources(read_file(path.as_ref()), std::env::vars())
    }

    /// Build settings from in-memory sources. Entries from `process` take
    /// precedence over entries from `file`.
    pub fn from_sources<F, P>(file: F, process: P) -> Self
    where
        F: IntoIterator<Item = (String, String)>,
        P: IntoIterator<Item = (String, String)>,
    {
        let mut vars: HashMap<String, String> = file.into_iter().collect();
        vars.extend(process);
        Settings { vars }
    }

    /// Look up a variable. Empty values are treated as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

fn read_file(path: &Path) -> Vec<(String, String)> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            tracing::debug!(path = %path.display(), "settings file not found, using process environment only");
            return Vec::new();
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to open settings file");
            return Vec::new();
        }
    };

    match iter.collect::<Result<Vec<_>, _>>() {
        Ok(vars) => {
            tracing::debug!(path = %path.display(), count = vars.len(), "loaded settings file");
            vars
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring malformed settings file");
            Vec::new()
        }
    }
}
