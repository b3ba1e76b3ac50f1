//! CLI configuration file.
//!
//! The file is JSON: `{ "traverse": { "cycle_limit": 500, ... } }`. Every
//! field is optional. Without `--config`, `scopewalk.json` in the working
//! directory is used when present.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use scopewalk_traverse::TraverseOptions;

use crate::error::CliError;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "scopewalk.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub traverse: TraverseOptions,
}

impl Config {
    /// Load `explicit`, or the default file under `dir` if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file means defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Config, CliError> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };
        let text = fs::read_to_string(&path).map_err(|e| CliError::FileNotFound {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| {
            CliError::invalid_args(format!("bad config {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopewalk_traverse::CyclePolicy;

    #[test]
    fn missing_default_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn default_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{ "traverse": { "cycle_limit": 12, "cycle_policy": "warn" } }"#,
        )
        .unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.traverse.cycle_limit, 12);
        assert_eq!(config.traverse.cycle_policy, CyclePolicy::Warn);
        assert!(config.traverse.track_bindings);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "travers": {} }"#).unwrap();
        let err = Config::load(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, CliError::InvalidArguments { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.json")), dir.path()).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound { .. }));
    }
}
