//! Configuration Store
//!
//! Section-scoped key/value store persisted as YAML:
//!
//! ```yaml
//! Controls:
//!   pad_a: "4"
//! Debugging:
//!   use_gdbstub: "false"
//! ```
//!
//! Lives under `$XDG_CONFIG_HOME/ctrfront/` when that is set, otherwise under
//! the platform config directory (`~/.config`, `%APPDATA%`,
//! `~/Library/Application Support`).

use anyhow::{Context, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "ctrfront";
const CONFIG_FILE: &str = "config.yaml";

/// Section name -> (key -> value)
type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Sections as written by hand: values may be any scalar, sections may be empty
type RawSections = BTreeMap<String, Option<BTreeMap<String, Value>>>;

/// Default location of the config file, `<config dir>/ctrfront/config.yaml`.
///
/// An absolute `XDG_CONFIG_HOME` is honoured on every platform; otherwise the
/// platform config directory is used.
pub fn default_path() -> Result<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .or_else(dirs::config_dir)
        .context("could not determine the configuration directory")?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Persistent key/value store
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    sections: Sections,
}

impl ConfigStore {
    /// Load the store at `path`. A missing file gives an empty store; nothing
    /// is written until the first `set_key`.
    pub fn open(path: &Path) -> Result<Self> {
        let sections = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if text.trim().is_empty() {
                Sections::new()
            } else {
                let raw: RawSections = serde_yaml::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                normalize(raw)
            }
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Sections::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// Where this store is persisted
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a raw value
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    /// Set a value and write the whole store back to disk
    pub fn set_key(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_yaml::to_string(&self.sections).context("failed to encode config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

/// Stringify scalar values, dropping nulls and nested structures
fn normalize(raw: RawSections) -> Sections {
    raw.into_iter()
        .map(|(section, keys)| {
            let keys = keys
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s,
                        Value::Bool(b) => b.to_string(),
                        Value::Number(n) => n.to_string(),
                        Value::Null => return None,
                        _ => {
                            warn!("ignoring non-scalar value for {}.{}", section, key);
                            return None;
                        }
                    };
                    Some((key, value))
                })
                .collect();
            (section, keys)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_and_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.get("Controls", "pad_a"), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_set_key_persists_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut store = ConfigStore::open(&path).unwrap();
        store.set_key("Controls", "pad_a", "42").unwrap();
        assert_eq!(store.get("Controls", "pad_a"), Some("42"));

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get("Controls", "pad_a"), Some("42"));
    }

    #[test]
    fn test_set_key_preserves_other_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "Controls:\n  pad_b: \"22\"\nMiscellaneous:\n  log_filter: debug\n",
        )
        .unwrap();

        let mut store = ConfigStore::open(&path).unwrap();
        store.set_key("Controls", "pad_a", "4").unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get("Controls", "pad_a"), Some("4"));
        assert_eq!(reopened.get("Controls", "pad_b"), Some("22"));
        assert_eq!(reopened.get("Miscellaneous", "log_filter"), Some("debug"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "Controls: [1, 2\n").unwrap();

        let err = ConfigStore::open(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse"));
    }

    #[test]
    fn test_unquoted_scalars_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "Controls:\n  pad_a: 4\n  pad_b: [1]\nDebugging:\n  use_gdbstub: true\nLayout:\n",
        )
        .unwrap();

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.get("Controls", "pad_a"), Some("4"));
        assert_eq!(store.get("Controls", "pad_b"), None);
        assert_eq!(store.get("Debugging", "use_gdbstub"), Some("true"));
        assert_eq!(store.get("Layout", "anything"), None);
    }

    #[test]
    fn test_default_path_honours_xdg_config_home() {
        let dir = TempDir::new().unwrap();
        let saved = env::var_os("XDG_CONFIG_HOME");

        env::set_var("XDG_CONFIG_HOME", dir.path());
        let absolute = default_path();
        env::set_var("XDG_CONFIG_HOME", "relative/dir");
        let relative = default_path();
        match saved {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(
            absolute.unwrap(),
            dir.path().join("ctrfront").join("config.yaml")
        );
        if let Ok(path) = relative {
            assert!(!path.starts_with("relative"), "{}", path.display());
            assert!(path.ends_with("ctrfront/config.yaml"));
        }
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();

        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.get("Debugging", "use_gdbstub"), None);
    }
}
