//! Plain-text config store: one file for the hotkey, one for the mode.
//!
//! Only the first line of each file is read. An empty hotkey or an unknown
//! mode value is reported as `ConfigError::Invalid`, which setup treats the
//! same as a missing file.

pub mod setup;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config;
use crate::core::{HotkeyBinding, Mode};
use crate::error::ConfigError;

pub use setup::{load_or_setup, ConsolePrompt, Prompter};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn hotkey_path(&self) -> PathBuf {
        self.dir.join(config::HOTKEY_FILE)
    }

    pub fn mode_path(&self) -> PathBuf {
        self.dir.join(config::MODE_FILE)
    }

    pub fn load_hotkey(&self) -> Result<HotkeyBinding, ConfigError> {
        let path = self.hotkey_path();
        let line = read_first_line(&path)?;
        HotkeyBinding::parse(&line).ok_or(ConfigError::Invalid {
            path,
            reason: "hotkey is empty".into(),
        })
    }

    pub fn save_hotkey(&self, binding: &HotkeyBinding) -> Result<(), ConfigError> {
        self.write(&self.hotkey_path(), binding.as_str())
    }

    pub fn load_mode(&self) -> Result<Mode, ConfigError> {
        let path = self.mode_path();
        let line = read_first_line(&path)?;
        Mode::from_choice(&line).ok_or_else(|| ConfigError::Invalid {
            path,
            reason: format!("expected '1' or '2', found {line:?}"),
        })
    }

    pub fn save_mode(&self, mode: Mode) -> Result<(), ConfigError> {
        self.write(&self.mode_path(), mode.as_choice())
    }

    fn write(&self, path: &Path, value: &str) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(path, value).map_err(io_err)?;
        tracing::debug!("Saved {}", path.display());
        Ok(())
    }
}

fn read_first_line(path: &Path) -> Result<String, ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().next().unwrap_or("").trim().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ConfigError::Missing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_missing_files() {
        let (_dir, store) = store();
        assert!(matches!(store.load_hotkey(), Err(ConfigError::Missing { .. })));
        assert!(matches!(store.load_mode(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = store();
        store.save_hotkey(&HotkeyBinding::parse("ctrl+F10").unwrap()).unwrap();
        store.save_mode(Mode::Hold).unwrap();

        assert_eq!(store.load_hotkey().unwrap().as_str(), "ctrl+F10");
        assert_eq!(store.load_mode().unwrap(), Mode::Hold);
        assert_eq!(fs::read_to_string(store.mode_path()).unwrap(), "2");
    }

    #[test]
    fn test_only_first_line_is_read() {
        let (_dir, store) = store();
        fs::write(store.hotkey_path(), "f9\nignored\n").unwrap();
        fs::write(store.mode_path(), " 1 \n2\n").unwrap();
        assert_eq!(store.load_hotkey().unwrap().as_str(), "f9");
        assert_eq!(store.load_mode().unwrap(), Mode::Toggle);
    }

    #[test]
    fn test_empty_hotkey_is_invalid() {
        let (_dir, store) = store();
        fs::write(store.hotkey_path(), "\n").unwrap();
        assert!(matches!(store.load_hotkey(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_unknown_mode_is_invalid() {
        let (_dir, store) = store();
        fs::write(store.mode_path(), "toggle").unwrap();
        let err = store.load_mode().unwrap_err();
        assert!(err.to_string().contains("expected '1' or '2'"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("cfg"));
        store.save_mode(Mode::Toggle).unwrap();
        assert_eq!(store.load_mode().unwrap(), Mode::Toggle);
    }
}
