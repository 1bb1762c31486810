//! Settings Persistence
//!
//! Keeps the operator configuration in sync with its file. Opening a store
//! reads the file, fills anything missing with defaults and writes the
//! result straight back, so the file on disk always lists every key. Each
//! setter saves immediately.

use crate::config::{Config, ConnectionSettings};
use crate::error::{SettingsError, SettingsResult};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
const APP_DIR: &str = "robotele";

/// Settings file name
const SETTINGS_FILE: &str = "settings.toml";

/// File-backed operator configuration
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    config: Config,
}

impl SettingsStore {
    /// Platform settings file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Open the store at the platform location
    pub fn open_default() -> SettingsResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the store at `path`.
    ///
    /// A missing file yields defaults. Either way the complete configuration
    /// is written back before returning.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();

        let config = if path.exists() {
            tracing::debug!("Loading settings from {}", path.display());
            Config::load_from_file(&path)
                .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?
        } else {
            tracing::info!("No settings at {}, using defaults", path.display());
            Config::default()
        };

        let store = Self { path, config };
        store.save()?;
        Ok(store)
    }

    /// Write the configuration to its file
    pub fn save(&self) -> SettingsResult<()> {
        self.config
            .save_to_file(&self.path)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", self.path.display(), e)))
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settings file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remember the robot address
    pub fn set_robot_ip(&mut self, ip: impl Into<String>) -> SettingsResult<()> {
        self.update(|config| config.connection.robot_ip = ip.into())
    }

    /// Remember the control mode
    pub fn set_pid_enabled(&mut self, enabled: bool) -> SettingsResult<()> {
        self.update(|config| config.control.pid_enabled = enabled)
    }

    /// Remember the robot address and ports
    pub fn set_connection(&mut self, connection: ConnectionSettings) -> SettingsResult<()> {
        self.update(|config| config.connection = connection)
    }

    /// Apply a change and save it. An invalid change is rolled back.
    fn update(&mut self, change: impl FnOnce(&mut Config)) -> SettingsResult<()> {
        let mut updated = self.config.clone();
        change(&mut updated);
        updated.validate()?;

        let previous = std::mem::replace(&mut self.config, updated);
        if let Err(e) = self.save() {
            self.config = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.config(), &Config::default());
        assert!(path.exists());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("robot_ip"));
        assert!(written.contains("settle_delay_ms"));
    }

    #[test]
    fn test_partial_file_is_completed_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[control]\npid_enabled = true\n").unwrap();

        let store = SettingsStore::open(&path).unwrap();
        assert!(store.config().control.pid_enabled);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("udp_status_port_listen"));
        assert!(written.contains("pid_enabled = true"));
    }

    #[test]
    fn test_setters_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open(&path).unwrap();
        store.set_robot_ip("10.1.2.3").unwrap();
        store.set_pid_enabled(true).unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.config().connection.robot_ip, "10.1.2.3");
        assert!(reopened.config().control.pid_enabled);
    }

    #[test]
    fn test_invalid_change_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut store = SettingsStore::open(&path).unwrap();
        assert!(store.set_robot_ip("").is_err());
        assert_eq!(store.config().connection.robot_ip, "127.0.0.1");
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[connection\nrobot_ip = ").unwrap();

        let err = SettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, SettingsError::LoadError(_)));
        // Left untouched for the operator to fix.
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("[connection"));
    }
}
