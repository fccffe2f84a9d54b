//! Package configuration and saved network settings.
//!
//! Two files are involved. `esp.ini` holds package-level options (where
//! to keep state) and is read through the `config` crate. The state
//! itself lives in `esp.yaml`: the default scan subnet plus the device
//! entries remembered for each unit, round-tripped with `serde_yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::DeviceEntry;
use crate::error::Result;
use crate::registry::Ipv4Network;

/// File name of the saved-settings document inside the settings dir.
pub const SETTINGS_FILE_NAME: &str = "esp.yaml";

/// Directory under the home directory used when `file_dir = default`.
const DEFAULT_DIR_NAME: &str = ".espeasy";

// ==================== Package Configuration ====================

/// `[USER_SETTINGS]` section of `esp.ini`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSettings {
    /// Directory for the saved-settings file, or the literal string
    /// `default` for `~/.espeasy`.
    pub file_dir: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            file_dir: "default".to_string(),
        }
    }
}

/// Package-level configuration read from an `esp.ini` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageConfig {
    #[serde(rename = "USER_SETTINGS", default)]
    pub user_settings: UserSettings,
}

impl PackageConfig {
    /// Loads the configuration from an `.ini` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading package configuration from {}", path.display());

        let config = Config::builder().add_source(File::from(path)).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Directory holding the saved-settings file.
    ///
    /// The literal `default` resolves to `~/.espeasy` (falling back to
    /// the current directory when no home directory is known).
    #[must_use]
    pub fn settings_dir(&self) -> PathBuf {
        if self.user_settings.file_dir == "default" {
            dirs::home_dir()
                .map_or_else(|| PathBuf::from("."), |home| home.join(DEFAULT_DIR_NAME))
        } else {
            PathBuf::from(&self.user_settings.file_dir)
        }
    }

    /// Full path of the saved-settings file.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.settings_dir().join(SETTINGS_FILE_NAME)
    }
}

// ==================== Saved Network Settings ====================

/// Devices remembered for a single unit, keyed by its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEsp {
    /// Address the unit was reached at when the settings were saved.
    pub ip: String,
    /// Device entries registered on the unit.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

impl SavedEsp {
    /// An entry for the given address with no devices yet.
    #[must_use]
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            devices: Vec::new(),
        }
    }
}

/// The `esp.yaml` document: scan subnet plus per-unit device entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Default subnet for [`Registry::scan_with_settings`].
    ///
    /// [`Registry::scan_with_settings`]: crate::registry::Registry::scan_with_settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4network: Option<Ipv4Network>,
    /// Saved units.
    #[serde(default)]
    pub esps: Vec<SavedEsp>,
}

impl NetworkSettings {
    /// Loads settings from a YAML file.
    ///
    /// A missing file is not an error: it loads as the default, so the
    /// first `save` can create it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings file at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Writes the settings to a YAML file, creating parent directories
    /// as needed. Overwrites any previous content.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_yaml::to_string(self)?;
        fs::write(path, raw)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Saved entry for the given address.
    #[must_use]
    pub fn esp(&self, ip: &str) -> Option<&SavedEsp> {
        self.esps.iter().find(|saved| saved.ip == ip)
    }

    /// Inserts an entry, replacing any previous one for the same
    /// address.
    pub fn upsert_esp(&mut self, saved: SavedEsp) {
        if let Some(existing) = self.esps.iter_mut().find(|e| e.ip == saved.ip) {
            *existing = saved;
        } else {
            self.esps.push(saved);
        }
    }
}
