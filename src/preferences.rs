//! Persisted user preferences.
//!
//! The engine reads the "auto-advance to next item" setting once when a
//! session starts and writes it back whenever the user toggles it. It never
//! validates it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Get/set port for the auto-advance preference.
pub trait PreferenceStore {
    fn auto_advance(&self) -> bool;
    fn set_auto_advance(&mut self, enabled: bool) -> Result<()>;
}

/// On-disk shape of the preferences file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,
}

fn default_auto_advance() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_advance: default_auto_advance(),
        }
    }
}

/// Preferences that live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    prefs: Preferences,
}

impl MemoryPreferences {
    pub fn new(auto_advance: bool) -> Self {
        Self {
            prefs: Preferences { auto_advance },
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn auto_advance(&self) -> bool {
        self.prefs.auto_advance
    }

    fn set_auto_advance(&mut self, enabled: bool) -> Result<()> {
        self.prefs.auto_advance = enabled;
        Ok(())
    }
}

/// Preferences stored in a TOML file, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
    prefs: Preferences,
}

impl FilePreferences {
    /// Load preferences from `path`. Uses defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let prefs = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str::<Preferences>(&contents)?
        } else {
            Preferences::default()
        };
        Ok(Self { path, prefs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn auto_advance(&self) -> bool {
        self.prefs.auto_advance
    }

    fn set_auto_advance(&mut self, enabled: bool) -> Result<()> {
        self.prefs.auto_advance = enabled;
        std::fs::write(&self.path, toml::to_string(&self.prefs)?)?;
        debug!(path = %self.path.display(), enabled, "auto-advance preference saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_auto_advance() {
        assert!(Preferences::default().auto_advance);
        assert!(MemoryPreferences::default().auto_advance());
    }

    #[test]
    fn deserialize_empty_toml_uses_defaults() {
        let prefs: Preferences = toml::from_str("").unwrap();
        assert!(prefs.auto_advance);
    }

    #[test]
    fn memory_store_round_trips_setting() {
        let mut store = MemoryPreferences::new(true);
        store.set_auto_advance(false).unwrap();
        assert!(!store.auto_advance());
    }
}
