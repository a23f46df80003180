use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use mood_core::PaletteChoice;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::location::GeoPosition;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPrefs {
    #[serde(default)]
    palette: PaletteChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<GeoPosition>,
}

/// Palette choice and manual location persisted as a small JSON file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file yields [`PaletteChoice::Auto`].
    pub fn load(&self) -> PaletteChoice {
        self.read().unwrap_or_default().palette
    }

    /// Saved position, if there is one and it holds valid coordinates.
    pub fn load_location(&self) -> Option<GeoPosition> {
        let saved = self.read()?.location?;
        match GeoPosition::new(saved.latitude, saved.longitude) {
            Ok(position) => Some(GeoPosition {
                label: saved.label,
                ..position
            }),
            Err(e) => {
                warn!("Ignoring saved location in {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, choice: PaletteChoice) -> anyhow::Result<()> {
        self.update(|prefs| prefs.palette = choice)?;
        debug!("Saved palette choice {} to {}", choice, self.path.display());
        Ok(())
    }

    pub fn save_location(&self, position: &GeoPosition) -> anyhow::Result<()> {
        self.update(|prefs| prefs.location = Some(position.clone()))?;
        debug!(
            "Saved location {:.4}, {:.4} to {}",
            position.latitude,
            position.longitude,
            self.path.display()
        );
        Ok(())
    }

    fn read(&self) -> Option<StoredPrefs> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved preferences at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<StoredPrefs>(&raw) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn!("Ignoring corrupt preferences in {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Read-modify-write, serialized across clones of the store.
    fn update(&self, change: impl FnOnce(&mut StoredPrefs)) -> anyhow::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("preference lock poisoned"))?;
        let mut prefs = self.read().unwrap_or_default();
        change(&mut prefs);
        let json = serde_json::to_string_pretty(&prefs)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_auto() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load(), PaletteChoice::Auto);
    }

    #[test]
    fn test_choice_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        store.save(PaletteChoice::Pastel).unwrap();
        assert_eq!(store.load(), PaletteChoice::Pastel);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"palette\": \"pastel\""));
    }

    #[test]
    fn test_corrupt_file_loads_auto() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{\"palette\": \"plaid\"}").unwrap();
        assert_eq!(PreferenceStore::new(&path).load(), PaletteChoice::Auto);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(PreferenceStore::new(&path).load(), PaletteChoice::Auto);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nope").join("prefs.json"));
        assert!(store.save(PaletteChoice::Warm).is_err());
    }

    #[test]
    fn test_location_round_trips_alongside_palette() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load_location(), None);

        let position = GeoPosition::new(51.5074, -0.1278).unwrap();
        store.save(PaletteChoice::Cool).unwrap();
        store.save_location(&position).unwrap();
        store.save(PaletteChoice::Warm).unwrap();

        let reopened = PreferenceStore::new(store.path());
        assert_eq!(reopened.load(), PaletteChoice::Warm);
        assert_eq!(reopened.load_location(), Some(position));
    }

    #[test]
    fn test_invalid_saved_location_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(
            &path,
            r#"{"palette": "warm", "location": {"latitude": 200.0, "longitude": 0.0}}"#,
        )
        .unwrap();
        let store = PreferenceStore::new(&path);
        assert_eq!(store.load(), PaletteChoice::Warm);
        assert_eq!(store.load_location(), None);
    }
}
