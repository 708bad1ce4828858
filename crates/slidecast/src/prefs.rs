//! User preferences that survive between sessions, and the first-visit
//! introduction overlay that depends on them.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::schedule::Millis;

pub const THEME_KEY: &str = "theme";
pub const SPEAK_KEY: &str = "speak";
pub const SEEN_INTRO_KEY: &str = "seenIntro";

/// Delay between startup and the introduction overlay appearing.
pub const INTRO_DELAY_MS: Millis = 180;

const FILENAME: &str = "preferences.yaml";
const APP_DIR: &str = "slidecast";

/// A string key/value store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept in a YAML map on disk. Every `set` rewrites the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(contents) => serde_yaml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed preferences {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read preferences {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&self.values)?;
        std::fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Preferences that last only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Theme and narration flags, mirrored to a [`PreferenceStore`].
pub struct Preferences {
    store: Box<dyn PreferenceStore>,
    dark_theme: bool,
    speak_enabled: bool,
}

impl Preferences {
    /// Restore from `store`: dark theme and narration off unless saved otherwise.
    pub fn load(store: Box<dyn PreferenceStore>) -> Self {
        let dark_theme = store.get(THEME_KEY).as_deref() != Some("light");
        let speak_enabled = store.get(SPEAK_KEY).as_deref() == Some("true");
        Self {
            store,
            dark_theme,
            speak_enabled,
        }
    }

    pub fn dark_theme(&self) -> bool {
        self.dark_theme
    }

    pub fn speak_enabled(&self) -> bool {
        self.speak_enabled
    }

    pub fn seen_intro(&self) -> bool {
        self.store.get(SEEN_INTRO_KEY).as_deref() == Some("true")
    }

    /// Flip the theme and persist it. Returns whether the theme is now dark.
    pub fn toggle_theme(&mut self) -> bool {
        self.dark_theme = !self.dark_theme;
        let value = if self.dark_theme { "dark" } else { "light" };
        self.persist(THEME_KEY, value);
        self.dark_theme
    }

    /// Flip narration and persist it. Returns whether narration is now on.
    pub fn toggle_speak(&mut self) -> bool {
        self.speak_enabled = !self.speak_enabled;
        let value = if self.speak_enabled { "true" } else { "false" };
        self.persist(SPEAK_KEY, value);
        self.speak_enabled
    }

    pub fn mark_intro_seen(&mut self) {
        self.persist(SEEN_INTRO_KEY, "true");
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to save preference {key}: {e:#}");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroState {
    Hidden,
    /// Scheduled to open.
    Pending,
    Open,
}

/// The first-visit introduction overlay.
#[derive(Debug, Clone)]
pub struct IntroOverlay {
    state: IntroState,
    /// The overlay's "do not show again" checkbox.
    pub dont_show_again: bool,
}

impl Default for IntroOverlay {
    fn default() -> Self {
        Self {
            state: IntroState::Hidden,
            dont_show_again: false,
        }
    }
}

impl IntroOverlay {
    pub fn state(&self) -> IntroState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state() == IntroState::Open
    }

    pub fn schedule(&mut self) {
        self.state = IntroState::Pending;
    }

    /// Open the overlay if it is still pending. Returns whether it opened.
    pub fn open(&mut self) -> bool {
        if self.state == IntroState::Pending {
            self.state = IntroState::Open;
            true
        } else {
            false
        }
    }

    /// Close the overlay. Returns whether "do not show again" should be
    /// persisted: only for an explicit dismissal with the box ticked.
    pub fn dismiss(&mut self, save: bool) -> bool {
        if self.state != IntroState::Open {
            return false;
        }
        self.state = IntroState::Hidden;
        save && self.dont_show_again
    }
}
