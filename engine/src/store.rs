//! Loading the three config documents and persisting state back to them.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::character::Character;
use crate::error::{ConfigError, StoreError};
use crate::session::SessionState;
use crate::settings::Settings;

pub const CHARACTER_STEM: &str = "character-config";
pub const SESSION_STEM: &str = "session-data";
pub const SETTINGS_STEM: &str = "settings";

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub character: Character,
    pub session: SessionState,
    pub settings: Settings,
}

/// Where the core commits state after every mutation.
pub trait StateStore {
    fn save_session(&mut self, state: &SessionState) -> Result<(), StoreError>;
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError>;
}

/// Find `<stem>.json`, then `.yaml`, then `.yml`.
fn locate(dir: &Path, stem: &str) -> Result<PathBuf, ConfigError> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::Missing {
            path: dir.join(format!("{}.json", stem)),
        })
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn validate_character(path: &Path, character: &Character) -> Result<(), ConfigError> {
    if character.weapon.die == 0 {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            field: "weapon.die",
            reason: "a die needs at least one side".into(),
        });
    }
    if let Some((name, _)) = character
        .additional_damage_dice
        .iter()
        .find(|(_, d)| d.die == 0)
    {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            field: "additional_damage_dice",
            reason: format!("`{}` has a zero-sided die", name),
        });
    }
    Ok(())
}

pub fn load_character(dir: &Path) -> Result<Character, ConfigError> {
    let path = locate(dir, CHARACTER_STEM)?;
    let character: Character = read_document(&path)?;
    validate_character(&path, &character)?;
    Ok(character)
}

pub fn load_session(dir: &Path) -> Result<SessionState, ConfigError> {
    let path = locate(dir, SESSION_STEM)?;
    let mut session: SessionState = read_document(&path)?;
    session.normalize();
    Ok(session)
}

pub fn load_settings(dir: &Path) -> Result<Settings, ConfigError> {
    let path = locate(dir, SETTINGS_STEM)?;
    read_document(&path)
}

/// All-or-nothing: any missing or malformed document fails the whole load.
pub fn load(dir: &Path) -> Result<Loaded, ConfigError> {
    let character = load_character(dir)?;
    let session = load_session(dir)?;
    let settings = load_settings(dir)?;
    debug!(dir = %dir.display(), character = %character.name, "configuration loaded");
    Ok(Loaded {
        character,
        session,
        settings,
    })
}

/// Saves pretty JSON next to the loaded documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize>(&self, stem: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(format!("{}.json", stem));
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&path, text).map_err(|source| StoreError::Io { path, source })
    }
}

impl StateStore for FileStore {
    fn save_session(&mut self, state: &SessionState) -> Result<(), StoreError> {
        self.write(SESSION_STEM, state)
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.write(SETTINGS_STEM, settings)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    session: Option<SessionState>,
    settings: Option<Settings>,
    session_saves: usize,
    settings_saves: usize,
}

/// In-memory store. Clones share the same contents, so a test can keep a
/// handle while the service owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_session(&self) -> Option<SessionState> {
        self.inner.borrow().session.clone()
    }

    pub fn saved_settings(&self) -> Option<Settings> {
        self.inner.borrow().settings
    }

    pub fn session_saves(&self) -> usize {
        self.inner.borrow().session_saves
    }

    pub fn settings_saves(&self) -> usize {
        self.inner.borrow().settings_saves
    }
}

impl StateStore for MemoryStore {
    fn save_session(&mut self, state: &SessionState) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.session = Some(state.clone());
        inner.session_saves += 1;
        Ok(())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.settings = Some(*settings);
        inner.settings_saves += 1;
        Ok(())
    }
}
