use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::atomic_io::write_text_atomic;

pub const PROFILE_FILE_NAME: &str = "character_data.json";
pub const DEFAULT_SPRITE_KEY: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterClass {
    Warrior,
    Mage,
    Rogue,
    Cleric,
    Ranger,
    Paladin,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 6] = [
        CharacterClass::Warrior,
        CharacterClass::Mage,
        CharacterClass::Rogue,
        CharacterClass::Cleric,
        CharacterClass::Ranger,
        CharacterClass::Paladin,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Halfling,
    Dragonborn,
    Tiefling,
}

impl Race {
    pub const ALL: [Race; 6] = [
        Race::Human,
        Race::Elf,
        Race::Dwarf,
        Race::Halfling,
        Race::Dragonborn,
        Race::Tiefling,
    ];
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for CharacterClass {
    type Err = ProfileError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.to_string().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| ProfileError::UnknownClass(raw.to_string()))
    }
}

impl FromStr for Race {
    type Err = ProfileError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|race| race.to_string().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| ProfileError::UnknownRace(raw.to_string()))
    }
}

/// Sprite used for a class/race pick. Race is checked before class.
pub fn sprite_key_for(class: CharacterClass, race: Race) -> &'static str {
    if race == Race::Dwarf {
        return "dwarf";
    }
    match class {
        CharacterClass::Paladin => "knight",
        CharacterClass::Mage => "druid",
        _ => DEFAULT_SPRITE_KEY,
    }
}

/// The character chosen at creation, as stored between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub class: CharacterClass,
    pub race: Race,
    /// Derived sprite key.
    pub character: String,
}

impl CharacterProfile {
    pub fn new(name: &str, class: CharacterClass, race: Race) -> Result<Self, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            class,
            race,
            character: sprite_key_for(class, race).to_string(),
        })
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let expected = sprite_key_for(self.class, self.race);
        if self.character != expected {
            return Err(ProfileError::SpriteMismatch {
                stored: self.character.clone(),
                expected,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("character name must not be empty")]
    EmptyName,
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    #[error("unknown race '{0}'")]
    UnknownRace(String),
    #[error("stored sprite '{stored}' does not match class and race (expected '{expected}')")]
    SpriteMismatch {
        stored: String,
        expected: &'static str,
    },
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write profile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode profile: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to parse profile {path}{location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Single key-value blob holding the created character.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROFILE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, profile: &CharacterProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        let json = serde_json::to_string_pretty(profile).map_err(ProfileError::Encode)?;
        write_text_atomic(&self.path, &json).map_err(|source| ProfileError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), name = %profile.name, "profile_saved");
        Ok(())
    }

    /// `Ok(None)` when no character has been created yet.
    pub fn load(&self) -> Result<Option<CharacterProfile>, ProfileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ProfileError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let profile = self.parse(&raw)?;
        profile.validate()?;
        Ok(Some(profile))
    }

    fn parse(&self, raw: &str) -> Result<CharacterProfile, ProfileError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, CharacterProfile>(&mut deserializer).map_err(
            |error| {
                let path = error.path().to_string();
                let location = if path.is_empty() || path == "." {
                    String::new()
                } else {
                    format!(" at {path}")
                };
                ProfileError::Parse {
                    path: self.path.clone(),
                    location,
                    source: error.into_inner(),
                }
            },
        )
    }
}
