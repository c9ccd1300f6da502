mod actors;
mod profile;

pub use actors::{demo_roster, Actor, ActorId, ActorKind, ActorRoster, RosterError};
pub use profile::{
    sprite_key_for, CharacterClass, CharacterProfile, ProfileError, ProfileStore, Race,
    DEFAULT_SPRITE_KEY, PROFILE_FILE_NAME,
};
