//! Render-agnostic core of the tactical map client: isometric geometry, tile lighting,
//! passability and adjacency resolution, map loading, and the action dispatch seam.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod actions;
mod atomic_io;
pub mod geometry;
pub mod map;
pub mod scene;

pub use actions::{
    Action, ActionDispatcher, ActionKind, ActionLog, ActionLogEntry, ActionReceipt,
    DispatcherConfig, LocalDispatcher, LogEntryKind, DEFAULT_DISPATCH_DELAY,
};
pub use geometry::{
    darkness_alpha, find_adjacent_tile, intensity, plan_attack, tile_diamond, to_world,
    AttackApproach, Direction, IsoError, IsoTransform, LightError, LightField, LightOverlay,
    LightSource, MapBounds, TileCoord, TileShade, Vec2, MAX_DARKNESS_ALPHA,
};
pub use map::{
    is_passable, load_tmx_file, parse_tmx, resolve_asset_path, resolve_gid, terrain_of,
    MapData, MapErrorCode, MapLoadError, Orientation, Terrain, TileLayer, Tileset,
    MAX_MAP_CELLS,
};
pub use scene::{
    demo_roster, sprite_key_for, Actor, ActorId, ActorKind, ActorRoster, CharacterClass,
    CharacterProfile, ProfileError, ProfileStore, Race, RosterError,
};

pub const ROOT_ENV_VAR: &str = "ISOTAC_ROOT";
pub const DEFAULT_MAP_FILE: &str = "tavern1.tmx";

#[derive(Debug, Clone)]
pub struct ClientPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl ClientPaths {
    pub fn default_map(&self) -> PathBuf {
        self.maps_dir.join(DEFAULT_MAP_FILE)
    }

    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::in_dir(&self.cache_dir)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "{}={} has no Cargo.toml with crates/ or assets/ beside it",
        ROOT_ENV_VAR,
        .0.display()
    )]
    InvalidEnvRoot(PathBuf),
    #[error("no project root above {}; set {}", .0.display(), ROOT_ENV_VAR)]
    RootNotFound(PathBuf),
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("cannot create cache directory {}: {source}", path.display())]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves the project root, then the map and cache directories under it.
pub fn resolve_client_paths() -> Result<ClientPaths, StartupError> {
    let root = match env::var_os(ROOT_ENV_VAR) {
        Some(raw) => root_from_env(Path::new(&raw))?,
        None => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            find_root_above(&exe).ok_or(StartupError::RootNotFound(exe))?
        }
    };

    let cache_dir = root.join("cache");
    fs::create_dir_all(&cache_dir).map_err(|source| StartupError::CreateCacheDir {
        path: cache_dir.clone(),
        source,
    })?;

    Ok(ClientPaths {
        maps_dir: root.join("assets").join("maps"),
        cache_dir,
        root,
    })
}

fn root_from_env(raw: &Path) -> Result<PathBuf, StartupError> {
    let root = fs::canonicalize(raw).unwrap_or_else(|_| raw.to_path_buf());
    if is_project_root(&root) {
        Ok(root)
    } else {
        Err(StartupError::InvalidEnvRoot(root))
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .skip(1)
        .find(|dir| is_project_root(dir))
        .map(|dir| fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
}

fn is_project_root(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file()
        && ["crates", "assets"]
            .iter()
            .any(|child| dir.join(child).is_dir())
}
