mod bootstrap;
mod cli;
mod runner;

use std::env;
use std::io;

use tactics_core::{
    load_tmx_file, resolve_client_paths, CharacterProfile, IsoError, LightError, LocalDispatcher,
    MapBounds, MapLoadError, ProfileError, RosterError, StartupError, TileCoord,
};
use thiserror::Error;
use tracing::info;

pub(crate) use bootstrap::init_tracing;
use cli::Command;
use runner::{print_log, Session};

#[derive(Debug, Error)]
pub(crate) enum ClientError {
    #[error("{0}")]
    Usage(String),
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Map(#[from] MapLoadError),
    #[error(transparent)]
    Iso(#[from] IsoError),
    #[error(transparent)]
    Light(#[from] LightError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("tile ({}, {}) is not passable", .0.x, .0.y)]
    Blocked(TileCoord),
    #[error(
        "tile ({}, {}) is outside the {}x{} map",
        tile.x,
        tile.y,
        bounds.width,
        bounds.height
    )]
    OffMap { tile: TileCoord, bounds: MapBounds },
    #[error("map has no player actor '{0}'")]
    MissingPlayer(String),
    #[error("action dispatch failed: {0}")]
    Dispatch(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to encode action log: {0}")]
    Encode(#[source] serde_json::Error),
}

fn usage_error(message: String) -> ClientError {
    ClientError::Usage(format!("{message}\n\n{}", cli::usage_text()))
}

pub(crate) fn run(args: &[String]) -> Result<(), ClientError> {
    let (options, command) = cli::parse_args(args).map_err(usage_error)?;
    if command == Command::Help {
        println!("{}", cli::usage_text());
        return Ok(());
    }

    let paths = resolve_client_paths()?;
    let config = bootstrap::build_config(&paths, options, |var| env::var(var).ok())?;
    info!(
        root = %paths.root.display(),
        map = %config.map_path.display(),
        delay_ms = config.dispatcher.delay.as_millis() as u64,
        lights = config.lights.len(),
        "client_config_resolved"
    );

    if let Command::CreateCharacter { name, class, race } = &command {
        let profile = CharacterProfile::new(name, *class, *race)?;
        config.profile_store.save(&profile)?;
        println!(
            "created {} the {} {} (sprite '{}')",
            profile.name, profile.race, profile.class, profile.character
        );
        return Ok(());
    }

    let map = load_tmx_file(&config.map_path)?;
    let profile = config.profile_store.load()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(ClientError::Runtime)?;

    let dispatcher = LocalDispatcher::new(config.dispatcher);
    let mut session = Session::new(map, profile.as_ref(), config.lights, dispatcher)?;
    runtime.block_on(session.execute(command))?;
    print_log(session.log(), config.json)
}
