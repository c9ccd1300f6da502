use std::path::PathBuf;
use std::time::Duration;

use tactics_core::{ClientPaths, DispatcherConfig, LightSource, ProfileStore, TileCoord};
use tracing_subscriber::EnvFilter;

use super::cli::CliOptions;
use super::ClientError;

pub(crate) const MAP_ENV_VAR: &str = "ISOTAC_MAP";
pub(crate) const DELAY_ENV_VAR: &str = "ISOTAC_ACTION_DELAY_MS";

const DEFAULT_LIGHT_TILE: TileCoord = TileCoord::new(2, 5);
const DEFAULT_LIGHT_RADIUS: f32 = 2.0;

#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub(crate) map_path: PathBuf,
    pub(crate) profile_store: ProfileStore,
    pub(crate) dispatcher: DispatcherConfig,
    pub(crate) lights: Vec<LightSource>,
    pub(crate) json: bool,
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// Layers defaults, then environment, then command-line flags.
pub(crate) fn build_config(
    paths: &ClientPaths,
    options: CliOptions,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ClientError> {
    let mut map_path = paths.default_map();
    let mut dispatcher = DispatcherConfig::default();

    if let Some(raw) = non_empty(env(MAP_ENV_VAR)) {
        map_path = PathBuf::from(raw);
    }
    if let Some(raw) = non_empty(env(DELAY_ENV_VAR)) {
        let millis = raw
            .parse::<u64>()
            .map_err(|_| ClientError::InvalidEnv {
                var: DELAY_ENV_VAR,
                value: raw.clone(),
            })?;
        dispatcher.delay = Duration::from_millis(millis);
    }

    if let Some(path) = options.map {
        map_path = path;
    }
    if let Some(millis) = options.delay_ms {
        dispatcher.delay = Duration::from_millis(millis);
    }
    let profile_store = options
        .profile
        .map(ProfileStore::new)
        .unwrap_or_else(|| paths.profile_store());

    let lights = if options.lights.is_empty() {
        vec![LightSource::new(DEFAULT_LIGHT_TILE, DEFAULT_LIGHT_RADIUS)?]
    } else {
        options.lights
    };

    Ok(ClientConfig {
        map_path,
        profile_store,
        dispatcher,
        lights,
        json: options.json,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
