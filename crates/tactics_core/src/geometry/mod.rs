mod adjacency;
mod iso;
mod lighting;

pub use adjacency::{find_adjacent_tile, plan_attack, AttackApproach, Direction};
pub use iso::{tile_diamond, to_world, IsoError, IsoTransform, MapBounds, TileCoord, Vec2};
pub use lighting::{
    darkness_alpha, intensity, LightError, LightField, LightOverlay, LightSource, TileShade,
    BRIGHT_TILE_THRESHOLD, MAX_DARKNESS_ALPHA,
};
