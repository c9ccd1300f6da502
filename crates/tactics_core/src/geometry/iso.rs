use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn offset_by(self, origin: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + origin.x,
            y: self.y + origin.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Orthogonal (4-neighbour) adjacency.
    pub fn is_orthogonally_adjacent(self, other: TileCoord) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

/// Map extent in tiles. Valid coordinates lie in `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBounds {
    pub width: u32,
    pub height: u32,
}

impl MapBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x < self.width && tile.y < self.height
    }

    /// Signed variant for candidate coordinates that may have stepped off the map.
    pub fn checked_tile(&self, x: i64, y: i64) -> Option<TileCoord> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(TileCoord::new(x as u32, y as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IsoError {
    #[error("tile dimensions must be finite and > 0, got {tile_width}x{tile_height}")]
    InvalidTileSize { tile_width: f32, tile_height: f32 },
}

/// Tile-to-world mapping for a diamond isometric grid.
///
/// Tile (0,0) maps to world (0,0); screen origin offsets are applied by the caller
/// (see [`Vec2::offset_by`]). The transform holds no other state, so two transforms
/// built from the same tile size always agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoTransform {
    tile_width: f32,
    tile_height: f32,
}

impl IsoTransform {
    pub fn new(tile_width: f32, tile_height: f32) -> Result<Self, IsoError> {
        let valid = |value: f32| value.is_finite() && value > 0.0;
        if !valid(tile_width) || !valid(tile_height) {
            return Err(IsoError::InvalidTileSize {
                tile_width,
                tile_height,
            });
        }
        Ok(Self {
            tile_width,
            tile_height,
        })
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn to_world(&self, tile: TileCoord) -> Vec2 {
        self.to_world_f(tile.x as f32, tile.y as f32)
    }

    pub fn to_world_f(&self, tile_x: f32, tile_y: f32) -> Vec2 {
        Vec2 {
            x: (tile_x - tile_y) * (self.tile_width / 2.0),
            y: (tile_x + tile_y) * (self.tile_height / 2.0),
        }
    }

    /// Continuous inverse of [`IsoTransform::to_world_f`].
    pub fn to_tile_f(&self, world: Vec2) -> (f32, f32) {
        let diff = world.x / (self.tile_width / 2.0);
        let sum = world.y / (self.tile_height / 2.0);
        ((sum + diff) / 2.0, (sum - diff) / 2.0)
    }

    /// Rounds a world position to the nearest tile, `None` when it falls off the map.
    pub fn pick_tile(&self, world: Vec2, bounds: MapBounds) -> Option<TileCoord> {
        let (tile_x, tile_y) = self.to_tile_f(world);
        if !tile_x.is_finite() || !tile_y.is_finite() {
            return None;
        }
        bounds.checked_tile(tile_x.round() as i64, tile_y.round() as i64)
    }

    /// Corners of the tile's diamond relative to its centre: top, right, bottom, left.
    pub fn tile_diamond(&self) -> [Vec2; 4] {
        tile_diamond(self.tile_width, self.tile_height)
    }
}

pub fn to_world(
    tile_x: u32,
    tile_y: u32,
    tile_width: f32,
    tile_height: f32,
) -> Result<Vec2, IsoError> {
    let transform = IsoTransform::new(tile_width, tile_height)?;
    Ok(transform.to_world(TileCoord::new(tile_x, tile_y)))
}

pub fn tile_diamond(tile_width: f32, tile_height: f32) -> [Vec2; 4] {
    let half_w = tile_width / 2.0;
    let half_h = tile_height / 2.0;
    [
        Vec2 { x: 0.0, y: -half_h },
        Vec2 { x: half_w, y: 0.0 },
        Vec2 { x: 0.0, y: half_h },
        Vec2 { x: -half_w, y: 0.0 },
    ]
}
