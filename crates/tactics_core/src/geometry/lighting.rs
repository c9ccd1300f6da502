use thiserror::Error;
use tracing::debug;

use super::iso::TileCoord;
use crate::map::TileLayer;

/// Overlay opacity for a fully dark tile; kept below 1 so geometry stays faintly visible.
pub const MAX_DARKNESS_ALPHA: f32 = 0.85;
pub const BRIGHT_TILE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LightError {
    #[error("light radius must be finite and > 0, got {0}")]
    InvalidRadius(f32),
    #[error("hard radius must be finite and within [0, {radius}], got {hard_radius}")]
    InvalidHardRadius { radius: f32, hard_radius: f32 },
}

/// Point light placed on a tile. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    position: TileCoord,
    radius: f32,
    hard_radius: Option<f32>,
}

impl LightSource {
    pub fn new(position: TileCoord, radius: f32) -> Result<Self, LightError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(LightError::InvalidRadius(radius));
        }
        Ok(Self {
            position,
            radius,
            hard_radius: None,
        })
    }

    pub fn with_hard_radius(
        position: TileCoord,
        radius: f32,
        hard_radius: f32,
    ) -> Result<Self, LightError> {
        let light = Self::new(position, radius)?;
        if !hard_radius.is_finite() || hard_radius < 0.0 || hard_radius > radius {
            return Err(LightError::InvalidHardRadius {
                radius,
                hard_radius,
            });
        }
        Ok(Self {
            hard_radius: Some(hard_radius),
            ..light
        })
    }

    pub fn position(&self) -> TileCoord {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn hard_radius(&self) -> Option<f32> {
        self.hard_radius
    }

    /// Contribution of this light alone at `tile`.
    ///
    /// Outside the radius (and exactly on it) the light contributes nothing; strictly
    /// inside the hard radius it is full brightness; otherwise it falls off linearly.
    pub fn contribution_at(&self, tile: TileCoord) -> f32 {
        let dx = tile.x as f32 - self.position.x as f32;
        let dy = tile.y as f32 - self.position.y as f32;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > self.radius {
            return 0.0;
        }
        if self.hard_radius.is_some_and(|hard| distance < hard) {
            return 1.0;
        }
        (1.0 - distance / self.radius).max(0.0)
    }
}

/// Illumination at `tile` in `[0, 1]`: the strongest single light wins, lights never add.
pub fn intensity(tile: TileCoord, lights: &[LightSource]) -> f32 {
    lights
        .iter()
        .map(|light| light.contribution_at(tile))
        .fold(0.0, f32::max)
}

pub fn darkness_alpha(intensity: f32) -> f32 {
    (1.0 - intensity.clamp(0.0, 1.0)) * MAX_DARKNESS_ALPHA
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileShade {
    pub tile: TileCoord,
    pub intensity: f32,
    pub darkness_alpha: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightOverlay {
    pub shades: Vec<TileShade>,
    pub bright_tile_count: usize,
}

/// The set of lights active in a scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightField {
    lights: Vec<LightSource>,
}

impl LightField {
    pub fn new(lights: Vec<LightSource>) -> Self {
        Self { lights }
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    pub fn add(&mut self, light: LightSource) {
        self.lights.push(light);
    }

    pub fn intensity(&self, tile: TileCoord) -> f32 {
        intensity(tile, &self.lights)
    }

    pub fn darkness_alpha(&self, tile: TileCoord) -> f32 {
        darkness_alpha(self.intensity(tile))
    }

    /// Shades every occupied cell of `layer`; empty cells get no overlay.
    pub fn overlay(&self, layer: &TileLayer) -> LightOverlay {
        let mut shades = Vec::new();
        let mut bright_tile_count = 0usize;
        for (tile, gid) in layer.cells() {
            if gid == 0 {
                continue;
            }
            let intensity = self.intensity(tile);
            if intensity > BRIGHT_TILE_THRESHOLD {
                bright_tile_count += 1;
                debug!(x = tile.x, y = tile.y, intensity, "bright_tile");
            }
            shades.push(TileShade {
                tile,
                intensity,
                darkness_alpha: darkness_alpha(intensity),
            });
        }
        debug!(
            layer = layer.name(),
            shaded = shades.len(),
            bright_tile_count,
            "light_overlay_built"
        );
        LightOverlay {
            shades,
            bright_tile_count,
        }
    }
}
