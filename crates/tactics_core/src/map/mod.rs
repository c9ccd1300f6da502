mod asset_path;
mod tileset;
mod tmx;

use std::collections::HashSet;

use thiserror::Error;

use crate::geometry::{IsoError, IsoTransform, MapBounds, TileCoord};

pub use asset_path::resolve_asset_path;
pub use tileset::{
    is_passable, resolve_gid, terrain_image, terrain_of, tile_def, Terrain, TileDef,
    TileProperty, Tileset, PASSABLE_PROPERTY, TERRAIN_PROPERTY,
};
pub use tmx::{load_tmx_file, parse_tmx, MapErrorCode, MapLoadError, SourceLocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orientation {
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
    Other(String),
}

impl Orientation {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "orthogonal" => Orientation::Orthogonal,
            "isometric" => Orientation::Isometric,
            "staggered" => Orientation::Staggered,
            "hexagonal" => Orientation::Hexagonal,
            other => Orientation::Other(other.to_string()),
        }
    }
}

/// Largest map the loader accepts, in cells.
pub const MAX_MAP_CELLS: usize = 2048 * 2048;

/// Cell count of a `width` x `height` grid, or `None` past [`MAX_MAP_CELLS`].
pub(crate) fn checked_cell_count(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| *count <= MAX_MAP_CELLS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileLayerError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

/// Row-major grid of global tile ids; 0 marks an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    id: u32,
    name: String,
    width: u32,
    height: u32,
    tiles: Vec<u32>,
}

impl TileLayer {
    pub fn new(
        id: u32,
        name: String,
        width: u32,
        height: u32,
        tiles: Vec<u32>,
    ) -> Result<Self, TileLayerError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .unwrap_or(usize::MAX);
        let actual = tiles.len();
        if expected != actual {
            return Err(TileLayerError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            id,
            name,
            width,
            height,
            tiles,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some(tile.y as usize * self.width as usize + tile.x as usize)
    }

    pub fn tile_at(&self, tile: TileCoord) -> Option<u32> {
        self.index_of(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Every cell in row-major order with its gid.
    pub fn cells(&self) -> impl Iterator<Item = (TileCoord, u32)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().map(move |(index, gid)| {
            let index = index as u32;
            (TileCoord::new(index % width, index / width), *gid)
        })
    }
}

/// Validated map: one schema consumed uniformly by the resolvers.
///
/// Tilesets are kept sorted by `first_gid`; every layer spans exactly the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapData {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    orientation: Option<Orientation>,
    layers: Vec<TileLayer>,
    tilesets: Vec<Tileset>,
}

impl MapData {
    pub fn new(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        orientation: Option<Orientation>,
        layers: Vec<TileLayer>,
        mut tilesets: Vec<Tileset>,
    ) -> Result<Self, MapLoadError> {
        if width == 0 || height == 0 {
            return Err(MapLoadError::new(
                MapErrorCode::InvalidValue,
                format!("map size must be > 0, got {width}x{height}"),
            ));
        }
        if checked_cell_count(width, height).is_none() {
            return Err(MapLoadError::new(
                MapErrorCode::TooManyCells,
                format!("map size {width}x{height} exceeds {MAX_MAP_CELLS} cells"),
            ));
        }
        if tile_width == 0 || tile_height == 0 {
            return Err(MapLoadError::new(
                MapErrorCode::InvalidValue,
                format!("tile size must be > 0, got {tile_width}x{tile_height}"),
            ));
        }

        let mut seen_first_gids = HashSet::new();
        for tileset in &tilesets {
            if tileset.first_gid == 0 {
                return Err(MapLoadError::new(
                    MapErrorCode::InvalidValue,
                    format!("tileset '{}' has firstgid 0; gids start at 1", tileset.name),
                ));
            }
            if !seen_first_gids.insert(tileset.first_gid) {
                return Err(MapLoadError::new(
                    MapErrorCode::DuplicateTileset,
                    format!("more than one tileset uses firstgid {}", tileset.first_gid),
                ));
            }
        }
        tilesets.sort_by_key(|tileset| tileset.first_gid);

        for layer in &layers {
            if layer.width != width || layer.height != height {
                return Err(MapLoadError::new(
                    MapErrorCode::LayerSizeMismatch,
                    format!(
                        "layer '{}' is {}x{} but the map is {}x{}",
                        layer.name, layer.width, layer.height, width, height
                    ),
                ));
            }
        }

        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            orientation,
            layers,
            tilesets,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn orientation(&self) -> Option<&Orientation> {
        self.orientation.as_ref()
    }

    pub fn bounds(&self) -> MapBounds {
        MapBounds::new(self.width, self.height)
    }

    pub fn iso_transform(&self) -> Result<IsoTransform, IsoError> {
        IsoTransform::new(self.tile_width as f32, self.tile_height as f32)
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Layer drawn last; the lighting overlay is attached to its tiles.
    pub fn top_layer(&self) -> Option<&TileLayer> {
        self.layers.last()
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// A cell blocks movement when any layer places an impassable tile on it.
    pub fn is_tile_passable(&self, tile: TileCoord) -> bool {
        self.layers
            .iter()
            .filter_map(|layer| layer.tile_at(tile))
            .all(|gid| is_passable(gid, &self.tilesets))
    }

    pub fn terrain_at(&self, tile: TileCoord) -> Option<Terrain> {
        self.layers
            .iter()
            .rev()
            .filter_map(|layer| layer.tile_at(tile))
            .find_map(|gid| terrain_of(gid, &self.tilesets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking_tileset(first_gid: u32) -> Tileset {
        let mut tiles = std::collections::BTreeMap::new();
        tiles.insert(
            0,
            TileDef {
                id: 0,
                properties: [(
                    PASSABLE_PROPERTY.to_string(),
                    TileProperty {
                        value: "false".to_string(),
                        image: None,
                    },
                )]
                .into_iter()
                .collect(),
            },
        );
        Tileset {
            first_gid,
            name: format!("set{first_gid}"),
            tiles,
            ..Tileset::default()
        }
    }

    #[test]
    fn layer_rejects_wrong_tile_count() {
        let err = TileLayer::new(1, "ground".to_string(), 2, 2, vec![1, 1, 1]).expect_err("err");
        assert_eq!(
            err,
            TileLayerError::TileCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn layer_cells_are_row_major() {
        let layer = TileLayer::new(1, "ground".to_string(), 2, 2, vec![1, 2, 3, 4]).expect("layer");
        let cells = layer.cells().collect::<Vec<_>>();
        assert_eq!(cells[1], (TileCoord::new(1, 0), 2));
        assert_eq!(cells[2], (TileCoord::new(0, 1), 3));
        assert_eq!(layer.tile_at(TileCoord::new(1, 1)), Some(4));
        assert_eq!(layer.tile_at(TileCoord::new(2, 0)), None);
    }

    #[test]
    fn map_size_is_capped() {
        assert_eq!(checked_cell_count(2048, 2048), Some(MAX_MAP_CELLS));
        assert_eq!(checked_cell_count(2049, 2048), None);
        assert_eq!(checked_cell_count(u32::MAX, u32::MAX), None);

        let err = MapData::new(u32::MAX, 2, 64, 32, None, Vec::new(), Vec::new())
            .expect_err("err");
        assert_eq!(err.code, MapErrorCode::TooManyCells);
    }

    #[test]
    fn map_sorts_tilesets_and_rejects_duplicates() {
        let map = MapData::new(
            1,
            1,
            64,
            32,
            None,
            Vec::new(),
            vec![blocking_tileset(9), blocking_tileset(1)],
        )
        .expect("map");
        assert_eq!(map.tilesets()[0].first_gid, 1);

        let err = MapData::new(
            1,
            1,
            64,
            32,
            None,
            Vec::new(),
            vec![blocking_tileset(3), blocking_tileset(3)],
        )
        .expect_err("duplicate");
        assert_eq!(err.code, MapErrorCode::DuplicateTileset);
    }

    #[test]
    fn map_rejects_layers_that_do_not_span_it() {
        let layer = TileLayer::new(1, "ground".to_string(), 1, 1, vec![0]).expect("layer");
        let err = MapData::new(2, 2, 64, 32, None, vec![layer], Vec::new()).expect_err("err");
        assert_eq!(err.code, MapErrorCode::LayerSizeMismatch);
    }

    #[test]
    fn any_blocking_layer_blocks_the_cell() {
        let ground = TileLayer::new(1, "ground".to_string(), 2, 1, vec![2, 2]).expect("ground");
        let props = TileLayer::new(2, "props".to_string(), 2, 1, vec![0, 1]).expect("props");
        let map = MapData::new(
            2,
            1,
            64,
            32,
            Some(Orientation::Isometric),
            vec![ground, props],
            vec![blocking_tileset(1)],
        )
        .expect("map");
        assert!(map.is_tile_passable(TileCoord::new(0, 0)));
        assert!(!map.is_tile_passable(TileCoord::new(1, 0)));
        assert_eq!(map.top_layer().map(TileLayer::name), Some("props"));
    }
}
