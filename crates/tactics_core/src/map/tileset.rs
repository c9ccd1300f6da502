use std::collections::BTreeMap;

use tracing::trace;

pub const PASSABLE_PROPERTY: &str = "passable";
pub const TERRAIN_PROPERTY: &str = "terrain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProperty {
    pub value: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileDef {
    pub id: u32,
    pub properties: BTreeMap<String, TileProperty>,
}

impl TileDef {
    pub fn property(&self, name: &str) -> Option<&TileProperty> {
        self.properties.get(name)
    }

    /// `"false"` or `"0"` (any case) blocks; anything else, or no property, is passable.
    pub fn is_passable(&self) -> bool {
        match self.property(PASSABLE_PROPERTY) {
            Some(property) => {
                let value = property.value.trim();
                !(value.eq_ignore_ascii_case("false") || value == "0")
            }
            None => true,
        }
    }
}

/// One tileset of a map. Its tiles own global ids `first_gid..first_gid + tile_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    /// External `.tsx` reference, when the tileset was not embedded.
    pub source: Option<String>,
    pub image: Option<String>,
    pub tiles: BTreeMap<u32, TileDef>,
}

impl Tileset {
    pub fn tile(&self, local_id: u32) -> Option<&TileDef> {
        self.tiles.get(&local_id)
    }
}

/// Finds the tileset owning `gid`: the one with the greatest `first_gid <= gid`.
///
/// Returns the tileset and the tile's local id. Gid 0 is the empty tile and has no owner.
pub fn resolve_gid(gid: u32, tilesets: &[Tileset]) -> Option<(&Tileset, u32)> {
    if gid == 0 {
        return None;
    }
    tilesets
        .iter()
        .filter(|tileset| tileset.first_gid <= gid)
        .max_by_key(|tileset| tileset.first_gid)
        .map(|tileset| (tileset, gid - tileset.first_gid))
}

pub fn tile_def(gid: u32, tilesets: &[Tileset]) -> Option<&TileDef> {
    let (tileset, local_id) = resolve_gid(gid, tilesets)?;
    tileset.tile(local_id)
}

pub fn is_passable(gid: u32, tilesets: &[Tileset]) -> bool {
    match tile_def(gid, tilesets) {
        Some(def) => def.is_passable(),
        None => {
            if gid != 0 {
                trace!(gid, "tile_def_missing_defaulting_passable");
            }
            true
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terrain {
    Grass,
    Water,
    Stone,
    Dirt,
    Sand,
    Forest,
    Other(String),
}

impl Terrain {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grass" => Terrain::Grass,
            "water" => Terrain::Water,
            "stone" => Terrain::Stone,
            "dirt" => Terrain::Dirt,
            "sand" => Terrain::Sand,
            "forest" => Terrain::Forest,
            _ => Terrain::Other(raw.trim().to_string()),
        }
    }

    /// Flat colour for adapters that draw terrain without an image. Unknown terrain is grass.
    pub fn fallback_color(&self) -> &'static str {
        match self {
            Terrain::Grass | Terrain::Other(_) => "#4a7c59",
            Terrain::Water => "#2d4a5e",
            Terrain::Stone => "#6b7280",
            Terrain::Dirt => "#8b6f47",
            Terrain::Sand => "#d4a574",
            Terrain::Forest => "#2d5016",
        }
    }
}

pub fn terrain_of(gid: u32, tilesets: &[Tileset]) -> Option<Terrain> {
    tile_def(gid, tilesets)?
        .property(TERRAIN_PROPERTY)
        .map(|property| Terrain::parse(&property.value))
}

/// Image reference attached to the tile's terrain property, if any.
pub fn terrain_image(gid: u32, tilesets: &[Tileset]) -> Option<&str> {
    tile_def(gid, tilesets)?
        .property(TERRAIN_PROPERTY)?
        .image
        .as_deref()
}
