use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info};

use super::tileset::{TileDef, TileProperty, Tileset};
use super::{checked_cell_count, MapData, Orientation, TileLayer, MAX_MAP_CELLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    MissingAttribute,
    InvalidValue,
    DuplicateTileset,
    UnsupportedEncoding,
    TooManyCells,
    LayerSizeMismatch,
}

#[derive(Debug, Clone)]
pub struct MapLoadError {
    pub code: MapErrorCode,
    pub message: String,
    pub file_path: Option<PathBuf>,
    pub location: Option<SourceLocation>,
}

impl MapLoadError {
    pub(crate) fn new(code: MapErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            file_path: None,
            location: None,
        }
    }

    fn in_file(mut self, path: &Path) -> Self {
        if self.file_path.is_none() {
            self.file_path = Some(path.to_path_buf());
        }
        self
    }
}

impl fmt::Display for MapLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)?;
        match (&self.file_path, self.location) {
            (Some(path), Some(loc)) => write!(
                f,
                " (file={}, line={}, column={})",
                path.display(),
                loc.line,
                loc.column
            ),
            (Some(path), None) => write!(f, " (file={})", path.display()),
            (None, Some(loc)) => write!(f, " (line={}, column={})", loc.line, loc.column),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for MapLoadError {}

struct ParsedMap {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    orientation: Option<Orientation>,
    layers: Vec<TileLayer>,
    tilesets: Vec<Tileset>,
}

impl ParsedMap {
    fn into_map_data(self) -> Result<MapData, MapLoadError> {
        MapData::new(
            self.width,
            self.height,
            self.tile_width,
            self.tile_height,
            self.orientation,
            self.layers,
            self.tilesets,
        )
    }
}

/// Parses a Tiled `.tmx` document. External tilesets keep their `source` but no tiles;
/// use [`load_tmx_file`] to have them resolved from disk.
pub fn parse_tmx(raw: &str) -> Result<MapData, MapLoadError> {
    parse_map_document(raw)?.into_map_data()
}

pub fn load_tmx_file(path: &Path) -> Result<MapData, MapLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        MapLoadError::new(
            MapErrorCode::ReadFile,
            format!("failed to read map file: {error}"),
        )
        .in_file(path)
    })?;
    let mut parsed = parse_map_document(&raw).map_err(|error| error.in_file(path))?;

    let map_dir = path.parent().unwrap_or_else(|| Path::new(""));
    for tileset in &mut parsed.tilesets {
        let Some(source) = tileset.source.clone() else {
            continue;
        };
        let tsx_path = map_dir.join(&source);
        let tsx_raw = fs::read_to_string(&tsx_path).map_err(|error| {
            MapLoadError::new(
                MapErrorCode::ReadFile,
                format!("failed to read external tileset '{source}': {error}"),
            )
            .in_file(&tsx_path)
        })?;
        let mut external = parse_tileset_document(&tsx_raw, tileset.first_gid)
            .map_err(|error| error.in_file(&tsx_path))?;
        external.source = Some(source);
        debug!(
            tileset = %external.name,
            first_gid = external.first_gid,
            tiles = external.tiles.len(),
            "external_tileset_loaded"
        );
        *tileset = external;
    }

    let map = parsed
        .into_map_data()
        .map_err(|error| error.in_file(path))?;
    info!(
        path = %path.display(),
        width = map.width(),
        height = map.height(),
        layers = map.layers().len(),
        tilesets = map.tilesets().len(),
        "map_loaded"
    );
    Ok(map)
}

fn parse_map_document(raw: &str) -> Result<ParsedMap, MapLoadError> {
    let doc = parse_document(raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(error_at_node(
            MapErrorCode::InvalidRoot,
            "root element must be <map>".to_string(),
            &doc,
            root,
        ));
    }

    let width = required_u32(&doc, root, "width")?;
    let height = required_u32(&doc, root, "height")?;
    let tile_width = required_u32(&doc, root, "tilewidth")?;
    let tile_height = required_u32(&doc, root, "tileheight")?;
    if width == 0 || height == 0 || tile_width == 0 || tile_height == 0 {
        return Err(error_at_node(
            MapErrorCode::InvalidValue,
            format!(
                "map and tile dimensions must be > 0, got {width}x{height} tiles of {tile_width}x{tile_height}"
            ),
            &doc,
            root,
        ));
    }
    if checked_cell_count(width, height).is_none() {
        return Err(error_at_node(
            MapErrorCode::TooManyCells,
            format!("map size {width}x{height} exceeds {MAX_MAP_CELLS} cells"),
            &doc,
            root,
        ));
    }
    let orientation = root.attribute("orientation").map(Orientation::parse);

    let mut tilesets = Vec::new();
    let mut layers = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "tileset" => {
                let first_gid = required_u32(&doc, child, "firstgid")?;
                if first_gid == 0 {
                    return Err(error_at_node(
                        MapErrorCode::InvalidValue,
                        "tileset firstgid must be >= 1".to_string(),
                        &doc,
                        child,
                    ));
                }
                tilesets.push(parse_tileset_node(&doc, child, first_gid)?);
            }
            "layer" => layers.push(parse_layer_node(&doc, child, width, height)?),
            // Object groups, image layers and map properties are not consumed.
            _ => {}
        }
    }

    Ok(ParsedMap {
        width,
        height,
        tile_width,
        tile_height,
        orientation,
        layers,
        tilesets,
    })
}

fn parse_tileset_document(raw: &str, first_gid: u32) -> Result<Tileset, MapLoadError> {
    let doc = parse_document(raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(error_at_node(
            MapErrorCode::InvalidRoot,
            "root element of an external tileset must be <tileset>".to_string(),
            &doc,
            root,
        ));
    }
    parse_tileset_node(&doc, root, first_gid)
}

fn parse_tileset_node(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    first_gid: u32,
) -> Result<Tileset, MapLoadError> {
    let mut tileset = Tileset {
        first_gid,
        name: node.attribute("name").unwrap_or_default().to_string(),
        tile_width: optional_u32(doc, node, "tilewidth")?.unwrap_or(0),
        tile_height: optional_u32(doc, node, "tileheight")?.unwrap_or(0),
        columns: optional_u32(doc, node, "columns")?.unwrap_or(1),
        source: node.attribute("source").map(ToString::to_string),
        image: None,
        tiles: BTreeMap::new(),
    };

    for child in node.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "image" => tileset.image = child.attribute("source").map(ToString::to_string),
            "tile" => {
                let id = required_u32(doc, child, "id")?;
                let properties = child
                    .children()
                    .filter(|n| n.has_tag_name("properties"))
                    .flat_map(|n| n.children().filter(|p| p.has_tag_name("property")))
                    .filter_map(|property| {
                        let name = property.attribute("name").filter(|v| !v.is_empty())?;
                        let value = property.attribute("value").filter(|v| !v.is_empty())?;
                        Some((
                            name.to_string(),
                            TileProperty {
                                value: value.to_string(),
                                image: property.attribute("image").map(ToString::to_string),
                            },
                        ))
                    })
                    .collect();
                tileset.tiles.insert(id, TileDef { id, properties });
            }
            _ => {}
        }
    }

    Ok(tileset)
}

fn parse_layer_node(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    map_width: u32,
    map_height: u32,
) -> Result<TileLayer, MapLoadError> {
    let id = optional_u32(doc, node, "id")?.unwrap_or(0);
    let name = node.attribute("name").unwrap_or_default().to_string();
    let width = optional_u32(doc, node, "width")?.unwrap_or(map_width);
    let height = optional_u32(doc, node, "height")?.unwrap_or(map_height);
    let cell_count = checked_cell_count(width, height).ok_or_else(|| {
        error_at_node(
            MapErrorCode::TooManyCells,
            format!("layer '{name}' size {width}x{height} exceeds {MAX_MAP_CELLS} cells"),
            doc,
            node,
        )
    })?;

    let mut tiles = match node.children().find(|child| child.has_tag_name("data")) {
        Some(data) => parse_layer_data(doc, data)?,
        None => Vec::new(),
    };
    if tiles.len() > cell_count {
        return Err(error_at_node(
            MapErrorCode::TooManyCells,
            format!(
                "layer '{name}' holds {} cells but is only {width}x{height}",
                tiles.len()
            ),
            doc,
            node,
        ));
    }
    tiles.resize(cell_count, 0);

    TileLayer::new(id, name, width, height, tiles).map_err(|error| {
        error_at_node(MapErrorCode::InvalidValue, error.to_string(), doc, node)
    })
}

fn parse_layer_data(doc: &Document<'_>, data: Node<'_, '_>) -> Result<Vec<u32>, MapLoadError> {
    match data.attribute("encoding") {
        Some("csv") => {
            let text = data.text().unwrap_or_default();
            text.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|cell| !cell.is_empty())
                .map(|cell| {
                    cell.parse::<u32>().map_err(|_| {
                        error_at_node(
                            MapErrorCode::InvalidValue,
                            format!("csv cell '{cell}' is not a tile id"),
                            doc,
                            data,
                        )
                    })
                })
                .collect()
        }
        None => data
            .children()
            .filter(|child| child.has_tag_name("tile"))
            .map(|tile| optional_u32(doc, tile, "gid").map(|gid| gid.unwrap_or(0)))
            .collect(),
        Some(other) => Err(error_at_node(
            MapErrorCode::UnsupportedEncoding,
            format!("layer encoding '{other}' is not supported; export the map as CSV"),
            doc,
            data,
        )),
    }
}

fn parse_document(raw: &str) -> Result<Document<'_>, MapLoadError> {
    Document::parse(raw).map_err(|error| MapLoadError {
        code: MapErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: None,
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })
}

fn required_u32(doc: &Document<'_>, node: Node<'_, '_>, name: &str) -> Result<u32, MapLoadError> {
    optional_u32(doc, node, name)?.ok_or_else(|| {
        error_at_node(
            MapErrorCode::MissingAttribute,
            format!(
                "missing required attribute '{name}' on <{}>",
                node.tag_name().name()
            ),
            doc,
            node,
        )
    })
}

fn optional_u32(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<u32>, MapLoadError> {
    let Some(raw) = node.attribute(name) else {
        return Ok(None);
    };
    raw.trim().parse::<u32>().map(Some).map_err(|_| {
        error_at_node(
            MapErrorCode::InvalidValue,
            format!(
                "attribute '{name}' on <{}> must be an unsigned integer, got '{raw}'",
                node.tag_name().name()
            ),
            doc,
            node,
        )
    })
}

fn error_at_node(
    code: MapErrorCode,
    message: String,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> MapLoadError {
    let pos = doc.text_pos_at(node.range().start);
    MapLoadError {
        code,
        message,
        file_path: None,
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::geometry::TileCoord;
    use crate::map::{is_passable, terrain_of, Terrain};

    const SMALL_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="isometric" width="3" height="2" tilewidth="128" tileheight="64">
  <tileset firstgid="1" name="floor" tilewidth="128" tileheight="64" columns="2">
    <image source="../assets/tavern floor.png" width="256" height="64"/>
    <tile id="0">
      <properties>
        <property name="terrain" value="stone" image="../assets/stone.png"/>
      </properties>
    </tile>
    <tile id="1">
      <properties>
        <property name="terrain" value="water"/>
        <property name="passable" value="false"/>
        <property name="note" value=""/>
      </properties>
    </tile>
  </tileset>
  <layer id="1" name="ground" width="3" height="2">
    <data encoding="csv">
1,1,2,
1,0,1
</data>
  </layer>
  <layer id="2" name="walls" width="3" height="2">
    <data encoding="csv">0,0,0,0,0</data>
  </layer>
</map>"#;

    fn fixture_map_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets")
            .join("maps")
            .join("tavern1.tmx")
    }

    #[test]
    fn parses_map_tilesets_and_csv_layers() {
        let map = parse_tmx(SMALL_MAP).expect("map");
        assert_eq!((map.width(), map.height()), (3, 2));
        assert_eq!((map.tile_width(), map.tile_height()), (128, 64));
        assert_eq!(map.orientation(), Some(&Orientation::Isometric));
        assert_eq!(map.layers().len(), 2);

        let ground = map.layer_by_name("ground").expect("ground");
        assert_eq!(ground.tile_at(TileCoord::new(2, 0)), Some(2));
        assert_eq!(ground.tile_at(TileCoord::new(1, 1)), Some(0));

        let tileset = &map.tilesets()[0];
        assert_eq!(tileset.image.as_deref(), Some("../assets/tavern floor.png"));
        assert_eq!(tileset.columns, 2);
        let stone = tileset.tile(0).expect("tile 0");
        assert_eq!(
            stone.property("terrain").and_then(|p| p.image.as_deref()),
            Some("../assets/stone.png")
        );
        assert!(tileset.tile(1).expect("tile 1").property("note").is_none());
    }

    #[test]
    fn short_layers_are_padded_with_empty_cells() {
        let map = parse_tmx(SMALL_MAP).expect("map");
        let walls = map.layer_by_name("walls").expect("walls");
        assert_eq!(walls.tile_at(TileCoord::new(2, 1)), Some(0));
    }

    #[test]
    fn parsed_tiles_feed_passability_and_terrain() {
        let map = parse_tmx(SMALL_MAP).expect("map");
        assert!(!is_passable(2, map.tilesets()));
        assert!(is_passable(1, map.tilesets()));
        assert!(!map.is_tile_passable(TileCoord::new(2, 0)));
        assert_eq!(terrain_of(1, map.tilesets()), Some(Terrain::Stone));
        assert_eq!(map.terrain_at(TileCoord::new(2, 0)), Some(Terrain::Water));
    }

    #[test]
    fn xml_tile_elements_are_accepted_without_encoding() {
        let raw = r#"<map width="2" height="1" tilewidth="64" tileheight="32">
            <layer id="1" name="ground"><data><tile gid="3"/><tile/></data></layer>
        </map>"#;
        let map = parse_tmx(raw).expect("map");
        let ground = map.layer_by_name("ground").expect("ground");
        assert_eq!(ground.tile_at(TileCoord::new(0, 0)), Some(3));
        assert_eq!(ground.tile_at(TileCoord::new(1, 0)), Some(0));
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = parse_tmx("<tileset/>").expect_err("err");
        assert_eq!(err.code, MapErrorCode::InvalidRoot);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = parse_tmx("<map width=\"1\"><layer></map>").expect_err("err");
        assert_eq!(err.code, MapErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn missing_and_zero_dimensions_fail_fast() {
        let err = parse_tmx(r#"<map width="2" height="2" tilewidth="64"/>"#).expect_err("err");
        assert_eq!(err.code, MapErrorCode::MissingAttribute);
        assert!(err.message.contains("tileheight"));

        let err = parse_tmx(r#"<map width="2" height="2" tilewidth="0" tileheight="32"/>"#)
            .expect_err("err");
        assert_eq!(err.code, MapErrorCode::InvalidValue);
    }

    #[test]
    fn oversized_maps_are_rejected_before_allocating() {
        let huge = r#"<map width="4294967295" height="4294967295" tilewidth="64" tileheight="32">
            <layer name="g"><data encoding="csv">1</data></layer></map>"#;
        let err = parse_tmx(huge).expect_err("err");
        assert_eq!(err.code, MapErrorCode::TooManyCells);
        assert!(err.location.is_some());

        let huge_layer = r#"<map width="2" height="1" tilewidth="64" tileheight="32">
            <layer name="g" width="100000" height="100000"><data encoding="csv">1</data></layer></map>"#;
        let err = parse_tmx(huge_layer).expect_err("err");
        assert_eq!(err.code, MapErrorCode::TooManyCells);
        assert!(err.message.contains("'g'"));
    }

    #[test]
    fn bad_csv_cell_and_overflow_are_errors() {
        let bad = r#"<map width="2" height="1" tilewidth="64" tileheight="32">
            <layer name="g"><data encoding="csv">1,x</data></layer></map>"#;
        assert_eq!(
            parse_tmx(bad).expect_err("err").code,
            MapErrorCode::InvalidValue
        );

        let overflow = r#"<map width="2" height="1" tilewidth="64" tileheight="32">
            <layer name="g"><data encoding="csv">1,1,1</data></layer></map>"#;
        assert_eq!(
            parse_tmx(overflow).expect_err("err").code,
            MapErrorCode::TooManyCells
        );
    }

    #[test]
    fn base64_layers_are_unsupported() {
        let raw = r#"<map width="1" height="1" tilewidth="64" tileheight="32">
            <layer name="g"><data encoding="base64">AQAAAA==</data></layer></map>"#;
        let err = parse_tmx(raw).expect_err("err");
        assert_eq!(err.code, MapErrorCode::UnsupportedEncoding);
        assert!(err.location.is_some());
    }

    #[test]
    fn zero_first_gid_is_rejected() {
        let raw = r#"<map width="1" height="1" tilewidth="64" tileheight="32">
            <tileset firstgid="0" name="bad"/></map>"#;
        assert_eq!(
            parse_tmx(raw).expect_err("err").code,
            MapErrorCode::InvalidValue
        );
    }

    #[test]
    fn external_tileset_is_loaded_relative_to_map_file() {
        let temp = TempDir::new().expect("temp");
        let maps = temp.path().join("maps");
        fs::create_dir_all(maps.join("tilesets")).expect("mkdir");
        fs::write(
            maps.join("tilesets").join("walls.tsx"),
            r#"<tileset name="walls" tilewidth="128" tileheight="64" columns="1">
                <tile id="0"><properties><property name="passable" value="0"/></properties></tile>
            </tileset>"#,
        )
        .expect("write tsx");
        let map_path = maps.join("room.tmx");
        fs::write(
            &map_path,
            r#"<map orientation="isometric" width="2" height="1" tilewidth="128" tileheight="64">
                <tileset firstgid="5" source="tilesets/walls.tsx"/>
                <layer id="1" name="walls"><data encoding="csv">5,0</data></layer>
            </map>"#,
        )
        .expect("write tmx");

        let map = load_tmx_file(&map_path).expect("map");
        let tileset = &map.tilesets()[0];
        assert_eq!(tileset.first_gid, 5);
        assert_eq!(tileset.name, "walls");
        assert_eq!(tileset.source.as_deref(), Some("tilesets/walls.tsx"));
        assert!(!map.is_tile_passable(TileCoord::new(0, 0)));
        assert!(map.is_tile_passable(TileCoord::new(1, 0)));
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("nope.tmx");
        let err = load_tmx_file(&path).expect_err("err");
        assert_eq!(err.code, MapErrorCode::ReadFile);
        assert_eq!(err.file_path.as_deref(), Some(path.as_path()));
        assert!(err.to_string().contains("nope.tmx"));
    }

    #[test]
    fn demo_map_fixture_loads() {
        let map = load_tmx_file(&fixture_map_path()).expect("demo map");
        assert_eq!((map.width(), map.height()), (20, 20));
        assert_eq!(map.orientation(), Some(&Orientation::Isometric));
        let top = map.top_layer().expect("top layer");
        assert!(top.cells().all(|(_, gid)| gid != 0));
        assert!(!map.is_tile_passable(TileCoord::new(0, 0)));
        assert!(map.is_tile_passable(TileCoord::new(10, 10)));
    }
}
