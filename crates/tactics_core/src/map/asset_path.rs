/// Resolves an asset path referenced from a map or tileset file into a served path.
///
/// `origin` is the referencing file (for example `/maps/tilesets/tavern.tsx`). Absolute
/// and `http` references pass through untouched. Anything that lands under `/assets`
/// is re-rooted under `/maps`, where the map assets are served from.
pub fn resolve_asset_path(origin: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.starts_with("http") {
        return relative.to_string();
    }

    let origin_dir = origin.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut parts = origin_dir
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    for part in relative.split('/') {
        match part {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }

    let resolved = format!("/{}", parts.join("/"));
    if resolved.starts_with("/assets") {
        format!("/maps{resolved}")
    } else {
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_and_remote_paths_pass_through() {
        assert_eq!(
            resolve_asset_path("/maps/tavern1.tmx", "/tiles/tile_086.png"),
            "/tiles/tile_086.png"
        );
        assert_eq!(
            resolve_asset_path("/maps/tavern1.tmx", "https://cdn.example/floor.png"),
            "https://cdn.example/floor.png"
        );
    }

    #[test]
    fn parent_segments_walk_up_from_origin_directory() {
        assert_eq!(
            resolve_asset_path("/maps/tilesets/tavern_tileset.tsx", "../props/barrel.png"),
            "/maps/props/barrel.png"
        );
        assert_eq!(
            resolve_asset_path("/maps/tavern1.tmx", "./tilesets/tavern_tileset.tsx"),
            "/maps/tilesets/tavern_tileset.tsx"
        );
    }

    #[test]
    fn assets_directory_is_rerooted_under_maps() {
        assert_eq!(
            resolve_asset_path("/maps/tilesets/tavern_tileset.tsx", "../../assets/tavern floor.png"),
            "/maps/assets/tavern floor.png"
        );
    }

    #[test]
    fn popping_past_root_stays_at_root() {
        assert_eq!(
            resolve_asset_path("/a.tmx", "../../x.png"),
            "/x.png"
        );
    }
}
