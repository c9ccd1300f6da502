use std::path::PathBuf;

use tactics_core::{CharacterClass, LightSource, Race, TileCoord};

#[derive(Debug, Clone, Default)]
pub(crate) struct CliOptions {
    pub(crate) map: Option<PathBuf>,
    pub(crate) profile: Option<PathBuf>,
    pub(crate) delay_ms: Option<u64>,
    pub(crate) lights: Vec<LightSource>,
    pub(crate) json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Help,
    CreateCharacter {
        name: String,
        class: CharacterClass,
        race: Race,
    },
    InspectMap,
    Move(TileCoord),
    Attack(TileCoord),
    Consume { item_id: String },
    Custom { text: String },
}

pub(crate) fn parse_args(args: &[String]) -> Result<(CliOptions, Command), String> {
    if args.is_empty() {
        return Err("missing subcommand".to_string());
    }

    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok((options, Command::Help)),
            "--map" => {
                options.map = Some(PathBuf::from(flag_value(args, index, "--map")?));
                index += 2;
            }
            "--profile" => {
                options.profile = Some(PathBuf::from(flag_value(args, index, "--profile")?));
                index += 2;
            }
            "--delay-ms" => {
                let value = flag_value(args, index, "--delay-ms")?;
                options.delay_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --delay-ms value '{value}' (expected u64)"))?,
                );
                index += 2;
            }
            "--light" => {
                let value = flag_value(args, index, "--light")?;
                options.lights.push(parse_light(value)?);
                index += 2;
            }
            "--json" => {
                options.json = true;
                index += 1;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let command = match command {
        "create-character" => {
            let [name, class, race] = command_args else {
                return Err("create-character requires <name> <class> <race>".to_string());
            };
            Command::CreateCharacter {
                name: name.clone(),
                class: class.parse().map_err(|error| format!("{error}"))?,
                race: race.parse().map_err(|error| format!("{error}"))?,
            }
        }
        "inspect-map" => {
            if !command_args.is_empty() {
                return Err("inspect-map takes no arguments".to_string());
            }
            Command::InspectMap
        }
        "move" => Command::Move(parse_tile_args("move", command_args)?),
        "attack" => Command::Attack(parse_tile_args("attack", command_args)?),
        "consume" => {
            let [item_id] = command_args else {
                return Err("consume requires exactly one <item-id>".to_string());
            };
            Command::Consume {
                item_id: item_id.clone(),
            }
        }
        "custom" => {
            let text = command_args.join(" ");
            if text.trim().is_empty() {
                return Err("custom requires an action description".to_string());
            }
            Command::Custom { text }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    Ok((options, command))
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, String> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn parse_tile_args(command: &str, args: &[String]) -> Result<TileCoord, String> {
    let [x, y] = args else {
        return Err(format!("{command} requires <x> <y>"));
    };
    let parse = |raw: &str| {
        raw.parse::<u32>()
            .map_err(|_| format!("invalid tile coordinate '{raw}' (expected u32)"))
    };
    Ok(TileCoord::new(parse(x)?, parse(y)?))
}

/// `x,y,radius` or `x,y,radius,hard_radius`.
fn parse_light(raw: &str) -> Result<LightSource, String> {
    let parts = raw.split(',').map(str::trim).collect::<Vec<_>>();
    let invalid = || format!("invalid --light value '{raw}' (expected x,y,radius[,hard])");
    let (x, y, radius, hard) = match parts.as_slice() {
        [x, y, radius] => (x, y, radius, None),
        [x, y, radius, hard] => (x, y, radius, Some(hard)),
        _ => return Err(invalid()),
    };
    let tile = TileCoord::new(
        x.parse().map_err(|_| invalid())?,
        y.parse().map_err(|_| invalid())?,
    );
    let radius = radius.parse::<f32>().map_err(|_| invalid())?;
    let light = match hard {
        Some(hard) => {
            let hard = hard.parse::<f32>().map_err(|_| invalid())?;
            LightSource::with_hard_radius(tile, radius, hard)
        }
        None => LightSource::new(tile, radius),
    };
    light.map_err(|error| format!("invalid --light value '{raw}': {error}"))
}

pub(crate) fn usage_text() -> String {
    [
        "tactics_client - headless isometric tactics client",
        "",
        "Usage:",
        "  tactics_client [options] create-character <name> <class> <race>",
        "  tactics_client [options] inspect-map",
        "  tactics_client [options] move <x> <y>",
        "  tactics_client [options] attack <x> <y>",
        "  tactics_client [options] consume <item-id>",
        "  tactics_client [options] custom <text...>",
        "",
        "Options:",
        "  --map <path>                 TMX map (default assets/maps/tavern1.tmx, env ISOTAC_MAP)",
        "  --profile <path>             character blob (default cache/character_data.json)",
        "  --delay-ms <u64>             dispatch latency (default 500, env ISOTAC_ACTION_DELAY_MS)",
        "  --light <x,y,radius[,hard]>  light source, repeatable (default 2,5,2)",
        "  --json                       print the action log as JSON",
        "",
        "Classes: Warrior Mage Rogue Cleric Ranger Paladin",
        "Races:   Human Elf Dwarf Halfling Dragonborn Tiefling",
    ]
    .join("\n")
}
