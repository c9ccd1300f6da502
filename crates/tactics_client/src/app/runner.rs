use tactics_core::{
    demo_roster, plan_attack, Action, ActionDispatcher, ActionLog, ActionLogEntry, ActionReceipt,
    Actor, ActorId, ActorRoster, CharacterProfile, IsoTransform, LightField, LightSource,
    LogEntryKind, MapData, TileCoord,
};
use tracing::{info, warn};

use super::cli::Command;
use super::ClientError;

const PLAYER_ID: &str = "player1";
const NARRATOR: &str = "DM";

/// One player's view of a loaded map: the actors on it, its lighting, and the log of
/// everything that has been resolved so far.
pub(crate) struct Session<D> {
    map: MapData,
    iso: IsoTransform,
    roster: ActorRoster,
    lights: LightField,
    log: ActionLog,
    dispatcher: D,
    player: ActorId,
}

impl<D: ActionDispatcher> Session<D> {
    pub(crate) fn new(
        map: MapData,
        profile: Option<&CharacterProfile>,
        lights: Vec<LightSource>,
        dispatcher: D,
    ) -> Result<Self, ClientError> {
        let iso = map.iso_transform()?;
        let mut roster = demo_roster(map.bounds())?;
        let player = ActorId::new(PLAYER_ID);

        if let Some(profile) = profile {
            let mut actor = roster
                .remove(&player)
                .ok_or_else(|| ClientError::MissingPlayer(PLAYER_ID.to_string()))?;
            actor.name = profile.name.clone();
            actor.sprite_key = profile.character.clone();
            roster.add(actor)?;
        }

        let mut log = ActionLog::new();
        if let Some(actor) = roster.get(&player) {
            log.push(
                LogEntryKind::System,
                NARRATOR,
                format!("{} enters the tavern.", actor.name),
            );
        }

        Ok(Self {
            map,
            iso,
            roster,
            lights: LightField::new(lights),
            log,
            dispatcher,
            player,
        })
    }

    pub(crate) fn log(&self) -> &ActionLog {
        &self.log
    }

    pub(crate) fn player(&self) -> Result<&Actor, ClientError> {
        self.roster
            .get(&self.player)
            .ok_or_else(|| ClientError::MissingPlayer(self.player.to_string()))
    }

    pub(crate) async fn execute(&mut self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::Help | Command::CreateCharacter { .. } => Ok(()),
            Command::InspectMap => self.inspect_map(),
            Command::Move(target) => self.move_player(target).await,
            Command::Attack(target) => self.attack(target).await,
            Command::Consume { item_id } => {
                self.submit(Action::Consume { item_id }).await.map(drop)
            }
            Command::Custom { text } => self
                .submit(Action::Custom {
                    custom_action: text,
                })
                .await
                .map(drop),
        }
    }

    /// Moves are refused up front when the destination is off the map or blocked.
    pub(crate) async fn move_player(&mut self, target: TileCoord) -> Result<(), ClientError> {
        self.check_on_map(target)?;
        if !self.map.is_tile_passable(target) {
            return Err(ClientError::Blocked(target));
        }
        self.submit(Action::Move { target }).await.map(drop)
    }

    pub(crate) async fn attack(&mut self, target: TileCoord) -> Result<(), ClientError> {
        self.check_on_map(target)?;
        let attacker = self.player()?.tile;
        let approach = plan_attack(attacker, target, self.map.bounds());
        if let Some(stand_at) = approach.move_to {
            if !self.map.is_tile_passable(stand_at) {
                warn!(x = stand_at.x, y = stand_at.y, "attack_approach_blocked");
            }
        }
        if let Some(defender) = self.roster.at_tile(target) {
            let line = format!("{} is targeted.", defender.name);
            self.log.push(LogEntryKind::Dm, NARRATOR, line);
        }

        for action in approach.into_actions() {
            self.submit(action).await?;
        }
        Ok(())
    }

    fn check_on_map(&self, tile: TileCoord) -> Result<(), ClientError> {
        let bounds = self.map.bounds();
        if bounds.contains(tile) {
            Ok(())
        } else {
            Err(ClientError::OffMap { tile, bounds })
        }
    }

    async fn submit(&mut self, action: Action) -> Result<ActionReceipt, ClientError> {
        let receipt = self
            .dispatcher
            .submit(&self.player, action)
            .await
            .map_err(|err| ClientError::Dispatch(Box::new(err)))?;

        if let Action::Move { target } = receipt.action {
            self.roster.move_to(&receipt.actor, target)?;
        }
        self.log.record_receipt(&receipt);
        info!(
            sequence = receipt.sequence,
            actor = %receipt.actor,
            kind = receipt.action.kind().as_str(),
            latency_ms = receipt.latency().as_millis() as u64,
            "action_applied"
        );
        Ok(receipt)
    }

    fn inspect_map(&mut self) -> Result<(), ClientError> {
        let bounds = self.map.bounds();
        let lines = {
            let player = self.player()?;
            let world = self.iso.to_world(player.tile);
            let mut lines = vec![format!(
                "map {}x{} tiles of {}x{}, {} layer(s), {} tileset(s)",
                bounds.width,
                bounds.height,
                self.map.tile_width(),
                self.map.tile_height(),
                self.map.layers().len(),
                self.map.tilesets().len(),
            )];
            lines.push(format!(
                "{} stands on ({}, {}) at world ({:.1}, {:.1}) in {:.2} light",
                player.name,
                player.tile.x,
                player.tile.y,
                world.x,
                world.y,
                self.lights.intensity(player.tile),
            ));
            if let Some(terrain) = self.map.terrain_at(player.tile) {
                lines.push(format!("the ground here is {terrain:?}"));
            }
            if let Some(layer) = self.map.top_layer() {
                let overlay = self.lights.overlay(layer);
                lines.push(format!(
                    "{} of {} tiles are brightly lit",
                    overlay.bright_tile_count,
                    overlay.shades.len()
                ));
            }
            for actor in self.roster.iter().filter(|actor| actor.id != self.player) {
                lines.push(format!(
                    "{} ({:?}) at ({}, {})",
                    actor.name, actor.kind, actor.tile.x, actor.tile.y
                ));
            }
            lines
        };

        for line in lines {
            self.log.push(LogEntryKind::System, NARRATOR, line);
        }
        Ok(())
    }
}

pub(crate) fn print_log(log: &ActionLog, json: bool) -> Result<(), ClientError> {
    if json {
        let encoded = serde_json::to_string_pretty(log.entries()).map_err(ClientError::Encode)?;
        println!("{encoded}");
    } else {
        for entry in log.entries() {
            println!("{}", format_entry(entry));
        }
    }
    Ok(())
}

fn format_entry(entry: &ActionLogEntry) -> String {
    match entry.kind {
        LogEntryKind::Player => format!("[{}] {} {}", entry.id, entry.author, entry.message),
        LogEntryKind::Dm | LogEntryKind::Roll | LogEntryKind::System => {
            format!("[{}] {}: {}", entry.id, entry.author, entry.message)
        }
    }
}
