use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::geometry::{IsoTransform, MapBounds, TileCoord, Vec2};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Enemy,
    Npc,
}

/// Something standing on the map. The tile is authoritative; world positions are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
    pub sprite_key: String,
    pub tile: TileCoord,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("actor '{0}' is already on the map")]
    DuplicateActor(ActorId),
    #[error("actor '{0}' not found")]
    UnknownActor(ActorId),
    #[error("tile ({}, {}) is outside the {}x{} map", tile.x, tile.y, bounds.width, bounds.height)]
    OutOfBounds { tile: TileCoord, bounds: MapBounds },
}

/// Actors on one map, kept in insertion order.
#[derive(Debug, Clone)]
pub struct ActorRoster {
    bounds: MapBounds,
    actors: Vec<Actor>,
}

impl ActorRoster {
    pub fn new(bounds: MapBounds) -> Self {
        Self {
            bounds,
            actors: Vec::new(),
        }
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    pub fn add(&mut self, actor: Actor) -> Result<(), RosterError> {
        if self.get(&actor.id).is_some() {
            return Err(RosterError::DuplicateActor(actor.id));
        }
        self.check_bounds(actor.tile)?;
        debug!(actor = %actor.id, x = actor.tile.x, y = actor.tile.y, "actor_added");
        self.actors.push(actor);
        Ok(())
    }

    pub fn remove(&mut self, id: &ActorId) -> Option<Actor> {
        let index = self.actors.iter().position(|actor| &actor.id == id)?;
        Some(self.actors.remove(index))
    }

    pub fn get(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| &actor.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn at_tile(&self, tile: TileCoord) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.tile == tile)
    }

    pub fn move_to(&mut self, id: &ActorId, tile: TileCoord) -> Result<(), RosterError> {
        self.check_bounds(tile)?;
        let actor = self
            .actors
            .iter_mut()
            .find(|actor| &actor.id == id)
            .ok_or_else(|| RosterError::UnknownActor(id.clone()))?;
        actor.tile = tile;
        Ok(())
    }

    pub fn world_position(&self, id: &ActorId, iso: &IsoTransform) -> Option<Vec2> {
        self.get(id).map(|actor| iso.to_world(actor.tile))
    }

    fn check_bounds(&self, tile: TileCoord) -> Result<(), RosterError> {
        if !self.bounds.contains(tile) {
            return Err(RosterError::OutOfBounds {
                tile,
                bounds: self.bounds,
            });
        }
        Ok(())
    }
}

/// The tavern's starting cast.
pub fn demo_roster(bounds: MapBounds) -> Result<ActorRoster, RosterError> {
    let mut roster = ActorRoster::new(bounds);
    for (id, name, kind, sprite_key, x, y) in [
        ("player1", "Knight", ActorKind::Player, "knight", 9, 6),
        ("player2", "Ranger", ActorKind::Player, "ranger", 7, 9),
        ("enemy1", "Goblin Druid", ActorKind::Enemy, "druid", 12, 12),
        ("npc1", "Dwarf Merchant", ActorKind::Npc, "dwarf", 10, 10),
    ] {
        roster.add(Actor {
            id: ActorId::new(id),
            name: name.to_string(),
            kind,
            sprite_key: sprite_key.to_string(),
            tile: TileCoord::new(x, y),
        })?;
    }
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin(tile: TileCoord) -> Actor {
        Actor {
            id: ActorId::new("goblin"),
            name: "Goblin".to_string(),
            kind: ActorKind::Enemy,
            sprite_key: "goblin".to_string(),
            tile,
        }
    }

    #[test]
    fn demo_roster_keeps_insertion_order() {
        let roster = demo_roster(MapBounds::new(20, 20)).expect("roster");
        let ids = roster.iter().map(|actor| actor.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["player1", "player2", "enemy1", "npc1"]);
        assert_eq!(
            roster.at_tile(TileCoord::new(12, 12)).map(|actor| actor.kind),
            Some(ActorKind::Enemy)
        );
    }

    #[test]
    fn demo_roster_does_not_fit_a_tiny_map() {
        let err = demo_roster(MapBounds::new(8, 8)).expect_err("err");
        assert!(matches!(err, RosterError::OutOfBounds { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut roster = ActorRoster::new(MapBounds::new(5, 5));
        roster.add(goblin(TileCoord::new(1, 1))).expect("first");
        let err = roster.add(goblin(TileCoord::new(2, 2))).expect_err("dup");
        assert_eq!(err, RosterError::DuplicateActor(ActorId::new("goblin")));
    }

    #[test]
    fn move_keeps_actors_on_the_map() {
        let mut roster = ActorRoster::new(MapBounds::new(5, 5));
        roster.add(goblin(TileCoord::new(1, 1))).expect("add");
        let id = ActorId::new("goblin");

        roster.move_to(&id, TileCoord::new(4, 0)).expect("move");
        assert_eq!(roster.get(&id).map(|actor| actor.tile), Some(TileCoord::new(4, 0)));

        let err = roster.move_to(&id, TileCoord::new(5, 0)).expect_err("oob");
        assert!(matches!(err, RosterError::OutOfBounds { .. }));
        assert_eq!(roster.get(&id).map(|actor| actor.tile), Some(TileCoord::new(4, 0)));

        let err = roster
            .move_to(&ActorId::new("ghost"), TileCoord::new(0, 0))
            .expect_err("unknown");
        assert_eq!(err, RosterError::UnknownActor(ActorId::new("ghost")));
    }

    #[test]
    fn world_position_follows_tile_changes() {
        let iso = IsoTransform::new(128.0, 64.0).expect("iso");
        let mut roster = ActorRoster::new(MapBounds::new(5, 5));
        roster.add(goblin(TileCoord::new(1, 0))).expect("add");
        let id = ActorId::new("goblin");
        assert_eq!(roster.world_position(&id, &iso), Some(Vec2 { x: 64.0, y: 32.0 }));

        roster.move_to(&id, TileCoord::new(0, 1)).expect("move");
        assert_eq!(roster.world_position(&id, &iso), Some(Vec2 { x: -64.0, y: 32.0 }));
    }

    #[test]
    fn remove_returns_the_actor() {
        let mut roster = ActorRoster::new(MapBounds::new(5, 5));
        roster.add(goblin(TileCoord::new(1, 1))).expect("add");
        let removed = roster.remove(&ActorId::new("goblin")).expect("removed");
        assert_eq!(removed.name, "Goblin");
        assert!(roster.is_empty());
        assert!(roster.remove(&ActorId::new("goblin")).is_none());
    }
}
