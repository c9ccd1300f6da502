use super::iso::{MapBounds, TileCoord};
use crate::actions::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Neighbour search order used by [`find_adjacent_tile`].
    pub const PRIORITY: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// First in-bounds orthogonal neighbour of `target` in N, E, S, W order.
///
/// Passability is not consulted. `None` only when no neighbour is on the map.
pub fn find_adjacent_tile(target: TileCoord, bounds: MapBounds) -> Option<TileCoord> {
    Direction::PRIORITY.iter().find_map(|direction| {
        let (dx, dy) = direction.delta();
        bounds.checked_tile(i64::from(target.x) + dx, i64::from(target.y) + dy)
    })
}

/// Where an attacker should stand to strike `target`, and whether it has to move first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackApproach {
    pub target: TileCoord,
    pub stand_at: TileCoord,
    pub move_to: Option<TileCoord>,
}

impl AttackApproach {
    pub fn into_actions(self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(2);
        if let Some(tile) = self.move_to {
            actions.push(Action::Move { target: tile });
        }
        actions.push(Action::Attack {
            target: self.target,
        });
        actions
    }
}

pub fn plan_attack(attacker: TileCoord, target: TileCoord, bounds: MapBounds) -> AttackApproach {
    if attacker.is_orthogonally_adjacent(target) {
        return AttackApproach {
            target,
            stand_at: attacker,
            move_to: None,
        };
    }
    match find_adjacent_tile(target, bounds) {
        Some(tile) => AttackApproach {
            target,
            stand_at: tile,
            move_to: Some(tile),
        },
        // No neighbour on the map: strike from where the attacker already is.
        None => AttackApproach {
            target,
            stand_at: attacker,
            move_to: None,
        },
    }
}
