use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::TileCoord;

/// What a player intends to do this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Move { target: TileCoord },
    Attack { target: TileCoord },
    Consume { item_id: String },
    Custom { custom_action: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Attack,
    Consume,
    Custom,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::Consume => "consume",
            ActionKind::Custom => "custom",
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Consume { .. } => ActionKind::Consume,
            Action::Custom { .. } => ActionKind::Custom,
        }
    }

    /// Tile the action points at, for move and attack.
    pub fn target_tile(&self) -> Option<TileCoord> {
        match self {
            Action::Move { target } | Action::Attack { target } => Some(*target),
            Action::Consume { .. } | Action::Custom { .. } => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { target } => write!(f, "moves to ({}, {})", target.x, target.y),
            Action::Attack { target } => write!(f, "attacks ({}, {})", target.x, target.y),
            Action::Consume { item_id } => write!(f, "uses {item_id}"),
            Action::Custom { custom_action } => f.write_str(custom_action),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wire_form_is_tagged_by_type() {
        let action = Action::Attack {
            target: TileCoord::new(3, 4),
        };
        assert_eq!(
            serde_json::to_value(&action).expect("encode"),
            json!({ "type": "attack", "target": { "x": 3, "y": 4 } })
        );

        let decoded: Action =
            serde_json::from_value(json!({ "type": "consume", "item_id": "potion_health" }))
                .expect("decode");
        assert_eq!(
            decoded,
            Action::Consume {
                item_id: "potion_health".to_string()
            }
        );
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let result = serde_json::from_value::<Action>(json!({ "type": "teleport" }));
        assert!(result.is_err());
    }

    #[test]
    fn display_reads_as_a_log_line() {
        assert_eq!(
            Action::Move {
                target: TileCoord::new(6, 5)
            }
            .to_string(),
            "moves to (6, 5)"
        );
        assert_eq!(
            Action::Custom {
                custom_action: "searches the bar".to_string()
            }
            .to_string(),
            "searches the bar"
        );
        assert_eq!(
            Action::Consume {
                item_id: "3".to_string()
            }
            .kind()
            .as_str(),
            "consume"
        );
    }

    #[test]
    fn only_move_and_attack_point_at_a_tile() {
        let tile = TileCoord::new(12, 11);
        assert_eq!(Action::Move { target: tile }.target_tile(), Some(tile));
        assert_eq!(Action::Attack { target: tile }.target_tile(), Some(tile));
        assert_eq!(
            Action::Consume {
                item_id: "potion".to_string()
            }
            .target_tile(),
            None
        );
        assert_eq!(
            Action::Custom {
                custom_action: "waves".to_string()
            }
            .target_tile(),
            None
        );
    }
}
