//! Wire protocol message definitions
//! These are the JSON shapes exchanged with duel clients

use serde::{Deserialize, Serialize};

use crate::game::{Direction, Intent};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Step one tile and face `direction`
    Move { direction: Direction },

    /// Fire along the current facing
    Attack,

    /// Any other action name; accepted on the wire and ignored
    #[serde(other)]
    Unknown,
}

impl ClientMsg {
    pub fn into_intent(self) -> Option<Intent> {
        match self {
            ClientMsg::Move { direction } => Some(Intent::Move(direction)),
            ClientMsg::Attack => Some(Intent::Attack),
            ClientMsg::Unknown => None,
        }
    }
}

/// Decode one frame of client input.
///
/// A frame may carry several newline separated messages. Lines that fail to
/// parse come back as `Err` so the caller can log and move on.
pub fn decode_frame(frame: &str) -> impl Iterator<Item = Result<ClientMsg, serde_json::Error>> + '_ {
    frame
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str::<ClientMsg>)
}

/// Full arena state, sent once per tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub arena_width: i32,
    pub arena_height: i32,
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Empty until the match is decided
    pub message: String,
}

/// Participant state in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub hp: i32,
    pub x: i32,
    pub y: i32,
    /// Display glyph
    #[serde(rename = "char")]
    pub glyph: char,
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub x: i32,
    pub y: i32,
    pub dir_x: i32,
    pub dir_y: i32,
    /// Name of the participant who fired it
    pub owner: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_known_actions() {
        let msg: ClientMsg = serde_json::from_str(r#"{"action":"move","direction":"left"}"#).unwrap();
        assert_eq!(msg.into_intent(), Some(Intent::Move(Direction::Left)));

        let msg: ClientMsg = serde_json::from_str(r#"{"action":"attack"}"#).unwrap();
        assert_eq!(msg.into_intent(), Some(Intent::Attack));
    }

    #[test]
    fn tolerates_extra_fields() {
        // Terminal clients send an empty direction alongside attacks
        let msg: ClientMsg =
            serde_json::from_str(r#"{"action":"attack","direction":""}"#).unwrap();
        assert_eq!(msg, ClientMsg::Attack);
    }

    #[test]
    fn unknown_action_is_ignored() {
        let msg: ClientMsg = serde_json::from_str(r#"{"action":"dance"}"#).unwrap();
        assert_eq!(msg, ClientMsg::Unknown);
        assert_eq!(msg.into_intent(), None);
    }

    #[test]
    fn bad_direction_is_an_error() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"action":"move","direction":"north"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>(r#"{"action":"move"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn frame_splits_lines() {
        let frame = "{\"action\":\"move\",\"direction\":\"up\"}\n\n garbage \n{\"action\":\"attack\"}\n";
        let decoded: Vec<_> = decode_frame(frame).collect();
        assert_eq!(decoded.len(), 3);
        assert_eq!(
            decoded[0].as_ref().unwrap(),
            &ClientMsg::Move {
                direction: Direction::Up
            }
        );
        assert!(decoded[1].is_err());
        assert_eq!(decoded[2].as_ref().unwrap(), &ClientMsg::Attack);
    }

    #[test]
    fn snapshot_wire_shape() {
        let snapshot = Snapshot {
            arena_width: 20,
            arena_height: 10,
            players: vec![PlayerSnapshot {
                name: "Player1".to_string(),
                hp: 3,
                x: 0,
                y: 5,
                glyph: '@',
            }],
            projectiles: vec![ProjectileSnapshot {
                x: 1,
                y: 5,
                dir_x: 1,
                dir_y: 0,
                owner: "Player1".to_string(),
            }],
            message: String::new(),
        };

        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "arena_width": 20,
                "arena_height": 10,
                "players": [{"name": "Player1", "hp": 3, "x": 0, "y": 5, "char": "@"}],
                "projectiles": [{"x": 1, "y": 5, "dir_x": 1, "dir_y": 0, "owner": "Player1"}],
                "message": ""
            })
        );
    }
}
