//! Registry payload types.
//!
//! Everything the registry returns is plain data (strings, numbers, small
//! records); the types here decode it at the boundary so no wire convention
//! leaks into command logic.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// `(character name, rounds played)` pairs from `GET /player/characters`.
pub type CharacterCounts = Vec<(String, u64)>;

/// Identity record from `GET /player/discord/?ckey=`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// One entry from the character-name autocomplete endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IcName {
    pub name: String,
    pub ckey: String,
}

/// One element of the `GET /server` array, tagged by the numeric
/// `server_status` discriminator: `1` carries live round fields, `0` carries
/// an error string.
#[derive(Debug, Clone)]
pub enum ServerStatus {
    Live(LiveStatus),
    Down(DownStatus),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveStatus {
    pub name: String,
    pub map: String,
    pub players: u64,
    pub gamestate: i64,
    pub round_id: u64,
    #[serde(default)]
    pub round_duration: u64,
    #[serde(default)]
    pub security_level: String,
    #[serde(default)]
    pub connection_info: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownStatus {
    pub name: String,
    pub err_str: String,
}

// serde's internally-tagged representation only supports string tags, so the
// numeric discriminator is dispatched by hand.
impl<'de> Deserialize<'de> for ServerStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let tag = value
            .get("server_status")
            .and_then(Value::as_u64)
            .ok_or_else(|| de::Error::missing_field("server_status"))?;

        match tag {
            1 => LiveStatus::deserialize(&value)
                .map(ServerStatus::Live)
                .map_err(de::Error::custom),
            0 => DownStatus::deserialize(&value)
                .map(ServerStatus::Down)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "unknown server_status discriminator: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn live_status_decodes() {
        let json = r#"[{
            "server_status": 1,
            "name": "Main",
            "map": "BoxStation",
            "players": 43,
            "gamestate": 3,
            "round_id": 1912,
            "round_duration": 5400,
            "security_level": "blue",
            "connection_info": "play.example.com:1337"
        }]"#;

        let servers: Vec<ServerStatus> = serde_json::from_str(json).unwrap();
        match &servers[0] {
            ServerStatus::Live(live) => {
                assert_eq!(live.players, 43);
                assert_eq!(live.map, "BoxStation");
            }
            other => panic!("expected live status, got {other:?}"),
        }
    }

    #[test]
    fn down_status_decodes() {
        let json = r#"[{"server_status": 0, "err_str": "down", "name": "X"}]"#;

        let servers: Vec<ServerStatus> = serde_json::from_str(json).unwrap();
        match &servers[0] {
            ServerStatus::Down(down) => assert_eq!(down.err_str, "down"),
            other => panic!("expected down status, got {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let json = r#"{"server_status": 7, "name": "X"}"#;
        assert!(serde_json::from_str::<ServerStatus>(json).is_err());
    }

    #[test]
    fn missing_discriminator_is_rejected() {
        let json = r#"{"name": "X", "err_str": "down"}"#;
        assert!(serde_json::from_str::<ServerStatus>(json).is_err());
    }

    #[test]
    fn character_counts_decode_as_pairs() {
        let json = r#"[["Janet Sharp", 12], ["Flat Earther", 3]]"#;
        let characters: CharacterCounts = serde_json::from_str(json).unwrap();
        assert_eq!(characters[0].0, "Janet Sharp");
        assert_eq!(characters[1].1, 3);
    }
}
