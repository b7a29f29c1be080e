use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const UNKNOWN_BUILDING: &str = "Unknown Building";
pub const UNKNOWN_FLOOR: &str = "Unknown Floor";

/// Static description of a room, used only to enrich reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub name: String,
    #[serde(default = "unknown_building")]
    pub building: String,
    #[serde(default = "unknown_floor")]
    pub floor: String,
}

fn unknown_building() -> String {
    UNKNOWN_BUILDING.to_string()
}

fn unknown_floor() -> String {
    UNKNOWN_FLOOR.to_string()
}

impl RoomMetadata {
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            building: unknown_building(),
            floor: unknown_floor(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, RoomMetadata>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with the same name replace earlier ones.
    pub fn insert(&mut self, room: RoomMetadata) {
        self.rooms.insert(room.name.clone(), room);
    }

    pub fn lookup(&self, name: &str) -> RoomMetadata {
        self.rooms
            .get(name)
            .cloned()
            .unwrap_or_else(|| RoomMetadata::placeholder(name))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl FromIterator<RoomMetadata> for RoomDirectory {
    fn from_iter<I: IntoIterator<Item = RoomMetadata>>(iter: I) -> Self {
        let mut dir = RoomDirectory::new();
        for room in iter {
            dir.insert(room);
        }
        dir
    }
}
