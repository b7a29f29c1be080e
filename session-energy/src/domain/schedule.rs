use serde::Serialize;

use super::telemetry::TelemetrySample;

/// The room a class is held in, with the latest reading captured for it.
///
/// The feed stores this either as a bare room name or as an object carrying
/// the reading; both shapes are folded into this struct at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomRef {
    pub name: String,
    pub sample: Option<TelemetrySample>,
}

impl RoomRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sample: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub section: String,
    pub subject: String,
    pub subject_code: String,
    pub room: RoomRef,
}

impl ScheduleSlot {
    pub fn is_in_room(&self, room: &str) -> bool {
        self.room.name == room
    }

    /// Short label such as `Mon 13:00-14:30`.
    pub fn label(&self) -> String {
        format!("{} {}-{}", self.day, self.start_time, self.end_time)
    }
}
