use serde::Serialize;

use super::{lifecycle::LifecycleEvent, schedule::ScheduleSlot, telemetry::TelemetrySample};
use crate::timestamp::DomainTimestamp;

pub const CLASS_ENDED: &str = "Class Ended";
pub const UNKNOWN_INSTRUCTOR: &str = "Unknown";

/// A class occurrence as stored under an instructor, either the current
/// `ClassStatus` slot or one `ClassHistory` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub status: String,
    pub occurred_at_raw: String,
    /// `occurred_at_raw` decoded with the domain codec (or RFC 3339 as a
    /// fallback); `None` sorts after every dated session.
    pub occurred_at: Option<DomainTimestamp>,
    pub schedule: ScheduleSlot,
}

impl SessionRecord {
    pub fn is_class_ended(&self) -> bool {
        self.status.trim() == CLASS_ENDED
    }

    pub fn sample(&self) -> Option<&TelemetrySample> {
        self.schedule.room.sample.as_ref()
    }

    pub fn sample_in_room(&self, room: &str) -> Option<&TelemetrySample> {
        if self.schedule.is_in_room(room) {
            self.sample()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSession {
    pub entry_id: String,
    pub record: SessionRecord,
}

/// One instructor subtree, treated as an atomic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instructor {
    pub id: String,
    pub name: String,
    pub live: Option<SessionRecord>,
    /// In store key order.
    pub history: Vec<HistoricalSession>,
    pub access_logs: Vec<LifecycleEvent>,
}

impl Instructor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            live: None,
            history: Vec::new(),
            access_logs: Vec::new(),
        }
    }

    /// "Class Ended" history entries for `room`, newest `occurred_at` first.
    ///
    /// The sort is stable, so entries that tie keep store order.
    pub fn ended_sessions_in_room<'a>(&'a self, room: &str) -> Vec<&'a HistoricalSession> {
        let mut ended: Vec<&HistoricalSession> = self
            .history
            .iter()
            .filter(|h| h.record.is_class_ended() && h.record.schedule.is_in_room(room))
            .collect();
        ended.sort_by(|a, b| b.record.occurred_at.cmp(&a.record.occurred_at));
        ended
    }

    /// Most recent granted badge-in.
    pub fn latest_granted_access(&self) -> Option<DomainTimestamp> {
        self.access_logs
            .iter()
            .filter(|e| e.is_granted_access())
            .filter_map(|e| e.timestamp)
            .max()
    }
}
