use serde::Serialize;

use crate::domain::{Instructor, ScheduleSlot, TelemetrySample};

/// Which stored session a resolved sample came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entryId", rename_all = "snake_case")]
pub enum SessionSource {
    /// A `ClassHistory` entry with status "Class Ended".
    Historical(String),
    /// The instructor's current `ClassStatus`.
    Live,
}

/// The single authoritative (sample, schedule, instructor) triple for a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub room: String,
    pub instructor_id: String,
    pub instructor_name: String,
    pub source: SessionSource,
    pub sample: TelemetrySample,
    pub schedule: ScheduleSlot,
}

/// Pick the authoritative reading for `room`.
///
/// Ended sessions always beat live ones, whatever their wall-clock order.
/// Among ended sessions the greatest `occurred_at` wins; ties and undated
/// entries fall back to store iteration order (instructors, then entries).
/// Returns `None` when no session in the room carries a reading.
pub fn resolve(instructors: &[Instructor], room: &str) -> Option<Resolution> {
    resolve_historical(instructors, room).or_else(|| resolve_live(instructors, room))
}

fn resolve_historical(instructors: &[Instructor], room: &str) -> Option<Resolution> {
    let mut best: Option<(&Instructor, &crate::domain::HistoricalSession)> = None;

    for instructor in instructors {
        for entry in instructor.ended_sessions_in_room(room) {
            if entry.record.sample().is_none() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, current)) => entry.record.occurred_at > current.record.occurred_at,
            };
            if better {
                best = Some((instructor, entry));
            }
        }
    }

    best.and_then(|(instructor, entry)| {
        let sample = entry.record.sample()?.clone();
        Some(Resolution {
            room: room.to_string(),
            instructor_id: instructor.id.clone(),
            instructor_name: instructor.name.clone(),
            source: SessionSource::Historical(entry.entry_id.clone()),
            sample,
            schedule: entry.record.schedule.clone(),
        })
    })
}

fn resolve_live(instructors: &[Instructor], room: &str) -> Option<Resolution> {
    instructors.iter().find_map(|instructor| {
        let live = instructor.live.as_ref()?;
        let sample = live.sample_in_room(room)?.clone();
        Some(Resolution {
            room: room.to_string(),
            instructor_id: instructor.id.clone(),
            instructor_name: instructor.name.clone(),
            source: SessionSource::Live,
            sample,
            schedule: live.schedule.clone(),
        })
    })
}
