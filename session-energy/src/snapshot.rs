//! Ingestion boundary for `Instructors/{instructorId}` subtrees.
//!
//! The store's records are loosely shaped: numbers arrive as strings or
//! numbers, a schedule's room is sometimes a bare name and sometimes an
//! object carrying the meter reading, and any branch may be missing. All of
//! that is resolved here so the engine only ever sees normalized structs.

use serde::Deserialize;
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

use crate::{
    domain::{
        parse_decimal, HistoricalSession, Instructor, LifecycleAction, LifecycleEvent, LifecycleStatus,
        RoomRef, ScheduleSlot, SessionRecord, TelemetrySample, UNKNOWN_INSTRUCTOR,
    },
    timestamp::DomainTimestamp,
};

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot root must be an object of instructors, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawDecimal {
    fn value(&self) -> f64 {
        match self {
            RawDecimal::Number(v) if v.is_finite() => *v,
            RawDecimal::Number(_) => 0.0,
            RawDecimal::Text(s) => parse_decimal(s),
            RawDecimal::Other(_) => 0.0,
        }
    }
}

fn decimal(raw: &Option<RawDecimal>) -> f64 {
    raw.as_ref().map(RawDecimal::value).unwrap_or(0.0)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSample {
    current: Option<RawDecimal>,
    voltage: Option<RawDecimal>,
    #[serde(alias = "powerWatts")]
    power: Option<RawDecimal>,
    #[serde(alias = "frequencyHz")]
    frequency: Option<RawDecimal>,
    power_factor: Option<RawDecimal>,
    #[serde(alias = "energyKWh")]
    energy: Option<RawDecimal>,
    #[serde(alias = "calculatedEnergyKWh")]
    calculated_energy: Option<RawDecimal>,
    timestamp: Option<String>,
    #[serde(alias = "sessionDurationHours")]
    session_duration: Option<RawDecimal>,
}

impl From<RawSample> for TelemetrySample {
    fn from(r: RawSample) -> Self {
        let raw_timestamp = r.timestamp.unwrap_or_default();
        TelemetrySample {
            current: decimal(&r.current),
            voltage: decimal(&r.voltage),
            power_watts: decimal(&r.power),
            frequency_hz: decimal(&r.frequency),
            power_factor: decimal(&r.power_factor),
            energy_kwh: decimal(&r.energy),
            calculated_energy_kwh: r.calculated_energy.as_ref().map(RawDecimal::value),
            timestamp: DomainTimestamp::parse_lenient(&raw_timestamp),
            raw_timestamp,
            session_duration_hours: r.session_duration.as_ref().map(RawDecimal::value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoom {
    Name(String),
    Detailed {
        #[serde(default)]
        name: String,
        #[serde(default, alias = "sample")]
        pzem: Option<RawSample>,
    },
}

impl From<RawRoom> for RoomRef {
    fn from(r: RawRoom) -> Self {
        match r {
            RawRoom::Name(name) => RoomRef::named(name.trim()),
            RawRoom::Detailed { name, pzem } => RoomRef {
                name: name.trim().to_string(),
                sample: pzem.map(TelemetrySample::from),
            },
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSchedule {
    day: String,
    start_time: String,
    end_time: String,
    section: String,
    subject: String,
    subject_code: String,
    #[serde(alias = "room")]
    room_name: Option<RawRoom>,
}

impl From<RawSchedule> for ScheduleSlot {
    fn from(r: RawSchedule) -> Self {
        ScheduleSlot {
            day: r.day,
            start_time: r.start_time,
            end_time: r.end_time,
            section: r.section,
            subject: r.subject,
            subject_code: r.subject_code,
            room: r.room_name.map(RoomRef::from).unwrap_or_else(|| RoomRef::named("")),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSession {
    #[serde(rename = "Status", alias = "status")]
    status: String,
    #[serde(rename = "dateTime", alias = "occurredAt")]
    date_time: String,
    schedule: Option<RawSchedule>,
}

impl RawSession {
    fn into_record(self) -> Option<SessionRecord> {
        let schedule = self.schedule?;
        Some(SessionRecord {
            status: self.status,
            occurred_at: occurred_at(&self.date_time),
            occurred_at_raw: self.date_time,
            schedule: schedule.into(),
        })
    }
}

/// `dateTime` on session records is usually the domain encoding, but some
/// writers store RFC 3339. Offsets are dropped to keep one naive local form.
fn occurred_at(raw: &str) -> Option<DomainTimestamp> {
    if let Ok(ts) = DomainTimestamp::parse(raw) {
        return Some(ts);
    }
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .ok()
        .map(|dt| DomainTimestamp::new(PrimitiveDateTime::new(dt.date(), dt.time())))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawAccessLog {
    action: String,
    status: String,
    timestamp: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawProfile {
    #[serde(rename = "fullName", alias = "name")]
    full_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawInstructor {
    #[serde(rename = "Profile")]
    profile: Option<Value>,
    #[serde(rename = "ClassStatus")]
    class_status: Option<Value>,
    #[serde(rename = "ClassHistory")]
    class_history: Option<Map<String, Value>>,
    #[serde(rename = "AccessLogs")]
    access_logs: Option<Map<String, Value>>,
}

/// Parse a snapshot from raw JSON bytes.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Vec<Instructor>, SnapshotError> {
    let root: Value = serde_json::from_slice(bytes)?;
    instructors_from_value(root)
}

/// Normalize an already-decoded snapshot.
///
/// Accepts either `{"Instructors": {...}}` or the bare instructor map.
/// Instructors and history entries that do not decode are skipped.
pub fn instructors_from_value(root: Value) -> Result<Vec<Instructor>, SnapshotError> {
    let mut root = match root {
        Value::Object(map) => map,
        other => return Err(SnapshotError::NotAnObject(json_kind(&other))),
    };

    let instructors = match root.remove("Instructors") {
        Some(Value::Object(map)) => map,
        Some(Value::Null) => Map::new(),
        Some(other) => return Err(SnapshotError::NotAnObject(json_kind(&other))),
        None => root,
    };

    let mut out = Vec::with_capacity(instructors.len());
    for (id, value) in instructors {
        match serde_json::from_value::<RawInstructor>(value) {
            Ok(raw) => out.push(normalize_instructor(id, raw)),
            Err(e) => {
                tracing::warn!(instructor_id = %id, error = %e, "skipping malformed instructor subtree");
            }
        }
    }
    Ok(out)
}

fn normalize_instructor(id: String, raw: RawInstructor) -> Instructor {
    let profile = raw.profile.and_then(|value| match serde_json::from_value::<RawProfile>(value) {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(instructor_id = %id, error = %e, "ignoring malformed profile");
            None
        }
    });
    let name = profile
        .and_then(|p| p.full_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_INSTRUCTOR.to_string());

    let mut instructor = Instructor::new(id, name);
    instructor.live = match raw.class_status {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<RawSession>(value) {
            Ok(session) => session.into_record(),
            Err(e) => {
                tracing::warn!(instructor_id = %instructor.id, error = %e, "skipping malformed class status");
                None
            }
        },
    };

    for (entry_id, value) in raw.class_history.unwrap_or_default() {
        let record = serde_json::from_value::<RawSession>(value)
            .map_err(|e| e.to_string())
            .and_then(|s| s.into_record().ok_or_else(|| "missing schedule".to_string()));
        match record {
            Ok(record) => instructor.history.push(HistoricalSession { entry_id, record }),
            Err(e) => {
                tracing::warn!(
                    instructor_id = %instructor.id,
                    entry_id = %entry_id,
                    error = %e,
                    "skipping malformed class history entry"
                );
            }
        }
    }

    for (log_id, value) in raw.access_logs.unwrap_or_default() {
        match serde_json::from_value::<RawAccessLog>(value) {
            Ok(log) => instructor.access_logs.push(LifecycleEvent {
                log_id,
                action: LifecycleAction::from_wire(&log.action),
                status: LifecycleStatus::from_wire(&log.status),
                timestamp: DomainTimestamp::parse_lenient(&log.timestamp),
            }),
            Err(e) => {
                tracing::warn!(instructor_id = %instructor.id, log_id = %log_id, error = %e, "skipping malformed access log");
            }
        }
    }

    instructor
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
