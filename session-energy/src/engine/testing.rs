//! Fixture builders shared by the engine's unit tests.

use crate::{
    domain::{
        HistoricalSession, Instructor, LifecycleAction, LifecycleEvent, LifecycleStatus, RoomRef,
        ScheduleSlot, SessionRecord, TelemetrySample, CLASS_ENDED,
    },
    timestamp::DomainTimestamp,
};

pub fn ts(raw: &str) -> DomainTimestamp {
    DomainTimestamp::parse(raw).unwrap()
}

pub fn sample_at(timestamp: &str, energy_kwh: &str) -> TelemetrySample {
    TelemetrySample {
        current: 0.65,
        voltage: 230.0,
        power_watts: 150.0,
        frequency_hz: 60.0,
        power_factor: 0.98,
        energy_kwh: crate::domain::parse_decimal(energy_kwh),
        calculated_energy_kwh: None,
        timestamp: DomainTimestamp::parse_lenient(timestamp),
        raw_timestamp: timestamp.to_string(),
        session_duration_hours: None,
    }
}

pub fn slot(room: &str, sample: Option<TelemetrySample>) -> ScheduleSlot {
    ScheduleSlot {
        day: "Sun".into(),
        start_time: "13:00".into(),
        end_time: "14:30".into(),
        section: "BSIT-3A".into(),
        subject: "Data Structures".into(),
        subject_code: "IT213".into(),
        room: RoomRef {
            name: room.into(),
            sample,
        },
    }
}

pub fn ended_session(id: &str, occurred_at: &str, room: &str, sample: Option<TelemetrySample>) -> HistoricalSession {
    HistoricalSession {
        entry_id: id.into(),
        record: SessionRecord {
            status: CLASS_ENDED.into(),
            occurred_at_raw: occurred_at.into(),
            occurred_at: DomainTimestamp::parse_lenient(occurred_at),
            schedule: slot(room, sample),
        },
    }
}

pub fn live_session(occurred_at: &str, room: &str, sample: Option<TelemetrySample>) -> SessionRecord {
    SessionRecord {
        status: "Class In Session".into(),
        occurred_at_raw: occurred_at.into(),
        occurred_at: DomainTimestamp::parse_lenient(occurred_at),
        schedule: slot(room, sample),
    }
}

pub fn instructor_with(id: &str, live: Option<SessionRecord>, history: Vec<HistoricalSession>) -> Instructor {
    let mut inst = Instructor::new(id, format!("Instructor {id}"));
    inst.live = live;
    inst.history = history;
    inst
}

pub fn event(action: LifecycleAction, status: LifecycleStatus, at: &str) -> LifecycleEvent {
    LifecycleEvent {
        log_id: format!("log-{at}"),
        action,
        status,
        timestamp: DomainTimestamp::parse_lenient(at),
    }
}
