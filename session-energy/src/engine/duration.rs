use serde::{Deserialize, Serialize};

use crate::{domain::Instructor, timestamp::DomainTimestamp};

/// Elapsed session time. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDuration {
    pub hours: u32,
    pub minutes: u32,
    pub total_hours: f64,
}

impl SessionDuration {
    pub const ZERO: SessionDuration = SessionDuration {
        hours: 0,
        minutes: 0,
        total_hours: 0.0,
    };

    /// Non-positive spans collapse to [`SessionDuration::ZERO`].
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds <= 0 {
            return Self::ZERO;
        }
        let hours = (seconds / 3600).min(u32::MAX as i64) as u32;
        let minutes = ((seconds % 3600) / 60) as u32;
        Self {
            hours,
            minutes,
            total_hours: seconds as f64 / 3600.0,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::from_seconds(i64::from(minutes) * 60)
    }

    fn between(start: DomainTimestamp, end: DomainTimestamp) -> Option<Self> {
        let seconds = end.since(&start).whole_seconds();
        (seconds > 0).then(|| Self::from_seconds(seconds))
    }
}

/// How session length is inferred. Each strategy is explicit; they are not blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationStrategy {
    /// Badge-in to the last captured meter reading for the room.
    #[default]
    SampleTimestamp,
    /// Granted `Access` to completed `EndSession`, then the sample strategy,
    /// then the configured fallback duration.
    LogPair,
}

/// Evidence behind a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entryId", rename_all = "snake_case")]
pub enum DurationSource {
    HistoricalSample(String),
    LiveSample,
    LogPair,
    Fallback,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationEstimate {
    pub strategy: DurationStrategy,
    pub source: DurationSource,
    pub duration: SessionDuration,
}

/// Time from `access` to the newest reading captured after it in `room`.
///
/// Ended sessions are searched newest first; the live session is the
/// fallback. Without a reading strictly after `access` the result is zero.
pub fn estimate(instructor: &Instructor, access: DomainTimestamp, room: &str) -> SessionDuration {
    sample_span(instructor, access, room)
        .map(|(duration, _)| duration)
        .unwrap_or(SessionDuration::ZERO)
}

fn sample_span(instructor: &Instructor, access: DomainTimestamp, room: &str) -> Option<(SessionDuration, DurationSource)> {
    let historical = instructor.ended_sessions_in_room(room).into_iter().find_map(|entry| {
        let sampled_at = entry.record.sample()?.timestamp?;
        if sampled_at <= access {
            return None;
        }
        SessionDuration::between(access, sampled_at)
            .map(|d| (d, DurationSource::HistoricalSample(entry.entry_id.clone())))
    });
    if historical.is_some() {
        return historical;
    }

    let sampled_at = instructor.live.as_ref()?.sample_in_room(room)?.timestamp?;
    if sampled_at <= access {
        return None;
    }
    SessionDuration::between(access, sampled_at).map(|d| (d, DurationSource::LiveSample))
}

/// Pair the latest granted badge-in with the first completed end-of-session
/// logged after it. Access logs carry no room, so none is applied.
pub fn log_pair_span(instructor: &Instructor) -> Option<SessionDuration> {
    let access = instructor.latest_granted_access()?;
    let ended = instructor
        .access_logs
        .iter()
        .filter(|e| e.is_completed_end())
        .filter_map(|e| e.timestamp)
        .filter(|t| *t > access)
        .min()?;
    SessionDuration::between(access, ended)
}

/// Run the configured strategy and report which evidence was used.
pub fn estimate_with(
    strategy: DurationStrategy,
    instructor: &Instructor,
    access: Option<DomainTimestamp>,
    room: &str,
    fallback: SessionDuration,
) -> DurationEstimate {
    let from_samples = || access.and_then(|a| sample_span(instructor, a, room));

    let (duration, source) = match strategy {
        DurationStrategy::SampleTimestamp => {
            from_samples().unwrap_or((SessionDuration::ZERO, DurationSource::Unavailable))
        }
        DurationStrategy::LogPair => log_pair_span(instructor)
            .map(|d| (d, DurationSource::LogPair))
            .or_else(from_samples)
            .unwrap_or((fallback, DurationSource::Fallback)),
    };

    DurationEstimate {
        strategy,
        source,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{LifecycleAction, LifecycleStatus},
        engine::testing::{ended_session, event, instructor_with, live_session, sample_at, ts},
    };

    #[test]
    fn ninety_minutes_from_historical_sample() {
        let inst = instructor_with(
            "t1",
            None,
            vec![ended_session("h1", "2024_03_10_143000", "705", Some(sample_at("2024_03_10_143000", "0.5")))],
        );

        let d = estimate(&inst, ts("2024_03_10_130000"), "705");
        assert_eq!(
            d,
            SessionDuration {
                hours: 1,
                minutes: 30,
                total_hours: 1.5
            }
        );
    }

    #[test]
    fn newest_qualifying_history_entry_wins() {
        let inst = instructor_with(
            "t1",
            None,
            vec![
                ended_session("old", "2024_03_10_140000", "705", Some(sample_at("2024_03_10_140000", "0.5"))),
                ended_session("new", "2024_03_10_150000", "705", Some(sample_at("2024_03_10_150000", "0.5"))),
            ],
        );

        let est = estimate_with(
            DurationStrategy::SampleTimestamp,
            &inst,
            Some(ts("2024_03_10_130000")),
            "705",
            SessionDuration::ZERO,
        );
        assert_eq!(est.source, DurationSource::HistoricalSample("new".into()));
        assert_eq!(est.duration.total_hours, 2.0);
    }

    #[test]
    fn skips_readings_not_after_access_and_falls_back_to_live() {
        let inst = instructor_with(
            "t1",
            Some(live_session("2024_03_10_130000", "705", Some(sample_at("2024_03_10_134500", "0.1")))),
            vec![ended_session("h1", "2024_03_10_120000", "705", Some(sample_at("2024_03_10_120000", "0.5")))],
        );

        let est = estimate_with(
            DurationStrategy::SampleTimestamp,
            &inst,
            Some(ts("2024_03_10_130000")),
            "705",
            SessionDuration::ZERO,
        );
        assert_eq!(est.source, DurationSource::LiveSample);
        assert_eq!(est.duration.minutes, 45);
        assert_eq!(est.duration.hours, 0);
    }

    #[test]
    fn no_positive_delta_yields_zero() {
        let inst = instructor_with(
            "t1",
            Some(live_session("2024_03_10_130000", "705", Some(sample_at("2024_03_10_130000", "0.1")))),
            vec![],
        );

        assert_eq!(estimate(&inst, ts("2024_03_10_130000"), "705"), SessionDuration::ZERO);
        assert_eq!(estimate(&inst, ts("2024_03_10_130000"), "999"), SessionDuration::ZERO);
    }

    #[test]
    fn log_pair_takes_precedence_when_selected() {
        let mut inst = instructor_with(
            "t1",
            None,
            vec![ended_session("h1", "2024_03_10_143000", "705", Some(sample_at("2024_03_10_143000", "0.5")))],
        );
        inst.access_logs = vec![
            event(LifecycleAction::EndSession, LifecycleStatus::Completed, "2024_03_10_120000"),
            event(LifecycleAction::Access, LifecycleStatus::Granted, "2024_03_10_130000"),
            event(LifecycleAction::EndSession, LifecycleStatus::Completed, "2024_03_10_141500"),
            event(LifecycleAction::EndSession, LifecycleStatus::Completed, "2024_03_10_160000"),
        ];

        let est = estimate_with(
            DurationStrategy::LogPair,
            &inst,
            inst.latest_granted_access(),
            "705",
            SessionDuration::from_minutes(60),
        );
        assert_eq!(est.source, DurationSource::LogPair);
        assert_eq!(est.duration.hours, 1);
        assert_eq!(est.duration.minutes, 15);

        // The sample strategy ignores the logs entirely.
        let est = estimate_with(
            DurationStrategy::SampleTimestamp,
            &inst,
            inst.latest_granted_access(),
            "705",
            SessionDuration::ZERO,
        );
        assert_eq!(est.source, DurationSource::HistoricalSample("h1".into()));
    }

    #[test]
    fn log_pair_falls_back_to_samples_then_default() {
        let mut inst = instructor_with(
            "t1",
            None,
            vec![ended_session("h1", "2024_03_10_143000", "705", Some(sample_at("2024_03_10_143000", "0.5")))],
        );
        inst.access_logs = vec![event(LifecycleAction::Access, LifecycleStatus::Granted, "2024_03_10_130000")];

        let est = estimate_with(
            DurationStrategy::LogPair,
            &inst,
            inst.latest_granted_access(),
            "705",
            SessionDuration::from_minutes(60),
        );
        assert_eq!(est.source, DurationSource::HistoricalSample("h1".into()));

        let est = estimate_with(
            DurationStrategy::LogPair,
            &inst,
            inst.latest_granted_access(),
            "other-room",
            SessionDuration::from_minutes(60),
        );
        assert_eq!(est.source, DurationSource::Fallback);
        assert_eq!(est.duration.total_hours, 1.0);
    }

    #[test]
    fn sample_strategy_without_access_is_unavailable() {
        let inst = instructor_with("t1", None, vec![]);
        let est = estimate_with(DurationStrategy::SampleTimestamp, &inst, None, "705", SessionDuration::ZERO);
        assert_eq!(est.source, DurationSource::Unavailable);
        assert_eq!(est.duration, SessionDuration::ZERO);
    }
}
