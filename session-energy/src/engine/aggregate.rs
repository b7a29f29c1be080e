use super::consumption::{DeviceAllocation, EqualSplit};
use crate::{
    domain::{Instructor, SessionRecord, UsageRecord},
    timestamp::DomainTimestamp,
};

/// Parameters for one historical usage table.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub room: String,
    pub center: DomainTimestamp,
    /// Half-width of the window around `center`; negative or NaN means zero.
    pub window_hours: f64,
    /// Case-insensitive substring over instructor, subject, subject code and section.
    pub text: String,
}

impl RecordQuery {
    pub fn new(room: impl Into<String>, center: DomainTimestamp, window_hours: f64) -> Self {
        Self {
            room: room.into(),
            center,
            window_hours,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Inclusive time window; an unrepresentable bound is left open.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: Option<DomainTimestamp>,
    end: Option<DomainTimestamp>,
}

impl Window {
    fn around(center: DomainTimestamp, hours: f64) -> Self {
        let hours = if hours.is_finite() && hours > 0.0 { hours } else { 0.0 };
        // Whole seconds only, rounded down so the window never widens.
        let seconds = (hours * 3600.0).floor().min(i64::MAX as f64) as i64;
        let span = time::Duration::seconds(seconds);
        Self {
            start: center.checked_sub(span),
            end: center.checked_add(span),
        }
    }

    fn contains(&self, ts: DomainTimestamp) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Build the usage table for a room, using the equal device split.
pub fn aggregate(instructors: &[Instructor], query: &RecordQuery, scale_factor: f64) -> Vec<UsageRecord> {
    aggregate_with(instructors, query, scale_factor, &EqualSplit)
}

/// Every instructor contributes its ended sessions in the room whose reading
/// falls inside the window; an instructor with none contributes its live
/// session instead. Records come back oldest first. Inputs are not modified.
pub fn aggregate_with(
    instructors: &[Instructor],
    query: &RecordQuery,
    scale_factor: f64,
    allocation: &dyn DeviceAllocation,
) -> Vec<UsageRecord> {
    let window = Window::around(query.center, query.window_hours);
    let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 0.0 };
    let needle = query.text.trim().to_lowercase();

    let mut records = Vec::new();
    for instructor in instructors {
        let before = records.len();
        for entry in instructor.ended_sessions_in_room(&query.room) {
            let id = format!("{}/{}", instructor.id, entry.entry_id);
            if let Some(record) = project(instructor, &entry.record, id, &query.room, window, scale, allocation) {
                records.push(record);
            }
        }

        if records.len() == before {
            if let Some(live) = &instructor.live {
                let id = format!("{}/live", instructor.id);
                if let Some(record) = project(instructor, live, id, &query.room, window, scale, allocation) {
                    records.push(record);
                }
            }
        }
    }

    records.retain(|r| matches_text(r, &needle));
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    records
}

fn project(
    instructor: &Instructor,
    session: &SessionRecord,
    id: String,
    room: &str,
    window: Window,
    scale: f64,
    allocation: &dyn DeviceAllocation,
) -> Option<UsageRecord> {
    let sample = session.sample_in_room(room)?;
    let timestamp = sample.timestamp?;
    if !window.contains(timestamp) {
        return None;
    }

    let consumption_kwh = sample.prototype_kwh() * scale;
    Some(UsageRecord {
        id,
        room: room.to_string(),
        timestamp,
        power_watts: sample.power_watts,
        consumption_kwh,
        device_breakdown: allocation.allocate(consumption_kwh),
        instructor_name: instructor.name.clone(),
        subject: session.schedule.subject.clone(),
        subject_code: session.schedule.subject_code.clone(),
        schedule: session.schedule.clone(),
    })
}

fn matches_text(record: &UsageRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        record.instructor_name.as_str(),
        record.subject.as_str(),
        record.subject_code.as_str(),
        record.schedule.section.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{ended_session, instructor_with, live_session, sample_at, ts};
    use proptest::prelude::*;

    fn fixture() -> Vec<Instructor> {
        let mut a = instructor_with(
            "a",
            Some(live_session("2024_03_10_150000", "705", Some(sample_at("2024_03_10_151000", "0.10")))),
            vec![
                ended_session("h1", "2024_03_10_090000", "705", Some(sample_at("2024_03_10_090000", "0.20"))),
                ended_session("h2", "2024_03_10_120000", "705", Some(sample_at("2024_03_10_120000", "0.50"))),
                ended_session("h3", "2024_03_09_120000", "705", Some(sample_at("2024_03_09_120000", "0.70"))),
                ended_session("h4", "2024_03_10_110000", "706", Some(sample_at("2024_03_10_110000", "0.90"))),
            ],
        );
        a.name = "Ana Cruz".into();

        let mut b = instructor_with(
            "b",
            Some(live_session("2024_03_10_100000", "705", Some(sample_at("2024_03_10_103000", "0.30")))),
            vec![],
        );
        b.name = "Ben Reyes".into();
        if let Some(live) = b.live.as_mut() {
            live.schedule.subject = "Networking".into();
            live.schedule.subject_code = "IT301".into();
            live.schedule.section = "BSIT-4B".into();
        }

        vec![a, b]
    }

    #[test]
    fn window_room_and_precedence() {
        let query = RecordQuery::new("705", ts("2024_03_10_120000"), 4.0);
        let records = aggregate(&fixture(), &query, 20.0);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        // a's live session is shadowed by its ended ones; b only has a live one.
        assert_eq!(ids, vec!["a/h1", "b/live", "a/h2"]);
        assert!((records[2].consumption_kwh - 10.0).abs() < 1e-9);
        assert!((records[2].device_breakdown.total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn text_filter_is_case_insensitive() {
        let query = RecordQuery::new("705", ts("2024_03_10_120000"), 4.0).with_text("  bsit-4b ");
        let records = aggregate(&fixture(), &query, 20.0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instructor_name, "Ben Reyes");

        let query = RecordQuery::new("705", ts("2024_03_10_120000"), 4.0).with_text("ANA");
        assert_eq!(aggregate(&fixture(), &query, 20.0).len(), 2);
    }

    #[test]
    fn live_session_used_when_no_ended_session_in_window() {
        let query = RecordQuery::new("705", ts("2024_03_10_151000"), 0.5);
        let ids: Vec<String> = aggregate(&fixture(), &query, 20.0).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a/live"]);
    }

    #[test]
    fn zero_window_is_inclusive_and_input_untouched() {
        let instructors = fixture();
        let before = instructors.clone();
        let query = RecordQuery::new("705", ts("2024_03_10_120000"), 0.0);
        let first = aggregate(&instructors, &query, 20.0);
        let second = aggregate(&instructors, &query, 20.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(instructors, before);
    }

    #[test]
    fn fractional_window_never_widens() {
        let inst = instructor_with(
            "t1",
            None,
            vec![
                ended_session("h1", "2024_03_10_120231", "705", Some(sample_at("2024_03_10_120231", "0.20"))),
                ended_session("h2", "2024_03_10_120230", "705", Some(sample_at("2024_03_10_120230", "0.20"))),
            ],
        );
        // 150.516 s: the reading 151 s out is past the bound, the one at 150 s is not.
        let query = RecordQuery::new("705", ts("2024_03_10_120000"), 0.04181);
        let ids: Vec<String> = aggregate(&[inst], &query, 20.0).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["t1/h2"]);
    }

    proptest! {
        #[test]
        fn records_stay_inside_the_window(center_hour in 0u8..24, window in 0.0f64..30.0) {
            let center = ts(&format!("2024_03_10_{center_hour:02}0000"));
            let query = RecordQuery::new("705", center, window);
            for record in aggregate(&fixture(), &query, 20.0) {
                let offset = record.timestamp.since(&center).whole_seconds().abs() as f64;
                prop_assert!(offset <= window * 3600.0);
            }
        }

        #[test]
        fn second_resolution_windows_stay_inside(offset in 0i64..600, window_secs in 0.0f64..600.0) {
            let center = ts("2024_03_10_120000");
            let at = center.checked_add(time::Duration::seconds(offset)).unwrap().format();
            let inst = instructor_with("t1", None, vec![ended_session("h1", &at, "705", Some(sample_at(&at, "0.20")))]);
            let window = window_secs / 3600.0;
            let records = aggregate(&[inst], &RecordQuery::new("705", center, window), 20.0);
            prop_assert_eq!(records.len() == 1, (offset as f64) <= window * 3600.0);
        }
    }
}
