use std::io;

use serde::Serialize;
use session_energy::domain::UsageRecord;

/// Flat CSV row for one usage record.
#[derive(Serialize)]
struct UsageRow<'a> {
    id: &'a str,
    room: &'a str,
    timestamp: String,
    display_time: String,
    power_watts: f64,
    consumption_kwh: f64,
    lighting_kwh: f64,
    projection_kwh: f64,
    computers_kwh: f64,
    hvac_kwh: f64,
    instructor: &'a str,
    subject: &'a str,
    subject_code: &'a str,
    section: &'a str,
    schedule: String,
}

impl<'a> From<&'a UsageRecord> for UsageRow<'a> {
    fn from(r: &'a UsageRecord) -> Self {
        UsageRow {
            id: &r.id,
            room: &r.room,
            timestamp: r.timestamp.format(),
            display_time: r.timestamp.display_12h(),
            power_watts: r.power_watts,
            consumption_kwh: r.consumption_kwh,
            lighting_kwh: r.device_breakdown.lighting,
            projection_kwh: r.device_breakdown.projection,
            computers_kwh: r.device_breakdown.computers,
            hvac_kwh: r.device_breakdown.hvac,
            instructor: &r.instructor_name,
            subject: &r.subject,
            subject_code: &r.subject_code,
            section: &r.schedule.section,
            schedule: r.schedule.label(),
        }
    }
}

pub fn write_usage_csv<W: io::Write>(records: &[UsageRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(UsageRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}
