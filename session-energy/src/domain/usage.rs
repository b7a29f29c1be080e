use serde::Serialize;

use super::schedule::ScheduleSlot;
use crate::timestamp::DomainTimestamp;

/// Energy split across the four equipment categories of a classroom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeviceBreakdown {
    pub lighting: f64,
    pub projection: f64,
    pub computers: f64,
    pub hvac: f64,
}

impl DeviceBreakdown {
    pub fn total(&self) -> f64 {
        self.lighting + self.projection + self.computers + self.hvac
    }
}

/// A row of the historical usage table. Derived on every snapshot, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: String,
    pub room: String,
    pub timestamp: DomainTimestamp,
    pub power_watts: f64,
    pub consumption_kwh: f64,
    pub device_breakdown: DeviceBreakdown,
    pub instructor_name: String,
    pub subject: String,
    pub subject_code: String,
    pub schedule: ScheduleSlot,
}
