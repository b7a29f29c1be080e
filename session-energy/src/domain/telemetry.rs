use serde::Serialize;

use crate::timestamp::DomainTimestamp;

/// One power-meter reading, normalized from the decimal strings of the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub current: f64,
    pub voltage: f64,
    pub power_watts: f64,
    pub frequency_hz: f64,
    pub power_factor: f64,
    pub energy_kwh: f64,
    pub calculated_energy_kwh: Option<f64>,
    /// `None` when the raw value did not decode; such a sample is never
    /// used for temporal reasoning.
    pub timestamp: Option<DomainTimestamp>,
    pub raw_timestamp: String,
    pub session_duration_hours: Option<f64>,
}

impl TelemetrySample {
    /// Energy reported by the prototype rig: the calculated figure when the
    /// meter provided one, the raw register otherwise.
    pub fn prototype_kwh(&self) -> f64 {
        let kwh = self.calculated_energy_kwh.unwrap_or(self.energy_kwh);
        if kwh.is_finite() && kwh > 0.0 {
            kwh
        } else {
            0.0
        }
    }
}

/// Decode a decimal telemetry value; malformed or non-finite input becomes `0.0`.
pub fn parse_decimal(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
