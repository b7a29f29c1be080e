use serde::Serialize;

use super::duration::SessionDuration;
use crate::domain::{DeviceBreakdown, TelemetrySample};

/// Splits a room's energy across equipment categories.
pub trait DeviceAllocation: Send + Sync {
    fn allocate(&self, kwh: f64) -> DeviceBreakdown;
}

/// Placeholder allocation: four equal quarters. Nothing is measured per device.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualSplit;

impl DeviceAllocation for EqualSplit {
    fn allocate(&self, kwh: f64) -> DeviceBreakdown {
        let quarter = kwh / 4.0;
        DeviceBreakdown {
            lighting: quarter,
            projection: quarter,
            computers: quarter,
            hvac: quarter,
        }
    }
}

/// Fixed fractional weights per category, normalized by their sum.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSplit {
    pub lighting: f64,
    pub projection: f64,
    pub computers: f64,
    pub hvac: f64,
}

impl DeviceAllocation for WeightedSplit {
    fn allocate(&self, kwh: f64) -> DeviceBreakdown {
        let weights = [self.lighting, self.projection, self.computers, self.hvac].map(non_negative);
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            return EqualSplit.allocate(kwh);
        }
        DeviceBreakdown {
            lighting: kwh * weights[0] / sum,
            projection: kwh * weights[1] / sum,
            computers: kwh * weights[2] / sum,
            hvac: kwh * weights[3] / sum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub prototype_kwh: f64,
    pub actual_kwh: f64,
    pub prototype_cost: f64,
    pub actual_cost: f64,
    pub device_breakdown: DeviceBreakdown,
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Energy and cost for one resolved reading, using the equal split.
pub fn compute(sample: &TelemetrySample, duration: &SessionDuration, tariff_per_kwh: f64, scale_factor: f64) -> Consumption {
    compute_with(sample, duration, tariff_per_kwh, scale_factor, &EqualSplit)
}

/// Total over all inputs: malformed or negative figures count as zero.
pub fn compute_with(
    sample: &TelemetrySample,
    duration: &SessionDuration,
    tariff_per_kwh: f64,
    scale_factor: f64,
    allocation: &dyn DeviceAllocation,
) -> Consumption {
    let tariff = non_negative(tariff_per_kwh);
    let scale = non_negative(scale_factor);
    let hours = non_negative(duration.total_hours);

    let prototype_kwh = sample.prototype_kwh();
    let actual_kwh = prototype_kwh * scale;

    Consumption {
        prototype_kwh,
        actual_kwh,
        prototype_cost: prototype_kwh * tariff * hours,
        actual_cost: actual_kwh * tariff * hours,
        device_breakdown: allocation.allocate(actual_kwh),
    }
}
