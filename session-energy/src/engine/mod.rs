//! Session energy reconciliation.
//!
//! Every operation here is a pure function of an instructor snapshot: the
//! caller hands in the materialized subtree and gets derived figures back.

pub mod aggregate;
pub mod consumption;
pub mod duration;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Instructor, UsageRecord},
    room::{RoomDirectory, RoomMetadata},
    timestamp::DomainTimestamp,
};

pub use aggregate::{aggregate, aggregate_with, RecordQuery};
pub use consumption::{compute, compute_with, Consumption, DeviceAllocation, EqualSplit, WeightedSplit};
pub use duration::{
    estimate, estimate_with, log_pair_span, DurationEstimate, DurationSource, DurationStrategy, SessionDuration,
};
pub use resolver::{resolve, Resolution, SessionSource};

pub const DEFAULT_TARIFF_PER_KWH: f64 = 14.0;
pub const DEFAULT_SCALE_FACTOR: f64 = 20.0;
pub const DEFAULT_FALLBACK_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tariff_per_kwh: f64,
    pub scale_factor: f64,
    pub duration_strategy: DurationStrategy,
    /// Used by [`DurationStrategy::LogPair`] when no evidence yields a span.
    pub fallback_duration_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tariff_per_kwh: DEFAULT_TARIFF_PER_KWH,
            scale_factor: DEFAULT_SCALE_FACTOR,
            duration_strategy: DurationStrategy::default(),
            fallback_duration_minutes: DEFAULT_FALLBACK_DURATION_MINUTES,
        }
    }
}

/// Everything known about a room after one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomReport {
    pub room: RoomMetadata,
    pub resolution: Resolution,
    pub access: Option<DomainTimestamp>,
    pub duration: DurationEstimate,
    pub consumption: Consumption,
    pub tariff_per_kwh: f64,
    pub scale_factor: f64,
}

/// Configuration plus device allocation, applied to successive snapshots.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    allocation: Arc<dyn DeviceAllocation>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            allocation: Arc::new(EqualSplit),
        }
    }

    pub fn with_allocation(mut self, allocation: Arc<dyn DeviceAllocation>) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolve(&self, instructors: &[Instructor], room: &str) -> Option<Resolution> {
        resolve(instructors, room)
    }

    pub fn estimate(&self, instructor: &Instructor, room: &str) -> DurationEstimate {
        estimate_with(
            self.config.duration_strategy,
            instructor,
            instructor.latest_granted_access(),
            room,
            SessionDuration::from_minutes(self.config.fallback_duration_minutes),
        )
    }

    pub fn compute(&self, resolution: &Resolution, duration: &SessionDuration) -> Consumption {
        compute_with(
            &resolution.sample,
            duration,
            self.config.tariff_per_kwh,
            self.config.scale_factor,
            self.allocation.as_ref(),
        )
    }

    pub fn aggregate(&self, instructors: &[Instructor], query: &RecordQuery) -> Vec<UsageRecord> {
        aggregate_with(instructors, query, self.config.scale_factor, self.allocation.as_ref())
    }

    /// Resolve, estimate and compute for one room. `None` means no data.
    pub fn room_report(&self, instructors: &[Instructor], room: &str, directory: &RoomDirectory) -> Option<RoomReport> {
        let resolution = self.resolve(instructors, room)?;
        let instructor = instructors.iter().find(|i| i.id == resolution.instructor_id)?;
        let access = instructor.latest_granted_access();
        let duration = self.estimate(instructor, room);
        let consumption = self.compute(&resolution, &duration.duration);

        Some(RoomReport {
            room: directory.lookup(room),
            resolution,
            access,
            duration,
            consumption,
            tariff_per_kwh: self.config.tariff_per_kwh,
            scale_factor: self.config.scale_factor,
        })
    }
}

/// Distinct room names referenced anywhere in the snapshot, first-seen order.
pub fn rooms_in(instructors: &[Instructor]) -> Vec<String> {
    let mut rooms: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !name.is_empty() && !rooms.iter().any(|r| r == name) {
            rooms.push(name.to_string());
        }
    };
    for instructor in instructors {
        if let Some(live) = &instructor.live {
            push(&live.schedule.room.name);
        }
        for entry in &instructor.history {
            push(&entry.record.schedule.room.name);
        }
    }
    rooms
}
