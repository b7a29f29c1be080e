pub mod instructor;
pub mod lifecycle;
pub mod schedule;
pub mod telemetry;
pub mod usage;

pub use instructor::{HistoricalSession, Instructor, SessionRecord, CLASS_ENDED, UNKNOWN_INSTRUCTOR};
pub use lifecycle::{LifecycleAction, LifecycleEvent, LifecycleStatus};
pub use schedule::{RoomRef, ScheduleSlot};
pub use telemetry::{parse_decimal, TelemetrySample};
pub use usage::{DeviceBreakdown, UsageRecord};
