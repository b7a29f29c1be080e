pub mod domain;
pub mod engine;
pub mod room;
pub mod snapshot;
pub mod timestamp;

pub use engine::{Engine, EngineConfig, RoomReport};
pub use room::{RoomDirectory, RoomMetadata};
pub use snapshot::{instructors_from_value, parse_snapshot, SnapshotError};
pub use timestamp::{DomainTimestamp, TimestampError};
