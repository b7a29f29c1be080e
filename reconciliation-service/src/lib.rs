pub mod api;
pub mod cache;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod sinks;
pub mod snapshot;
pub mod sources;
pub mod transform;

pub use cache::RoomCache;
pub use pipeline::{Envelope, Pipeline};
pub use snapshot::StoreSnapshot;
