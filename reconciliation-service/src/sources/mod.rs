pub mod http_snapshot;
pub mod room_metadata;
pub mod snapshot_file;

pub use http_snapshot::HttpSnapshotSource;
pub use room_metadata::load_room_directory;
pub use snapshot_file::SnapshotFileSource;
