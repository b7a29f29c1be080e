use std::{fs::File, path::Path};

use session_energy::{RoomDirectory, RoomMetadata};

use crate::pipeline::PipelineError;

/// Load static room metadata from a CSV file (`name,building,floor` header)
/// or, for a `.json` path, a JSON array of the same objects.
///
/// Rows without a name are skipped.
pub fn load_room_directory(path: &Path) -> Result<RoomDirectory, PipelineError> {
    let file = File::open(path)
        .map_err(|e| PipelineError::Source(format!("failed to open room metadata {}: {e}", path.display())))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let rooms: Vec<RoomMetadata> = if is_json {
        serde_json::from_reader(file)
            .map_err(|e| PipelineError::Source(format!("invalid room metadata json: {e}")))?
    } else {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let mut rooms = Vec::new();
        for (idx, row) in rdr.deserialize::<RoomMetadata>().enumerate() {
            match row {
                Ok(room) => rooms.push(room),
                Err(e) => {
                    metrics::counter!("room_metadata_parse_errors_total").increment(1);
                    tracing::warn!(row = idx + 1, error = %e, "skipping room metadata row");
                }
            }
        }
        rooms
    };

    let directory: RoomDirectory = rooms.into_iter().filter(|r| !r.name.is_empty()).collect();
    tracing::info!(rooms = directory.len(), path = %path.display(), "loaded room metadata");
    Ok(directory)
}
