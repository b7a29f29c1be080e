use anyhow::{bail, Context, Result};
use reconciliation_service::{config, observability, snapshot::StoreSnapshot, sources::load_room_directory};
use serde_json::{Map, Value};
use session_energy::{engine::rooms_in, Engine, RoomDirectory};
use std::{env, fs, path::Path};

/// One-shot reconciliation of a recorded snapshot.
///
/// Prints `{room: report | null}` as JSON; `null` means no data for the room.
/// Set `ROOM_METADATA` to a CSV/JSON file to enrich reports.
fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: reconcile_snapshot <snapshot.json> [room...]");
    }

    let bytes = fs::read(&args[1]).with_context(|| format!("failed to read {}", args[1]))?;
    let snapshot = StoreSnapshot::from_slice(&bytes)?;
    let engine = Engine::new(config::engine_config()?);

    let directory = match env::var("ROOM_METADATA") {
        Ok(path) => load_room_directory(Path::new(&path))?,
        Err(_) => RoomDirectory::new(),
    };

    let rooms = if args.len() > 2 {
        args[2..].to_vec()
    } else {
        rooms_in(&snapshot.instructors)
    };

    let mut out = Map::new();
    for room in rooms {
        let report = engine.room_report(&snapshot.instructors, &room, &directory);
        if report.is_none() {
            tracing::warn!(room = %room, "no data for room");
        }
        out.insert(room, serde_json::to_value(report)?);
    }

    serde_json::to_writer_pretty(std::io::stdout().lock(), &Value::Object(out))?;
    println!();
    Ok(())
}
