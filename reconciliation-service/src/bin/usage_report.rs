use anyhow::{bail, Context, Result};
use reconciliation_service::{config, observability, report::write_usage_csv, snapshot::StoreSnapshot};
use session_energy::{engine::RecordQuery, DomainTimestamp, Engine};
use std::{env, fs};

/// Historical usage table for one room as CSV on stdout.
fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        bail!("usage: usage_report <snapshot.json> <room> <center YYYY_MM_DD_HHMMSS> <window_hours> [query]");
    }

    let bytes = fs::read(&args[1]).with_context(|| format!("failed to read {}", args[1]))?;
    let snapshot = StoreSnapshot::from_slice(&bytes)?;
    let center = DomainTimestamp::parse(&args[3]).with_context(|| format!("invalid center '{}'", args[3]))?;
    let window_hours: f64 = args[4]
        .parse()
        .with_context(|| format!("invalid window_hours '{}'", args[4]))?;

    let mut query = RecordQuery::new(args[2].clone(), center, window_hours);
    if let Some(text) = args.get(5) {
        query = query.with_text(text.clone());
    }

    let engine = Engine::new(config::engine_config()?);
    let records = engine.aggregate(&snapshot.instructors, &query);
    tracing::info!(room = %query.room, records = records.len(), "usage report built");

    write_usage_csv(&records, std::io::stdout().lock())?;
    Ok(())
}
