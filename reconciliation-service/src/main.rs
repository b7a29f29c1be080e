use std::sync::Arc;

use anyhow::Result;
use reconciliation_service::{
    api::{self, ApiState},
    cache::RoomCache,
    config::{AppConfig, SourceConfig},
    metrics_server, observability,
    pipeline::Pipeline,
    sinks::ReconciliationSink,
    snapshot::StoreSnapshot,
    sources::{load_room_directory, HttpSnapshotSource, SnapshotFileSource},
    transform,
};
use session_energy::{Engine, RoomDirectory};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let directory = match &cfg.rooms.metadata_path {
        Some(path) => load_room_directory(path)?,
        None => RoomDirectory::new(),
    };

    let engine = Engine::new(cfg.engine.clone());
    tracing::info!(
        tariff_per_kwh = cfg.engine.tariff_per_kwh,
        scale_factor = cfg.engine.scale_factor,
        duration_strategy = ?cfg.engine.duration_strategy,
        "reconciliation engine configured"
    );

    let cache = Arc::new(RoomCache::new());

    if let Some(api_cfg) = &cfg.api {
        api::serve(
            &api_cfg.bind_addr,
            ApiState {
                cache: cache.clone(),
                engine: engine.clone(),
                default_window_hours: api_cfg.default_window_hours,
            },
        )
        .await?;
    }

    let sink = ReconciliationSink::new(engine, Arc::new(directory), cfg.rooms.watch.clone(), cache);
    let debounce = cfg.debounce();

    match &cfg.source {
        SourceConfig::Http(http_cfg) => {
            let pipeline: Pipeline<_, StoreSnapshot, _> = Pipeline {
                source: HttpSnapshotSource::new(http_cfg).await?,
                transforms: vec![Arc::new(transform::SampleSanity)],
                debounce,
                sink,
            };
            pipeline.run().await?;
        }
        SourceConfig::File { path } => {
            let pipeline: Pipeline<_, StoreSnapshot, _> = Pipeline {
                source: SnapshotFileSource::new(path.clone()),
                transforms: vec![Arc::new(transform::SampleSanity)],
                debounce,
                sink,
            };
            pipeline.run().await?;
            tracing::info!(path = %path.display(), "snapshot replay finished");
        }
    }

    Ok(())
}
