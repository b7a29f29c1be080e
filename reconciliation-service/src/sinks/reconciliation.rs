use std::{sync::Arc, time::Instant};

use futures::StreamExt;
use session_energy::{engine::rooms_in, Engine, RoomDirectory, RoomReport};

use crate::{
    cache::RoomCache,
    pipeline::{Envelope, PipelineError, Sink},
    snapshot::{SnapshotFingerprint, StoreSnapshot},
};

/// Result of reconciling one snapshot.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub resolved: Vec<String>,
    pub not_found: Vec<String>,
}

/// Runs the engine over each snapshot and publishes per-room reports.
pub struct ReconciliationSink {
    engine: Engine,
    directory: Arc<RoomDirectory>,
    watch: Vec<String>,
    cache: Arc<RoomCache>,
}

impl ReconciliationSink {
    pub fn new(engine: Engine, directory: Arc<RoomDirectory>, watch: Vec<String>, cache: Arc<RoomCache>) -> Self {
        Self {
            engine,
            directory,
            watch,
            cache,
        }
    }

    /// One full recomputation. Nothing is published for a room without data.
    pub fn reconcile(&self, snapshot: &StoreSnapshot) -> PassSummary {
        let rooms = if self.watch.is_empty() {
            rooms_in(&snapshot.instructors)
        } else {
            self.watch.clone()
        };

        let mut summary = PassSummary::default();
        for room in rooms {
            match self.engine.room_report(&snapshot.instructors, &room, &self.directory) {
                Some(report) => {
                    record_report_metrics(&report);
                    self.cache.publish(report);
                    metrics::counter!("room_resolutions_total", "outcome" => "resolved").increment(1);
                    summary.resolved.push(room);
                }
                None => {
                    metrics::counter!("room_resolutions_total", "outcome" => "not_found").increment(1);
                    tracing::debug!(room = %room, "no resolvable session for room");
                    summary.not_found.push(room);
                }
            }
        }
        summary
    }
}

fn record_report_metrics(report: &RoomReport) {
    let room = report.resolution.room.clone();
    metrics::gauge!("room_actual_kwh", "room" => room.clone()).set(report.consumption.actual_kwh);
    metrics::gauge!("room_actual_cost", "room" => room.clone()).set(report.consumption.actual_cost);
    metrics::gauge!("room_session_hours", "room" => room).set(report.duration.duration.total_hours);
}

#[async_trait::async_trait]
impl Sink<StoreSnapshot> for ReconciliationSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<StoreSnapshot>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut last: Option<SnapshotFingerprint> = None;

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for ReconciliationSink");
                    continue;
                }
            };
            metrics::counter!("snapshots_received_total").increment(1);

            if last.as_ref() == Some(&env.payload.fingerprint) {
                metrics::counter!("snapshots_unchanged_total").increment(1);
                continue;
            }

            let started = Instant::now();
            let summary = self.reconcile(&env.payload);
            metrics::histogram!("reconcile_duration_seconds").record(started.elapsed().as_secs_f64());

            if let Ok(age) = std::time::SystemTime::now().duration_since(env.received_at) {
                metrics::histogram!("snapshot_end_to_end_latency_seconds").record(age.as_secs_f64());
            }

            tracing::info!(
                fingerprint = env.payload.fingerprint.as_str(),
                instructors = env.payload.instructors.len(),
                resolved = summary.resolved.len(),
                not_found = summary.not_found.len(),
                "snapshot reconciled"
            );

            last = Some(env.payload.fingerprint.clone());
            self.cache.set_snapshot(Arc::new(env.payload));
        }

        Ok(())
    }
}
