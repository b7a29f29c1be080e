use session_energy::{domain::RoomRef, DomainTimestamp};
use time::macros::datetime;

use crate::{
    pipeline::{Envelope, PipelineError, Transform},
    snapshot::StoreSnapshot,
};

/// Detach readings whose timestamp falls outside a broad sanity window
/// [2000-01-01, 2100-01-01). A detached reading is treated as absent by the
/// engine. Returns how many were detached.
///
/// Readings without a decodable timestamp are left alone; the engine already
/// skips them for anything time-dependent.
pub fn strip_implausible_samples(snapshot: &mut StoreSnapshot) -> usize {
    let min_ts = DomainTimestamp::new(datetime!(2000-01-01 00:00:00));
    let max_ts = DomainTimestamp::new(datetime!(2100-01-01 00:00:00));

    let detach = |room: &mut RoomRef| -> usize {
        let implausible = room
            .sample
            .as_ref()
            .and_then(|s| s.timestamp)
            .is_some_and(|ts| ts < min_ts || ts >= max_ts);
        if implausible {
            room.sample = None;
            1
        } else {
            0
        }
    };

    let mut stripped = 0;
    for instructor in &mut snapshot.instructors {
        if let Some(live) = instructor.live.as_mut() {
            stripped += detach(&mut live.schedule.room);
        }
        for entry in &mut instructor.history {
            stripped += detach(&mut entry.record.schedule.room);
        }
    }
    stripped
}

#[derive(Clone, Default)]
pub struct SampleSanity;

#[async_trait::async_trait]
impl Transform<StoreSnapshot, StoreSnapshot> for SampleSanity {
    async fn apply(&self, mut input: Envelope<StoreSnapshot>) -> Result<Envelope<StoreSnapshot>, PipelineError> {
        let stripped = strip_implausible_samples(&mut input.payload);
        if stripped > 0 {
            metrics::counter!("samples_out_of_range_total").increment(stripped as u64);
            tracing::warn!(
                stripped,
                fingerprint = input.payload.fingerprint.as_str(),
                "detached readings with implausible timestamps"
            );
        }
        Ok(input)
    }
}
