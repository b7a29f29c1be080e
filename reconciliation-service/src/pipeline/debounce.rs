use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time::Instant;

use super::{Envelope, PipelineError};

/// Debounce timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounce {
    /// Emit once no newer envelope has arrived for this long.
    pub quiet: Duration,
    /// Upper bound on how long an envelope can be held back while newer ones
    /// keep arriving.
    pub max_wait: Duration,
}

/// Hold each envelope until `quiet` passes without a newer one, then emit
/// only the newest. A held envelope is flushed no later than `max_wait`
/// after the first one of a burst arrived. Errors pass through immediately.
/// The pending envelope is flushed when the input ends.
pub fn debounce<T, S>(input: S, timing: Debounce) -> impl Stream<Item = Result<Envelope<T>, PipelineError>> + Send
where
    T: Send + 'static,
    S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static,
{
    async_stream::stream! {
        let mut input = input;
        let mut pending: Option<Envelope<T>> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                deadline = None;
                if let Some(env) = pending.take() {
                    metrics::counter!("snapshots_debounce_max_wait_total").increment(1);
                    yield Ok(env);
                }
                continue;
            }

            let next = if pending.is_some() {
                let quiet_at = Instant::now() + timing.quiet;
                let flush_at = deadline.map_or(quiet_at, |d| d.min(quiet_at));
                match tokio::time::timeout_at(flush_at, input.next()).await {
                    Ok(next) => next,
                    Err(_elapsed) => {
                        deadline = None;
                        if let Some(env) = pending.take() {
                            yield Ok(env);
                        }
                        continue;
                    }
                }
            } else {
                input.next().await
            };

            match next {
                Some(Ok(env)) => {
                    if pending.replace(env).is_some() {
                        metrics::counter!("snapshots_debounced_total").increment(1);
                    } else {
                        deadline = Some(Instant::now() + timing.max_wait);
                    }
                }
                Some(Err(e)) => yield Err(e),
                None => {
                    if let Some(env) = pending.take() {
                        yield Ok(env);
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn timing(quiet_ms: u64, max_wait_ms: u64) -> Debounce {
        Debounce {
            quiet: Duration::from_millis(quiet_ms),
            max_wait: Duration::from_millis(max_wait_ms),
        }
    }

    #[tokio::test]
    async fn burst_collapses_to_last() {
        let input = stream::iter(vec![
            Ok(Envelope::now(1)),
            Ok(Envelope::now(2)),
            Ok(Envelope::now(3)),
        ]);

        let out: Vec<i32> = debounce(input, timing(50, 1_000))
            .map(|r| r.unwrap().payload)
            .collect()
            .await;
        assert_eq!(out, vec![3]);
    }

    #[tokio::test]
    async fn quiet_gaps_let_each_through() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let input = tokio_stream::wrappers::ReceiverStream::new(rx);

        let producer = tokio::spawn(async move {
            tx.send(Ok(Envelope::now(1))).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(Ok(Envelope::now(2))).await.unwrap();
        });

        let out: Vec<i32> = debounce(input, timing(20, 1_000))
            .map(|r| r.unwrap().payload)
            .collect()
            .await;
        producer.await.unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[tokio::test]
    async fn steady_stream_still_flushes_within_max_wait() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let input = tokio_stream::wrappers::ReceiverStream::new(rx);

        let producer = tokio::spawn(async move {
            for i in 0..60 {
                tx.send(Ok(Envelope::now(i))).await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let out: Vec<i32> = debounce(input, timing(50, 200))
            .map(|r| r.unwrap().payload)
            .collect()
            .await;
        producer.await.unwrap();

        assert!(out.len() >= 2, "expected intermediate flushes, got {out:?}");
        assert!(out[0] < 59);
        assert_eq!(out.last(), Some(&59));
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn errors_are_not_swallowed() {
        let input = stream::iter(vec![
            Ok(Envelope::now(1)),
            Err(PipelineError::Source("boom".into())),
        ]);

        let out: Vec<Result<Envelope<i32>, PipelineError>> = debounce(input, timing(10, 1_000)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], Err(PipelineError::Source(_))));
        assert_eq!(out[1].as_ref().map(|e| e.payload).ok(), Some(1));
    }
}
