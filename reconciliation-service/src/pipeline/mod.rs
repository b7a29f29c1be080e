use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

mod debounce;

pub use debounce::{debounce, Debounce};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// Source → transforms → optional debounce → sink.
///
/// Snapshots are whole-state, so dropping the intermediate ones of a burst
/// loses nothing; the sink only ever sees the latest.
pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>,
    pub debounce: Option<Debounce>,
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<(), PipelineError> {
        let mut stream = self.source.stream().await;

        for t in self.transforms {
            stream = Box::pin(stream.then(move |item| {
                let t = t.clone();
                async move {
                    match item {
                        Ok(env) => t.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        if let Some(timing) = self.debounce {
            stream = Box::pin(debounce(stream, timing));
        }

        self.sink.run(stream).await
    }
}
