use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use axum::body::Bytes;
use futures::{stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    config::HttpSourceConfig,
    pipeline::{Envelope, EnvelopeStream, PipelineError, Source},
    snapshot::StoreSnapshot,
};

#[derive(Clone)]
struct IngestState {
    tx: mpsc::Sender<Envelope<StoreSnapshot>>,
    auth_bearer_token: Option<Arc<str>>,
}

/// Receives full `Instructors` subtrees pushed by the store on every change.
pub struct HttpSnapshotSource {
    receiver: tokio::sync::Mutex<Option<mpsc::Receiver<Envelope<StoreSnapshot>>>>,
}

impl HttpSnapshotSource {
    pub async fn new(cfg: &HttpSourceConfig) -> Result<Self, PipelineError> {
        let (tx, rx) = mpsc::channel(cfg.channel_capacity.max(1));
        let state = IngestState {
            tx,
            auth_bearer_token: cfg.auth_bearer_token.as_deref().map(Arc::from),
        };

        let addr: SocketAddr = cfg
            .http_bind_addr
            .parse()
            .map_err(|e| PipelineError::Source(format!("invalid bind addr: {e}")))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PipelineError::Source(format!("failed to bind snapshot listener: {e}")))?;

        let app = router(state, cfg.max_body_bytes);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                tracing::error!(error = %e, "snapshot ingest server error");
            }
        });
        tracing::info!(%addr, "accepting store snapshots");

        Ok(Self {
            receiver: tokio::sync::Mutex::new(Some(rx)),
        })
    }
}

fn router(state: IngestState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/ingest/instructors", post(ingest_snapshot))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

#[async_trait::async_trait]
impl Source<StoreSnapshot> for HttpSnapshotSource {
    async fn stream(&self) -> EnvelopeStream<StoreSnapshot> {
        match self.receiver.lock().await.take() {
            Some(rx) => Box::pin(ReceiverStream::new(rx).map(Ok)),
            None => Box::pin(stream::once(async {
                Err(PipelineError::Source(
                    "snapshot stream already taken; only one consumer supported".to_string(),
                ))
            })),
        }
    }
}

fn authorized(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

async fn ingest_snapshot(
    State(state): State<IngestState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    metrics::counter!("http_snapshot_requests_total").increment(1);

    if !authorized(state.auth_bearer_token.as_deref(), &headers) {
        metrics::counter!("http_snapshot_unauthorized_total").increment(1);
        return Err(StatusCode::UNAUTHORIZED);
    }

    let snapshot = StoreSnapshot::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "rejecting malformed snapshot");
        metrics::counter!("http_snapshot_rejected_total").increment(1);
        StatusCode::BAD_REQUEST
    })?;

    if state.tx.send(Envelope::now(snapshot)).await.is_err() {
        metrics::counter!("http_snapshot_failed_total").increment(1);
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(StatusCode::ACCEPTED)
}
