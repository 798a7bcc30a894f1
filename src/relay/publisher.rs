//! Publisher session: one per producer POST. Reads the request body
//! chunk by chunk, fans each chunk out to every subscriber currently
//! attached to the path, optionally archives it, and optionally enforces a
//! no-listener idle cutoff.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::fs::File;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::archive;
use crate::registry::Chunk;
use crate::state::AppState;

/// Listener-gate poll interval (non-stream mode).
const GATE_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Ten minutes of no-listener idle ticks before a non-stream publisher
/// gives up.
const IDLE_CUTOFF_TICKS: u32 = 600;

#[derive(Debug, Deserialize, Default)]
pub struct PublishParams {
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub archive: bool,
    #[serde(default)]
    pub advertise: bool,
}

/// Archive (if enabled) and fan a single chunk out to every subscriber
/// currently attached to `path`.
async fn relay_chunk(state: &AppState, path: &str, archive_handle: Option<&Arc<AsyncMutex<File>>>, bytes: Bytes) {
    if let Some(handle) = archive_handle {
        if let Err(err) = archive::append(handle, &bytes).await {
            warn!(path = %path, error = %err, "archive write failed");
        }
    }

    let payload: Arc<[u8]> = Arc::from(bytes.as_ref());
    for sender in state.hub.snapshot(path) {
        let _ = sender.send(Chunk::Bytes(payload.clone())).await;
    }
}

pub async fn handle(state: AppState, path: String, params: PublishParams, body: Body) -> StatusCode {
    let advertised = params.stream && params.advertise;
    if advertised {
        state.hub.advertise(&path);
        info!(path = %path, "advertised");
    }

    let archive_handle = if params.archive {
        match state.hub.archive_handle(&path) {
            Some(handle) => Some(handle),
            None => match archive::open_archive_file(&state.config.folder, &path).await {
                Ok(handle) => {
                    state.hub.set_archive_handle(&path, handle.clone());
                    Some(handle)
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to open archive file");
                    None
                }
            },
        }
    } else {
        None
    };

    info!(path = %path, stream = params.stream, archive = params.archive, "publisher started");
    let mut body_stream = body.into_data_stream();
    let mut idle_ticks: u32 = 0;
    let mut unexpected_eof = false;

    'publish: loop {
        // While gated, race the idle sleep against the body itself so a
        // producer disconnect (or a body that runs out) is noticed within
        // one poll instead of only after the full idle cutoff. A chunk
        // that arrives mid-gate is still relayed (fan-out to zero
        // subscribers is a no-op) and resets the idle counter exactly as a
        // normal post-gate read would.
        while !params.stream && state.hub.subscriber_count(&path) == 0 {
            if idle_ticks >= IDLE_CUTOFF_TICKS {
                info!(path = %path, "idle cutoff reached with no listeners, ending publisher");
                break 'publish;
            }

            tokio::select! {
                _ = tokio::time::sleep(GATE_POLL_INTERVAL) => {
                    idle_ticks += 1;
                }
                next = body_stream.next() => {
                    match next {
                        Some(Ok(bytes)) => {
                            idle_ticks = 0;
                            relay_chunk(&state, &path, archive_handle.as_ref(), bytes).await;
                        }
                        Some(Err(err)) => {
                            warn!(path = %path, error = %err, "producer read error, suppressing terminal broadcast");
                            unexpected_eof = true;
                            break 'publish;
                        }
                        None => {
                            info!(path = %path, "producer body ended while no listeners were attached");
                            break 'publish;
                        }
                    }
                }
            }
        }

        match body_stream.next().await {
            Some(Ok(bytes)) => {
                idle_ticks = 0;
                relay_chunk(&state, &path, archive_handle.as_ref(), bytes).await;
            }
            Some(Err(err)) => {
                warn!(path = %path, error = %err, "producer read error, suppressing terminal broadcast");
                unexpected_eof = true;
                break;
            }
            None => break,
        }
    }

    if !unexpected_eof {
        for sender in state.hub.snapshot(&path) {
            let _ = sender.send(Chunk::Terminal).await;
        }
    }

    if params.archive {
        state.hub.clear_archive_handle(&path);
    }
    if advertised {
        state.hub.unadvertise(&path);
        info!(path = %path, "unadvertised");
    }
    info!(path = %path, "publisher ended");

    StatusCode::OK
}
