//! Subscriber session: one per consumer GET. Streams bytes to the
//! HTTP response, sniffing Content-Type from the first chunk, and tears
//! down on either producer end-of-stream or consumer disconnect.

use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use tracing::{debug, info};

use crate::mime::resolve_content_type;
use crate::registry::{Chunk, SubscriberId};
use crate::state::AppState;

/// Detaches the subscriber from the registry when dropped, whether that
/// happens because the stream ran to completion or because the client
/// disconnected mid-stream and the response body was torn down early.
struct DetachGuard {
    state: AppState,
    path: String,
    id: SubscriberId,
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        self.state.hub.detach_subscriber(&self.path, self.id);
        debug!(path = %self.path, id = self.id, "subscriber detached");
    }
}

pub async fn handle(state: AppState, path: String) -> Response<Body> {
    let (id, mut rx) = state.hub.attach_subscriber(&path);
    info!(path = %path, id, "subscriber attached");
    let guard = DetachGuard {
        state,
        path: path.clone(),
        id,
    };

    // Block for the first chunk (or end-of-stream) so Content-Type can be
    // set from it before any bytes are written to the response.
    let first = rx.recv().await;
    let content_type = match &first {
        Some(Chunk::Bytes(bytes)) => Some(resolve_content_type(bytes, &path)),
        _ => None,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        match first {
            Some(Chunk::Bytes(bytes)) => yield Ok::<_, std::io::Error>(bytes.to_vec()),
            Some(Chunk::Terminal) | None => return,
        }
        loop {
            match rx.recv().await {
                Some(Chunk::Bytes(bytes)) => yield Ok(bytes.to_vec()),
                Some(Chunk::Terminal) | None => break,
            }
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONNECTION, "keep-alive")
        .header(header::PRAGMA, "no-cache")
        .header(header::CACHE_CONTROL, "no-cache, no-store");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from_stream(stream))
        .expect("failed to build subscriber response")
}
