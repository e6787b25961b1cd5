//! Streaming relay
//!
//! Relays an upstream body chunk by chunk. Dropping the relay (for example
//! when the caller disconnects) drops the upstream stream with it, which
//! releases the outbound connection.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::proxy::logging::RequestContext;

/// Stream type for upstream response bodies
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Tracks relay progress and reports abandoned streams on drop.
struct RelayGuard {
    ctx: RequestContext,
    chunks: usize,
    bytes: usize,
    finished: bool,
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.ctx.log_stream_abandoned(self.chunks);
        }
    }
}

/// Wrap an upstream body so it is relayed lazily and its end is logged.
///
/// A transport error mid-stream is logged and passed through, which aborts
/// the outer response.
pub fn relay_stream(
    upstream: ByteStream,
    ctx: RequestContext,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
    async_stream::stream! {
        let mut upstream = upstream;
        let mut guard = RelayGuard {
            ctx,
            chunks: 0,
            bytes: 0,
            finished: false,
        };
        let mut failed = false;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    guard.chunks += 1;
                    guard.bytes += chunk.len();
                    yield Ok(chunk);
                }
                Err(e) => {
                    failed = true;
                    guard.ctx.log_error(&format!("Upstream stream error: {e}"));
                    yield Err(e);
                    break;
                }
            }
        }

        guard.finished = true;
        if !failed {
            guard.ctx.log_stream_ended(guard.chunks, guard.bytes);
        }
    }
}
