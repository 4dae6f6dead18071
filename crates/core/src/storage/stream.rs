//! Delete-after-download stream sequencing.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use opendal::Operator;
use pin_project::pin_project;
use tracing::{debug, warn};

/// Byte stream over a stored file.
pub type FileByteStream = opendal::FuturesBytesStream;

/// Deferred deletion of a streamed file.
pub struct CleanupHandle {
    operator: Operator,
    path: String,
}

impl CleanupHandle {
    pub(crate) fn new(operator: Operator, path: String) -> Self {
        Self { operator, path }
    }

    /// Fire-and-forget deletion; the response is already on the wire, so a
    /// failure here can only be logged.
    fn spawn_delete(self) {
        tokio::spawn(async move {
            match self.operator.delete(&self.path).await {
                Ok(()) => debug!(path = %self.path, "deleted after download"),
                Err(err) => warn!(path = %self.path, %err, "delete after download failed"),
            }
        });
    }
}

/// Stream wrapper that deletes the underlying file only after the inner
/// stream finishes cleanly.
///
/// An error from the inner stream, or dropping the wrapper before the end
/// (client disconnect), leaves the file in place so the link can be
/// retried within its validity window.
#[pin_project]
pub struct DeleteOnComplete<S> {
    #[pin]
    inner: S,
    cleanup: Option<CleanupHandle>,
    failed: bool,
}

impl<S> DeleteOnComplete<S> {
    pub(crate) fn new(inner: S, cleanup: Option<CleanupHandle>) -> Self {
        Self {
            inner,
            cleanup,
            failed: false,
        }
    }
}

impl<S, E> Stream for DeleteOnComplete<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(None) => {
                if !*this.failed {
                    if let Some(cleanup) = this.cleanup.take() {
                        cleanup.spawn_delete();
                    }
                }
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(err))) => {
                *this.failed = true;
                this.cleanup.take();
                Poll::Ready(Some(Err(err)))
            }
            other => other,
        }
    }
}
