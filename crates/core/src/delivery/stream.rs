//! Byte stream that schedules its own deletion.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;

use super::cleanup::CleanupScheduler;

/// Schedules deletion of one identifier, at most once.
struct CleanupTicket {
    scheduler: CleanupScheduler,
    identifier: String,
}

/// Content of a delivery.
///
/// When the stream ends, or is dropped early because the client went away,
/// the object is scheduled for deletion. Either way this happens once.
pub struct DeliveryStream {
    inner: BoxStream<'static, io::Result<Bytes>>,
    ticket: Option<CleanupTicket>,
}

impl DeliveryStream {
    pub(crate) fn new(
        inner: BoxStream<'static, io::Result<Bytes>>,
        scheduler: CleanupScheduler,
        identifier: String,
    ) -> Self {
        Self {
            inner,
            ticket: Some(CleanupTicket {
                scheduler,
                identifier,
            }),
        }
    }

    fn redeem(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            ticket.scheduler.schedule(ticket.identifier);
        }
    }
}

impl Stream for DeliveryStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.as_mut().poll_next(cx);
        if let Poll::Ready(None) = polled {
            self.redeem();
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Drop for DeliveryStream {
    fn drop(&mut self) {
        self.redeem();
    }
}

impl std::fmt::Debug for DeliveryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryStream")
            .field("pending_cleanup", &self.ticket.is_some())
            .finish_non_exhaustive()
    }
}
