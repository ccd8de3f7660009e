use super::messages::PartialTranscript;
use tokio::sync::mpsc;
use tracing::debug;

/// Hands partial transcripts to the caller's channel without blocking the reader.
///
/// A single delivery task forwards queued partials in order. The caller's
/// sender is owned by that task and dropped only after the queue is drained,
/// so the receiver sees the channel close only after every dispatched partial.
pub(crate) struct PartialDispatcher {
    queue: mpsc::UnboundedSender<PartialTranscript>,
    dispatched: usize,
}

impl PartialDispatcher {
    pub(crate) fn new(sink: mpsc::Sender<PartialTranscript>) -> Self {
        let (queue, mut pending) = mpsc::unbounded_channel::<PartialTranscript>();

        tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(partial) = pending.recv().await {
                if sink.send(partial).await.is_err() {
                    debug!("Partial transcript receiver dropped, discarding the rest");
                    break;
                }
                delivered += 1;
            }
            debug!("Delivered {} partial transcripts", delivered);
        });

        Self {
            queue,
            dispatched: 0,
        }
    }

    pub(crate) fn dispatch(&mut self, partial: PartialTranscript) {
        // Fails only once the receiver is gone
        if self.queue.send(partial).is_ok() {
            self.dispatched += 1;
        }
    }

    /// Stop accepting partials. The caller's channel closes once the delivery
    /// task has forwarded everything already dispatched.
    pub(crate) fn finish(self) {
        debug!("Dispatched {} partial transcripts", self.dispatched);
        drop(self.queue);
    }
}
