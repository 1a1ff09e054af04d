use apparatus::ApparatusEvent;
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Stream of device events the controller waits on.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Next event, or `None` once the source has closed.
    async fn next_event(&mut self) -> Option<ApparatusEvent>;

    /// Drop events that arrived while nothing was waiting.
    fn discard_pending(&mut self) {}
}

#[async_trait]
impl EventSource for broadcast::Receiver<ApparatusEvent> {
    async fn next_event(&mut self) -> Option<ApparatusEvent> {
        loop {
            match self.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event source lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn discard_pending(&mut self) {
        use broadcast::error::TryRecvError;
        loop {
            match self.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

#[async_trait]
impl EventSource for mpsc::UnboundedReceiver<ApparatusEvent> {
    async fn next_event(&mut self) -> Option<ApparatusEvent> {
        self.recv().await
    }

    fn discard_pending(&mut self) {
        while self.try_recv().is_ok() {}
    }
}
