use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{info, warn};
use trial::{Comment, TrialLog};

/// Time between heartbeat records.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Emit a heartbeat record for `subject` every `every`, starting one
/// interval from now.
pub fn spawn_heartbeat(log: Arc<dyn TrialLog>, subject: String, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        loop {
            ticker.tick().await;
            info!(%subject, "heartbeat");
            let beat = Comment::Heartbeat {
                subject: subject.clone(),
            };
            if let Err(e) = log.record(beat.into()).await {
                warn!(error = %e, "heartbeat not recorded");
            }
        }
    })
}
