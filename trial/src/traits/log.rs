use async_trait::async_trait;

use crate::outcome::TrialRecord;

/// Destination for trial records.
///
/// Delivery is best effort: the controller logs a failed `record` and
/// carries on.
#[async_trait]
pub trait TrialLog: Send + Sync {
    async fn record(&self, record: TrialRecord) -> anyhow::Result<()>;
}
