use std::path::{Path, PathBuf};

use apparatus::{ApparatusBus, ApparatusEvent};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trial::{StatePublisher, TrialLog, TrialRecord, TrialState};

/// Appends each record as one JSON object per line, stamped with `time`.
pub struct JsonlTrialLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlTrialLog {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TrialLog for JsonlTrialLog {
    async fn record(&self, record: TrialRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(&stamp(&record)?)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Writes each record to the log at info level.
#[derive(Clone, Default)]
pub struct TracingTrialLog;

#[async_trait]
impl TrialLog for TracingTrialLog {
    async fn record(&self, record: TrialRecord) -> anyhow::Result<()> {
        info!(data = %serde_json::to_string(&record)?, "trial data");
        Ok(())
    }
}

fn stamp(record: &TrialRecord) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.insert("time".into(), Value::String(Utc::now().to_rfc3339()));
    }
    Ok(value)
}

/// Device name under which trial state appears on the apparatus bus.
pub const STATE_DEVICE: &str = "noisy-gng";

/// Logs each state change and forwards it on the apparatus bus as an
/// event from [`STATE_DEVICE`].
#[derive(Clone)]
pub struct BusStatePublisher {
    bus: ApparatusBus,
}

impl BusStatePublisher {
    pub fn new(bus: ApparatusBus) -> Self {
        Self { bus }
    }
}

impl StatePublisher for BusStatePublisher {
    fn publish(&self, state: &TrialState) {
        debug!(
            trial = state.trial,
            phase = %state.phase.map(|p| p.as_str()).unwrap_or("-"),
            stimulus = %state.stimulus.as_ref().map(|s| s.name.to_string()).unwrap_or_default(),
            "state changed"
        );
        match serde_json::to_value(state) {
            Ok(value) => self.bus.publish_event(ApparatusEvent::new(STATE_DEVICE, value)),
            Err(e) => warn!(error = %e, "could not encode trial state"),
        }
    }
}
