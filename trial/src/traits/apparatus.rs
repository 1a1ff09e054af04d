use apparatus::{ApparatusBus, DeviceCommand};
use async_trait::async_trait;
use serde_json::Value;

/// Command side of the apparatus.
///
/// Only the trial controller should invoke these.
#[async_trait]
pub trait Apparatus: Send + Sync {
    /// Ask `device` to take on the partial `state`. No acknowledgement.
    async fn change_state(&self, device: &str, state: Value);

    /// Hoppers currently attached. An empty list means "unknown".
    async fn feeders(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Apparatus for ApparatusBus {
    async fn change_state(&self, device: &str, state: Value) {
        self.send_command(DeviceCommand::new(device, state));
    }
}
