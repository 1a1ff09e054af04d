//! In-process stand-in for the operant apparatus.
//!
//! Hoppers answer `{"feeding": true, "interval": ms}` with `{"feeding":
//! false}` once the interval has passed. Everything else is logged. Key
//! presses and house-light changes are typed on stdin by the operator.

use apparatus::{APLAYER, ApparatusBus, ApparatusEvent, DeviceCommand};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use trial::Apparatus;

/// Simulated apparatus answering commands sent over an [`ApparatusBus`].
#[derive(Clone)]
pub struct SimulatedApparatus {
    bus: ApparatusBus,
    feeders: Vec<String>,
}

impl SimulatedApparatus {
    /// Start answering commands on `bus` for the given hoppers.
    pub fn spawn(bus: ApparatusBus, feeders: Vec<String>) -> Self {
        let mut commands = bus.subscribe_commands();
        let events = bus.clone();
        let hoppers = feeders.clone();
        tokio::spawn(async move {
            loop {
                match commands.recv().await {
                    Ok(command) => handle(&events, &hoppers, command),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "simulator missed commands");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { bus, feeders }
    }
}

fn handle(bus: &ApparatusBus, hoppers: &[String], command: DeviceCommand) {
    if hoppers.contains(&command.device) {
        if command.flag("feeding") == Some(true) {
            let interval = command
                .state
                .get("interval")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            info!(hopper = %command.device, interval, "hopper up");
            let bus = bus.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(interval)).await;
                info!(hopper = %command.device, "hopper down");
                bus.publish_event(ApparatusEvent::new(command.device, json!({ "feeding": false })));
            });
        }
    } else if command.device == APLAYER {
        info!(state = %command.state, "player");
    } else {
        debug!(device = %command.device, state = %command.state, "command");
    }
}

#[async_trait]
impl Apparatus for SimulatedApparatus {
    async fn change_state(&self, device: &str, state: Value) {
        self.bus.send_command(DeviceCommand::new(device, state));
    }

    async fn feeders(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.feeders.clone())
    }
}

/// Turn operator input into device events.
///
/// Each line names a key (`peck_center`, `peck_left`, ...). `night` and
/// `day` switch the house lights. Returns when the input ends.
pub async fn listen_keys<R>(input: R, bus: ApparatusBus)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "could not read operator input");
                break;
            }
        };
        let event = match line.trim() {
            "" => continue,
            "night" => ApparatusEvent::daytime(false),
            "day" => ApparatusEvent::daytime(true),
            key => ApparatusEvent::key(key),
        };
        debug!(device = %event.device, state = %event.state, "operator input");
        bus.publish_event(event);
    }
}
