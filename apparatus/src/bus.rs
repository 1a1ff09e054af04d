use tokio::sync::broadcast;

use crate::{ApparatusEvent, DeviceCommand};

/// Broadcast channels connecting the controller to the devices.
///
/// Events flow from devices to listeners, commands from the controller to
/// devices. Sending never fails: with no subscribers the message is dropped.
#[derive(Clone)]
pub struct ApparatusBus {
    events: broadcast::Sender<ApparatusEvent>,
    commands: broadcast::Sender<DeviceCommand>,
}

impl ApparatusBus {
    /// Default capacity of each channel.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a bus with the given per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (commands, _) = broadcast::channel(capacity);
        Self { events, commands }
    }

    /// Subscribe to device events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ApparatusEvent> {
        self.events.subscribe()
    }

    /// Subscribe to device commands.
    pub fn subscribe_commands(&self) -> broadcast::Receiver<DeviceCommand> {
        self.commands.subscribe()
    }

    /// Report a device event.
    pub fn publish_event(&self, event: ApparatusEvent) {
        let _ = self.events.send(event);
    }

    /// Send a command to a device.
    pub fn send_command(&self, command: DeviceCommand) {
        let _ = self.commands.send(command);
    }
}

impl Default for ApparatusBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
