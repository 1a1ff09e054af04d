use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device reporting key (peck) events.
pub const KEYS: &str = "keys";
/// House lights; report `daytime`.
pub const HOUSE_LIGHTS: &str = "house_lights";
/// Audio player used for stimulus presentation.
pub const APLAYER: &str = "aplayer";
/// Pseudo-device holding the running experiment's parameters.
pub const EXPERIMENT: &str = "experiment";

/// Partial state change reported by a device.
///
/// `state` is whatever the device sent, e.g. `{"peck_center": true}` from
/// the keys or `{"feeding": false}` from a hopper. Nothing about its shape
/// is guaranteed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApparatusEvent {
    pub device: String,
    pub state: Value,
}

impl ApparatusEvent {
    pub fn new(device: impl Into<String>, state: Value) -> Self {
        Self {
            device: device.into(),
            state,
        }
    }

    /// A key event with a single key pressed.
    pub fn key(key: &str) -> Self {
        let mut state = Map::new();
        state.insert(key.to_string(), Value::Bool(true));
        Self::new(KEYS, Value::Object(state))
    }

    /// A house lights event.
    pub fn daytime(daytime: bool) -> Self {
        Self::new(HOUSE_LIGHTS, serde_json::json!({ "daytime": daytime }))
    }

    /// Whether the event was reported by `device`.
    pub fn is_from(&self, device: &str) -> bool {
        self.device == device
    }

    /// Boolean field of the state, `None` when absent or not a boolean.
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.state.get(field)?.as_bool()
    }

    /// Whether `field` is present and truthy (`true` or a non-zero number).
    pub fn is_set(&self, field: &str) -> bool {
        match self.state.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }
}

/// Request to move a device into a (partial) state.
///
/// Commands are fire-and-forget; any effect shows up later as an
/// [`ApparatusEvent`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeviceCommand {
    pub device: String,
    pub state: Value,
}

impl DeviceCommand {
    pub fn new(device: impl Into<String>, state: Value) -> Self {
        Self {
            device: device.into(),
            state,
        }
    }

    /// Boolean field of the requested state.
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.state.get(field)?.as_bool()
    }
}
