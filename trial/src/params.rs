use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigurationError;

/// Default response window in milliseconds.
pub const DEFAULT_RESPONSE_WINDOW: u64 = 2000;
/// Default hopper-up time in milliseconds.
pub const DEFAULT_FEED_DURATION: u64 = 4000;

/// Parameters governing the trial loop. Durations are in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentParams {
    pub subject: String,
    pub user: String,
    pub active: bool,
    pub response_window: u64,
    pub feed_duration: u64,
    pub feed_delay: u64,
    /// Key that starts a trial.
    pub init_key: String,
    pub hoppers: Vec<String>,
    pub min_iti: u64,
    /// Draw stimuli with replacement.
    pub replace: bool,
    /// Parameters this program does not interpret; kept for the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            subject: String::new(),
            user: String::new(),
            active: true,
            response_window: DEFAULT_RESPONSE_WINDOW,
            feed_duration: DEFAULT_FEED_DURATION,
            feed_delay: 0,
            init_key: "peck_center".into(),
            hoppers: vec!["feeder_left".into(), "feeder_right".into()],
            min_iti: 100,
            replace: true,
            extra: Map::new(),
        }
    }
}

impl ExperimentParams {
    /// Overlay `overrides` (typically the stimulus set's `parameters`) on
    /// these values. Keys in `overrides` win.
    pub fn merge(&mut self, overrides: &Map<String, Value>) -> Result<(), ConfigurationError> {
        let mut merged = match serde_json::to_value(&*self).map_err(ConfigurationError::Parameters)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        *self = serde_json::from_value(Value::Object(merged)).map_err(ConfigurationError::Parameters)?;
        Ok(())
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window)
    }

    pub fn feed_delay(&self) -> Duration {
        Duration::from_millis(self.feed_delay)
    }

    pub fn min_iti(&self) -> Duration {
        Duration::from_millis(self.min_iti)
    }
}

/// Normalize a subject id.
///
/// Ids are trimmed and may contain letters, digits, `-` and `_`.
pub fn check_subject(id: &str) -> Result<String, ConfigurationError> {
    let id = id.trim();
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(id.to_string())
    } else {
        Err(ConfigurationError::InvalidSubject(id.to_string()))
    }
}
