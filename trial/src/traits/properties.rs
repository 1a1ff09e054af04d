use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::corpus::StimulusName;
use crate::error::ConfigurationError;

/// Lookup of playback properties reported by the audio player.
pub trait StimulusProperties: Send + Sync {
    /// Playback duration of `name`, `None` if the stimulus is unknown.
    fn duration(&self, name: &StimulusName) -> Option<Duration>;
}

/// Properties of one stimulus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StimulusProperty {
    /// Playback duration in seconds.
    pub duration: f64,
}

/// In-memory property table keyed by stimulus name.
///
/// Multi-channel stimuli are keyed by their names joined with `,`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    entries: HashMap<String, StimulusProperty>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry with a duration in seconds.
    pub fn with(mut self, name: impl Into<String>, duration: f64) -> Self {
        self.insert(name, duration);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, duration: f64) {
        self.entries
            .insert(name.into(), StimulusProperty { duration });
    }

    /// Read a JSON table of the form `{"name": {"duration": 1.5}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StimulusProperties for PropertyTable {
    fn duration(&self, name: &StimulusName) -> Option<Duration> {
        let prop = self.entries.get(&name.to_string())?;
        Duration::try_from_secs_f64(prop.duration).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_seconds() {
        let table = PropertyTable::new().with("a", 2.0).with("l,r", 0.25);
        assert_eq!(
            table.duration(&StimulusName::from("a")),
            Some(Duration::from_secs(2))
        );
        let multi = StimulusName::Channels(vec!["l".into(), "r".into()]);
        assert_eq!(table.duration(&multi), Some(Duration::from_millis(250)));
        assert_eq!(table.duration(&StimulusName::from("b")), None);
    }

    #[test]
    fn negative_duration_is_unknown() {
        let table = PropertyTable::new().with("a", -1.0);
        assert_eq!(table.duration(&StimulusName::from("a")), None);
    }

    #[test]
    fn parses_player_metadata_shape() {
        let table: PropertyTable =
            serde_json::from_str(r#"{"song": {"duration": 1.5}}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.duration(&StimulusName::from("song")),
            Some(Duration::from_millis(1500))
        );
    }
}
