use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::corpus::StimulusSpec;

/// Phase of the trial loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[serde(rename = "awaiting-trial-init")]
    AwaitingInit,
    PresentingStimulus,
    Interrupted,
    PostStimulus,
    Feeding,
    Intertrial,
    Sleeping,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::AwaitingInit => "awaiting-trial-init",
            Phase::PresentingStimulus => "presenting-stimulus",
            Phase::Interrupted => "interrupted",
            Phase::PostStimulus => "post-stimulus",
            Phase::Feeding => "feeding",
            Phase::Intertrial => "intertrial",
            Phase::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible controller state, published after every change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialState {
    pub trial: u64,
    pub phase: Option<Phase>,
    /// Stimulus being presented; `None` outside the presentation window.
    pub stimulus: Option<StimulusSpec>,
    pub last_feed: Option<DateTime<Utc>>,
    pub last_trial: Option<DateTime<Utc>>,
}

impl TrialState {
    /// Descriptor of the state variables, answered to metadata requests.
    pub fn meta() -> Value {
        json!({
            "type": "experiment",
            "variables": {
                "trial": "integer",
                "phase": "string",
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_names_match_serialized_form() {
        for phase in [
            Phase::AwaitingInit,
            Phase::PresentingStimulus,
            Phase::Interrupted,
            Phase::PostStimulus,
            Phase::Feeding,
            Phase::Intertrial,
            Phase::Sleeping,
        ] {
            assert_eq!(serde_json::to_value(phase).unwrap(), phase.as_str());
        }
    }

    #[test]
    fn baseline_state_is_empty() {
        let state = TrialState::default();
        assert_eq!(state.trial, 0);
        assert!(state.phase.is_none());
        assert!(state.stimulus.is_none());
    }
}
