//! Trial sequencing for a go/no-go auditory experiment.
//!
//! A [`StimulusCorpus`] supplies stimuli according to their configured
//! weights. A [`TrialController`] presents them, waits for responses,
//! decides reinforcement and hands [`TrialRecord`]s to a [`TrialLog`]. The
//! controller owns no transport; it is driven through the collaborator
//! traits in [`traits`].

pub mod controller;
pub mod corpus;
pub mod error;
pub mod outcome;
pub mod params;
pub mod state;
pub mod traits;
pub mod wait;

pub use controller::{Collaborators, Step, TrialController};
pub use corpus::{ResponseSpec, StimulusCorpus, StimulusName, StimulusSet, StimulusSpec};
pub use error::{ConfigurationError, TrialError};
pub use outcome::{
    Comment, Response, TIMEOUT, TrialOutcomeRecord, TrialRecord, TrialResult, decide,
};
pub use params::{ExperimentParams, check_subject};
pub use state::{Phase, TrialState};
pub use traits::{
    Apparatus, EventSource, PropertyTable, StatePublisher, StimulusProperties,
    TrialLog,
};
