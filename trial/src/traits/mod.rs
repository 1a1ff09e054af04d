//! Contracts for the collaborators around the trial loop.

pub mod apparatus;
pub mod events;
pub mod log;
pub mod properties;
pub mod publisher;

pub use apparatus::Apparatus;
pub use events::EventSource;
pub use log::TrialLog;
pub use properties::{PropertyTable, StimulusProperties, StimulusProperty};
pub use publisher::StatePublisher;
