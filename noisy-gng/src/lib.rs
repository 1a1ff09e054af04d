//! Process wrapper around the trial controller: logging, the simulated
//! apparatus, trial log sinks and the heartbeat.

pub mod heartbeat;
pub mod logging;
pub mod settings;
pub mod simulator;
pub mod sinks;

pub use heartbeat::{HEARTBEAT_INTERVAL, spawn_heartbeat};
pub use logging::init_logging;
pub use simulator::{SimulatedApparatus, listen_keys};
pub use sinks::{BusStatePublisher, JsonlTrialLog, STATE_DEVICE, TracingTrialLog};
