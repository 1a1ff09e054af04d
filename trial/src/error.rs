use std::path::PathBuf;
use thiserror::Error;

/// Problems with the experiment's configuration. All of these are fatal and
/// must stop the process before the trial loop starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid experiment parameters: {0}")]
    Parameters(#[source] serde_json::Error),
    #[error("stimulus set '{0}' failed validation")]
    InvalidStimulusSet(String),
    #[error("stimulus pool is empty; every frequency is zero")]
    EmptyPool,
    #[error("no playback duration known for stimulus '{0}'")]
    UnknownStimulus(String),
    #[error("no hoppers available for feeding")]
    NoHoppers,
    #[error("invalid subject id '{0}'")]
    InvalidSubject(String),
}

/// Errors that end the trial loop.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("apparatus event stream closed")]
    EventSourceClosed,
}
