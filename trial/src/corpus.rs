//! Stimulus sets and the weighted draw pool built from them.
//!
//! A stimulus set is a JSON document:
//!
//! ```json
//! {
//!   "stimulus_root": "/data/stimuli",
//!   "experiment": "noise-gng-1",
//!   "parameters": { "min_iti": 500 },
//!   "stimuli": [
//!     { "name": "song_a", "frequency": 2,
//!       "responses": { "peck_center": { "p_reward": 0.0, "reinforced": false },
//!                      "timeout": { "p_reward": 0.8, "reinforced": true } } }
//!   ]
//! }
//! ```
//!
//! Each stimulus appears `frequency` times in the pool. Draws either sample
//! the pool with replacement or walk it in shuffled order, reshuffling once
//! every entry has been used.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::error::ConfigurationError;

/// File extension of stimulus audio assets.
pub const ASSET_EXTENSION: &str = "wav";

/// Identifier of a stimulus: one file, or one file per playback channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StimulusName {
    Single(String),
    Channels(Vec<String>),
}

impl StimulusName {
    /// The individual asset names.
    pub fn parts(&self) -> &[String] {
        match self {
            StimulusName::Single(name) => std::slice::from_ref(name),
            StimulusName::Channels(names) => names,
        }
    }
}

impl fmt::Display for StimulusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts().join(","))
    }
}

impl From<&str> for StimulusName {
    fn from(name: &str) -> Self {
        StimulusName::Single(name.to_string())
    }
}

/// Consequences of one response to a stimulus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_punish: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_reward: Option<f64>,
    #[serde(default)]
    pub reinforced: bool,
}

impl ResponseSpec {
    /// Probability of reward; absent means never.
    pub fn reward_probability(&self) -> f64 {
        self.p_reward.unwrap_or(0.0)
    }

    /// Sum of the consequence probabilities.
    pub fn total_probability(&self) -> f64 {
        self.p_punish.unwrap_or(0.0) + self.reward_probability()
    }
}

/// One configured stimulus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StimulusSpec {
    pub name: StimulusName,
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseSpec>,
    /// Fields this program does not interpret (categories, cue settings...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parsed stimulus set document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StimulusSet {
    pub stimulus_root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub stimuli: Vec<StimulusSpec>,
}

/// Weighted, shuffled pool of stimuli with a draw cursor.
pub struct StimulusCorpus {
    config: StimulusSet,
    experiment: String,
    source: Option<PathBuf>,
    pool: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl StimulusCorpus {
    /// Build a corpus from an already parsed set.
    ///
    /// Fails when the frequencies sum to zero, since no draw could succeed.
    pub fn new(
        config: StimulusSet,
        experiment: impl Into<String>,
        rng: StdRng,
    ) -> Result<Self, ConfigurationError> {
        if config.stimuli.iter().all(|s| s.frequency == 0) {
            return Err(ConfigurationError::EmptyPool);
        }
        let experiment = config.experiment.clone().unwrap_or_else(|| experiment.into());
        let mut corpus = Self {
            config,
            experiment,
            source: None,
            pool: Vec::new(),
            cursor: 0,
            rng,
        };
        corpus.generate();
        Ok(corpus)
    }

    /// Read a stimulus set from `path`.
    ///
    /// The experiment name defaults to the file stem of `path`.
    pub fn load(path: impl AsRef<Path>, rng: StdRng) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StimulusSet =
            serde_json::from_str(&text).map_err(|source| ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut corpus = Self::new(config, stem, rng)?;
        corpus.source = Some(path.to_path_buf());
        Ok(corpus)
    }

    /// Check that names are unique, every asset exists and every response's
    /// probabilities sum to at most one.
    ///
    /// Every stimulus is checked and every failure is logged before the
    /// result is returned.
    pub fn is_valid(&self) -> bool {
        match &self.source {
            Some(path) => info!(path = %path.display(), "validating stimulus set"),
            None => info!(experiment = %self.experiment, "validating stimulus set"),
        }
        let mut valid = true;
        let mut seen = HashSet::new();
        for stim in &self.config.stimuli {
            if !seen.insert(&stim.name) {
                error!(stimulus = %stim.name, "stimulus is listed more than once");
                valid = false;
            }
            valid &= self.check_files(stim);
            valid &= check_probs(stim);
        }
        valid
    }

    /// [`is_valid`](Self::is_valid) as a `Result`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidStimulusSet(self.experiment.clone()))
        }
    }

    fn check_files(&self, stim: &StimulusSpec) -> bool {
        let mut found = true;
        for name in stim.name.parts() {
            let loc = self.asset_path(name);
            debug!(path = %loc.display(), "checking for stimulus");
            if !loc.exists() {
                error!(
                    stimulus = %stim.name,
                    root = %self.config.stimulus_root.display(),
                    "stimulus file does not exist"
                );
                found = false;
            }
        }
        found
    }

    /// Location of the asset for a single stimulus name.
    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.config
            .stimulus_root
            .join(format!("{name}.{ASSET_EXTENSION}"))
    }

    /// Rebuild the pool from the configured frequencies and shuffle it.
    pub fn generate(&mut self) {
        self.pool = self
            .config
            .stimuli
            .iter()
            .enumerate()
            .flat_map(|(idx, stim)| std::iter::repeat_n(idx, stim.frequency as usize))
            .collect();
        self.pool.shuffle(&mut self.rng);
        self.cursor = 0;
    }

    /// Draw the next stimulus.
    ///
    /// With `replace` the pool is sampled uniformly and the cursor is left
    /// alone. Without it the pool is walked in order; once exhausted it is
    /// reshuffled and the walk starts over.
    pub fn next(&mut self, replace: bool) -> &StimulusSpec {
        let idx = if replace {
            self.pool[self.rng.gen_range(0..self.pool.len())]
        } else {
            if self.cursor >= self.pool.len() {
                debug!("stimulus pool exhausted; reshuffling");
                self.pool.shuffle(&mut self.rng);
                self.cursor = 0;
            }
            let idx = self.pool[self.cursor];
            self.cursor += 1;
            idx
        };
        &self.config.stimuli[idx]
    }

    /// Unbounded sequence of draws.
    pub fn draws(&mut self, replace: bool) -> Draws<'_> {
        Draws {
            corpus: self,
            replace,
        }
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn root(&self) -> &Path {
        &self.config.stimulus_root
    }

    pub fn stimuli(&self) -> &[StimulusSpec] {
        &self.config.stimuli
    }

    /// Free-form parameters from the stimulus set.
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.config.parameters
    }
}

fn check_probs(stim: &StimulusSpec) -> bool {
    let mut ok = true;
    for (key, resp) in &stim.responses {
        if resp.total_probability() > 1.0 {
            error!(
                stimulus = %stim.name,
                response = %key,
                "consequence probabilities sum to > 1.0"
            );
            ok = false;
        }
    }
    ok
}

/// Iterator returned by [`StimulusCorpus::draws`]. Never ends.
pub struct Draws<'a> {
    corpus: &'a mut StimulusCorpus,
    replace: bool,
}

impl Iterator for Draws<'_> {
    type Item = StimulusSpec;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.corpus.next(self.replace).clone())
    }
}
