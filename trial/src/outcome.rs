//! Reinforcement decisions and the records emitted for each trial.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::corpus::{ResponseSpec, StimulusName, StimulusSpec};

/// Response label recorded when no key was pecked.
pub const TIMEOUT: &str = "timeout";

/// What the subject did during a presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// A response key pecked while the stimulus was playing or in the
    /// response window.
    Key(String),
    Timeout,
}

impl Response {
    pub fn as_str(&self) -> &str {
        match self {
            Response::Key(key) => key,
            Response::Timeout => TIMEOUT,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result category of a resolved presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialResult {
    Interrupt,
    Feed,
    NoFeed,
}

/// Apply the reinforcement rule.
///
/// `entry` is the stimulus's configuration for `response` and `draw` a
/// uniform sample from `[0, 1)`. Any key response interrupts. A timeout
/// feeds only when its entry is reinforced and `draw` falls below the
/// reward probability.
pub fn decide(response: &Response, entry: Option<&ResponseSpec>, draw: f64) -> TrialResult {
    match (response, entry) {
        (Response::Key(_), _) => TrialResult::Interrupt,
        (Response::Timeout, Some(resp)) if resp.reinforced && draw < resp.reward_probability() => {
            TrialResult::Feed
        }
        (Response::Timeout, _) => TrialResult::NoFeed,
    }
}

/// Outcome of one resolved presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcomeRecord {
    pub trial: u64,
    pub experiment: String,
    pub subject: String,
    pub stimulus: StimulusName,
    pub response: String,
    pub reinforced: bool,
    pub result: TrialResult,
    /// Milliseconds from presentation onset to the response.
    pub rtime: Option<u64>,
}

/// Non-trial entries in the trial log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "comment", rename_all = "snake_case")]
pub enum Comment {
    Starting {
        subject: String,
        experiment: String,
        version: String,
        params: Value,
        stimset: Vec<StimulusSpec>,
    },
    Stopping {
        subject: String,
        experiment: String,
    },
    Heartbeat {
        subject: String,
    },
}

/// Anything handed to a [`TrialLog`](crate::TrialLog).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrialRecord {
    Outcome(TrialOutcomeRecord),
    Comment(Comment),
}

impl From<TrialOutcomeRecord> for TrialRecord {
    fn from(record: TrialOutcomeRecord) -> Self {
        TrialRecord::Outcome(record)
    }
}

impl From<Comment> for TrialRecord {
    fn from(comment: Comment) -> Self {
        TrialRecord::Comment(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn reinforced(p_reward: f64) -> ResponseSpec {
        ResponseSpec {
            p_punish: None,
            p_reward: Some(p_reward),
            reinforced: true,
        }
    }

    #[test]
    fn key_responses_always_interrupt() {
        let entry = reinforced(1.0);
        for draw in [0.0, 0.5, 0.999] {
            let res = decide(&Response::Key("peck_left".into()), Some(&entry), draw);
            assert_eq!(res, TrialResult::Interrupt);
        }
        assert_eq!(
            decide(&Response::Key("peck_left".into()), None, 0.0),
            TrialResult::Interrupt
        );
    }

    #[test]
    fn timeout_feeds_below_threshold_only() {
        let entry = reinforced(0.3);
        assert_eq!(decide(&Response::Timeout, Some(&entry), 0.0), TrialResult::Feed);
        assert_eq!(decide(&Response::Timeout, Some(&entry), 0.29), TrialResult::Feed);
        assert_eq!(decide(&Response::Timeout, Some(&entry), 0.3), TrialResult::NoFeed);
        assert_eq!(decide(&Response::Timeout, Some(&entry), 0.9), TrialResult::NoFeed);
    }

    #[test]
    fn unreinforced_or_missing_timeout_never_feeds() {
        let entry = ResponseSpec {
            p_reward: Some(1.0),
            ..ResponseSpec::default()
        };
        assert_eq!(decide(&Response::Timeout, Some(&entry), 0.0), TrialResult::NoFeed);
        assert_eq!(decide(&Response::Timeout, None, 0.0), TrialResult::NoFeed);
    }

    #[test]
    fn feed_rate_tracks_reward_probability() {
        let entry = reinforced(0.3);
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let fed = (0..n)
            .filter(|_| {
                decide(&Response::Timeout, Some(&entry), rng.gen_range(0.0..1.0))
                    == TrialResult::Feed
            })
            .count();
        let rate = fed as f64 / n as f64;
        assert!((rate - 0.3).abs() < 0.02, "feed rate {rate}");
    }

    #[test]
    fn records_serialize_flat() {
        let rec = TrialRecord::from(TrialOutcomeRecord {
            trial: 3,
            experiment: "exp".into(),
            subject: "b1".into(),
            stimulus: "a".into(),
            response: TIMEOUT.into(),
            reinforced: false,
            result: TrialResult::NoFeed,
            rtime: None,
        });
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["result"], "no_feed");
        assert_eq!(v["response"], "timeout");
        assert!(v["rtime"].is_null());

        let stop = TrialRecord::from(Comment::Stopping {
            subject: "b1".into(),
            experiment: "exp".into(),
        });
        assert_eq!(serde_json::to_value(&stop).unwrap()["comment"], "stopping");
    }
}
