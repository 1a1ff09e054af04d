//! Values that may come from the command line or the environment.
//!
//! The command line wins over the environment, which wins over the
//! default.

use std::path::PathBuf;

/// Environment variable naming the trial log file.
pub const TRIAL_LOG_VAR: &str = "GNG_TRIAL_LOG";
/// Environment variable holding the random seed.
pub const SEED_VAR: &str = "GNG_SEED";

/// Seed for the random source. `None` means seed from entropy.
pub fn seed(cli: Option<u64>) -> Option<u64> {
    seed_from(cli, std::env::var(SEED_VAR).ok())
}

/// Path of the JSON-lines trial log, if any.
pub fn trial_log(cli: Option<PathBuf>) -> Option<PathBuf> {
    trial_log_from(cli, std::env::var(TRIAL_LOG_VAR).ok())
}

fn seed_from(cli: Option<u64>, env: Option<String>) -> Option<u64> {
    cli.or_else(|| env?.trim().parse().ok())
}

fn trial_log_from(cli: Option<PathBuf>, env: Option<String>) -> Option<PathBuf> {
    cli.or_else(|| env.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_env() {
        assert_eq!(seed_from(Some(1), Some("2".into())), Some(1));
        assert_eq!(
            trial_log_from(Some("a.jsonl".into()), Some("b.jsonl".into())),
            Some(PathBuf::from("a.jsonl"))
        );
    }

    #[test]
    fn env_used_when_cli_none() {
        assert_eq!(seed_from(None, Some(" 42 ".into())), Some(42));
        assert_eq!(
            trial_log_from(None, Some("b.jsonl".into())),
            Some(PathBuf::from("b.jsonl"))
        );
    }

    #[test]
    fn default_when_missing_or_invalid() {
        assert_eq!(seed_from(None, None), None);
        assert_eq!(seed_from(None, Some("soon".into())), None);
        assert_eq!(trial_log_from(None, Some("  ".into())), None);
    }
}
