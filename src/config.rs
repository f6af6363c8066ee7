//! Runtime configuration: CLI flags, falling back to environment (and `.env`)

use clap::builder::NonEmptyStringValueParser;
use clap::Args;

/// Default SQLite file
pub const DEFAULT_DB_PATH: &str = "setwise.db";

/// Default length of one HIIT phase (1 min run / 1 min walk)
pub const DEFAULT_HIIT_PHASE_SECS: u32 = 60;

pub const DEFAULT_USER_ID: &str = "local";

#[derive(Debug, Clone, PartialEq, Args)]
pub struct Config {
    /// SQLite database file
    #[arg(long = "db", env = "SETWISE_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db_path: String,

    /// Already-resolved identity used to tag saved sessions
    #[arg(
        long = "user",
        env = "SETWISE_USER",
        default_value = DEFAULT_USER_ID,
        value_parser = NonEmptyStringValueParser::new(),
        global = true
    )]
    pub user_id: String,

    /// Length of one HIIT phase in seconds
    #[arg(
        long,
        env = "SETWISE_HIIT_PHASE_SECS",
        default_value_t = DEFAULT_HIIT_PHASE_SECS,
        value_parser = clap::value_parser!(u32).range(1..),
        global = true
    )]
    pub hiit_phase_secs: u32,

    /// tracing filter, e.g. "info" or "setwise=debug"
    #[arg(long = "log", env = "SETWISE_LOG", default_value = "info", global = true)]
    pub log_filter: String,

    /// Return a finished session to in-progress when saving fails
    #[arg(long, env = "SETWISE_ROLLBACK_ON_SAVE_FAILURE", global = true)]
    pub rollback_on_save_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            hiit_phase_secs: DEFAULT_HIIT_PHASE_SECS,
            log_filter: "info".to_string(),
            rollback_on_save_failure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        TestCli::try_parse_from(std::iter::once("setwise").chain(args.iter().copied())).map(|c| c.config)
    }

    #[test]
    fn test_flags_override() {
        let config = parse(&[
            "--db",
            "/tmp/x.db",
            "--user",
            "alice",
            "--hiit-phase-secs",
            "30",
            "--rollback-on-save-failure",
        ])
        .unwrap();
        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.hiit_phase_secs, 30);
        assert!(config.rollback_on_save_failure);
    }

    #[test]
    fn test_zero_phase_rejected() {
        let err = parse(&["--hiit-phase-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(parse(&["--hiit-phase-secs", "soon"]).is_err());
    }

    #[test]
    fn test_blank_user_rejected() {
        assert!(parse(&["--user", ""]).is_err());
    }

    #[test]
    fn test_default_matches_constants() {
        let config = Config::default();
        assert_eq!(config.hiit_phase_secs, 60);
        assert_eq!(config.user_id, "local");
        assert!(!config.rollback_on_save_failure);
    }
}
