//! setwise - Personal workout tracker
//!
//! Set checklists for strength days, a countdown / interval timer for cardio,
//! and a local SQLite history of finished sessions.

pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
pub mod session;
pub mod ticker;
pub mod timer;
pub mod tui;

pub use config::Config;
pub use db::Database;
pub use error::{CoreError, Result};
pub use session::{SessionSummary, WorkoutSession};
pub use timer::{IntervalTimer, TimerEvent, TimerMode};
