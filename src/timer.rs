//! Countdown / interval timer for cardio sessions
//!
//! The timer is a plain state machine advanced by `tick()` once per second.
//! It owns no clock: whoever drives it (see `ticker`) decides when a second
//! has passed, so every transition is testable without waiting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimerMode {
    /// Single countdown that stops at zero
    #[default]
    PlainCountdown,
    /// Two phases that swap every `phase_length_secs`, forever
    AlternatingInterval,
}

/// Active half of an alternating interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    A,
    B,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Phase::A => Phase::B,
            Phase::B => Phase::A,
        }
    }
}

/// Notification produced by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    PhaseChanged(Phase),
    Completed,
}

/// Snapshot of the timer. Copyable so transitions can be pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerState {
    pub mode: TimerMode,
    pub total_duration_secs: u32,
    pub phase_length_secs: u32,
    pub remaining_secs: u32,
    pub running: bool,
    pub phase: Phase,
}

/// One-second transition.
///
/// A tick on a stopped timer is stale and changes nothing. Reaching zero is
/// resolved within the same tick: plain countdowns stop and complete,
/// alternating intervals flip phase and reload.
pub fn tick(state: TimerState) -> (TimerState, Option<TimerEvent>) {
    if !state.running {
        return (state, None);
    }

    let mut next = state;
    next.remaining_secs = state.remaining_secs.saturating_sub(1);
    if next.remaining_secs > 0 {
        return (next, None);
    }

    match state.mode {
        TimerMode::PlainCountdown => {
            next.running = false;
            (next, Some(TimerEvent::Completed))
        }
        TimerMode::AlternatingInterval => {
            next.phase = state.phase.flipped();
            next.remaining_secs = state.phase_length_secs;
            (next, Some(TimerEvent::PhaseChanged(next.phase)))
        }
    }
}

/// Mutable wrapper around `TimerState` used by the UI
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    state: TimerState,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    /// Start a fresh countdown, or resume a paused one.
    ///
    /// Arguments are validated either way. When time is left over from a
    /// pause the timer resumes with its existing mode and remaining time.
    pub fn start(&mut self, mode: TimerMode, total_duration_secs: u32, phase_length_secs: u32) -> Result<()> {
        if total_duration_secs == 0 {
            return Err(CoreError::invalid("total duration must be positive"));
        }
        if mode == TimerMode::AlternatingInterval && phase_length_secs == 0 {
            return Err(CoreError::invalid("phase length must be positive"));
        }

        if self.state.remaining_secs > 0 {
            debug!("Timer resumed at {}s", self.state.remaining_secs);
            self.state.running = true;
            return Ok(());
        }

        let remaining_secs = match mode {
            TimerMode::PlainCountdown => total_duration_secs,
            TimerMode::AlternatingInterval => phase_length_secs,
        };
        self.state = TimerState {
            mode,
            total_duration_secs,
            phase_length_secs,
            remaining_secs,
            running: true,
            phase: Phase::A,
        };
        debug!("Timer started: {:?}, {}s", mode, remaining_secs);
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state.running {
            debug!("Timer paused at {}s", self.state.remaining_secs);
        }
        self.state.running = false;
    }

    pub fn reset(&mut self) {
        self.state.running = false;
        self.state.remaining_secs = 0;
        self.state.phase = Phase::A;
    }

    pub fn tick(&mut self) -> Option<TimerEvent> {
        let (next, event) = tick(self.state);
        self.state = next;
        if let Some(ev) = event {
            debug!("Timer event: {:?}", ev);
        }
        event
    }
}

/// Render seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Cardio workout presets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CardioOption {
    InclineWalk,
    Hiit,
}

impl CardioOption {
    pub const DEFAULT_MINUTES: u32 = 30;

    pub fn title(&self) -> &'static str {
        match self {
            CardioOption::InclineWalk => "INCLINE WALKING",
            CardioOption::Hiit => "HIIT TRAINING",
        }
    }

    /// Name stored with the saved exercise row
    pub fn exercise_name(&self) -> &'static str {
        match self {
            CardioOption::InclineWalk => "Incline Walking",
            CardioOption::Hiit => "HIIT Training",
        }
    }

    pub fn description(&self, minutes: u32) -> String {
        match self {
            CardioOption::InclineWalk => format!("Incline walking for {} minutes", minutes),
            CardioOption::Hiit => format!("HIIT training: 1 min run / 1 min walk for {} minutes", minutes),
        }
    }

    /// Durations offered for this option, in minutes
    pub fn durations(&self) -> &'static [u32] {
        match self {
            CardioOption::InclineWalk => &[30, 35, 40, 45],
            CardioOption::Hiit => &[20, 22, 25],
        }
    }

    pub fn timer_mode(&self) -> TimerMode {
        match self {
            CardioOption::InclineWalk => TimerMode::PlainCountdown,
            CardioOption::Hiit => TimerMode::AlternatingInterval,
        }
    }

    /// Label shown next to the clock, HIIT only
    pub fn phase_label(&self, phase: Phase) -> Option<&'static str> {
        match (self, phase) {
            (CardioOption::InclineWalk, _) => None,
            (CardioOption::Hiit, Phase::A) => Some("RUN"),
            (CardioOption::Hiit, Phase::B) => Some("WALK"),
        }
    }

    pub fn validate_minutes(&self, minutes: u32) -> Result<()> {
        if self.durations().contains(&minutes) {
            Ok(())
        } else {
            Err(CoreError::invalid(format!(
                "{} supports {:?} minutes, got {}",
                self.title(),
                self.durations(),
                minutes
            )))
        }
    }

    /// Start (or resume) `timer` for this preset
    pub fn start(&self, timer: &mut IntervalTimer, minutes: u32, phase_secs: u32) -> Result<()> {
        self.validate_minutes(minutes)?;
        timer.start(self.timer_mode(), minutes * 60, phase_secs)
    }
}

impl fmt::Display for CardioOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardioOption::InclineWalk => write!(f, "incline"),
            CardioOption::Hiit => write!(f, "hiit"),
        }
    }
}

impl FromStr for CardioOption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "incline" | "incline-walk" | "walk" => Ok(CardioOption::InclineWalk),
            "hiit" => Ok(CardioOption::Hiit),
            other => Err(CoreError::invalid(format!("unknown cardio option: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn run_ticks(timer: &mut IntervalTimer, n: u32) -> Vec<TimerEvent> {
        (0..n).filter_map(|_| timer.tick()).collect()
    }

    #[test]
    fn test_plain_countdown_runs_to_zero() {
        for total in [1, 2, 59, 61, 300] {
            let mut timer = IntervalTimer::new();
            timer.start(TimerMode::PlainCountdown, total, 0).unwrap();
            run_ticks(&mut timer, total);
            assert_eq!(timer.remaining_secs(), 0);
            assert!(!timer.is_running());
        }
    }

    #[test]
    fn test_thirty_minute_countdown_completes_once() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::PlainCountdown, 1800, 0).unwrap();
        let events = run_ticks(&mut timer, 1800);
        assert_eq!(events, vec![TimerEvent::Completed]);

        // Further ticks are stale
        let extra = run_ticks(&mut timer, 10);
        assert!(extra.is_empty());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_alternating_flips_and_reloads() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::AlternatingInterval, 20 * 60, 60).unwrap();
        assert_eq!(timer.remaining_secs(), 60);

        let events = run_ticks(&mut timer, 60);
        assert_eq!(events, vec![TimerEvent::PhaseChanged(Phase::B)]);
        assert_eq!(timer.phase(), Phase::B);
        assert_eq!(timer.remaining_secs(), 60);
        assert!(timer.is_running());
    }

    #[test]
    fn test_alternating_ignores_total_duration() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::AlternatingInterval, 120, 60).unwrap();
        let events = run_ticks(&mut timer, 600);
        assert_eq!(events.len(), 10);
        assert!(timer.is_running());
        assert_eq!(timer.phase(), Phase::A);
    }

    #[test]
    fn test_pause_then_start_resumes() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::PlainCountdown, 100, 0).unwrap();
        run_ticks(&mut timer, 30);
        timer.pause();
        assert_eq!(timer.remaining_secs(), 70);

        // Ticks while paused are ignored
        run_ticks(&mut timer, 5);
        assert_eq!(timer.remaining_secs(), 70);

        timer.start(TimerMode::PlainCountdown, 100, 0).unwrap();
        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 70);
    }

    #[test]
    fn test_resume_keeps_original_mode() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::AlternatingInterval, 600, 60).unwrap();
        run_ticks(&mut timer, 10);
        timer.pause();
        timer.start(TimerMode::PlainCountdown, 600, 0).unwrap();
        assert_eq!(timer.mode(), TimerMode::AlternatingInterval);
        assert_eq!(timer.remaining_secs(), 50);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut timer = IntervalTimer::new();
        timer.pause();
        timer.pause();
        assert_eq!(timer.state(), TimerState::default());
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::AlternatingInterval, 600, 60).unwrap();
        run_ticks(&mut timer, 75);
        assert_eq!(timer.phase(), Phase::B);

        timer.reset();
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::A);

        timer.reset();
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_start_after_completion_restarts() {
        let mut timer = IntervalTimer::new();
        timer.start(TimerMode::PlainCountdown, 3, 0).unwrap();
        run_ticks(&mut timer, 3);
        timer.start(TimerMode::PlainCountdown, 5, 0).unwrap();
        assert_eq!(timer.remaining_secs(), 5);
    }

    #[test]
    fn test_start_rejects_bad_arguments() {
        let mut timer = IntervalTimer::new();
        assert_matches!(timer.start(TimerMode::PlainCountdown, 0, 0), Err(CoreError::InvalidArgument(_)));
        assert_matches!(
            timer.start(TimerMode::AlternatingInterval, 60, 0),
            Err(CoreError::InvalidArgument(_))
        );
        assert_eq!(timer.state(), TimerState::default());
    }

    #[test]
    fn test_pure_tick_on_stopped_state() {
        let state = TimerState { remaining_secs: 10, ..Default::default() };
        assert_eq!(tick(state), (state, None));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(1800), "30:00");
        assert_eq!(format_clock(3725), "62:05");
    }

    #[test]
    fn test_cardio_presets() {
        assert_eq!(CardioOption::Hiit.phase_label(Phase::A), Some("RUN"));
        assert_eq!(CardioOption::Hiit.phase_label(Phase::B), Some("WALK"));
        assert_eq!(CardioOption::InclineWalk.phase_label(Phase::A), None);
        assert!(CardioOption::InclineWalk.durations().contains(&CardioOption::DEFAULT_MINUTES));

        let mut timer = IntervalTimer::new();
        CardioOption::InclineWalk.start(&mut timer, 35, 60).unwrap();
        assert_eq!(timer.remaining_secs(), 35 * 60);

        let mut timer = IntervalTimer::new();
        assert_matches!(CardioOption::Hiit.start(&mut timer, 30, 60), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_cardio_option_parse() {
        assert_eq!("HIIT".parse::<CardioOption>().unwrap(), CardioOption::Hiit);
        assert_eq!("incline".parse::<CardioOption>().unwrap(), CardioOption::InclineWalk);
        assert!("swim".parse::<CardioOption>().is_err());
    }
}
