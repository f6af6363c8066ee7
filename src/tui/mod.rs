//! TUI module - Workout execution screen with ratatui

use std::io::{stdout, Stdout};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::session::{ExercisePatch, ExerciseSpec, FinishOutcome, SessionState, WorkoutSession};
use crate::ticker::{SharedTimer, Ticker, TICK_PERIOD};
use crate::timer::{format_clock, CardioOption, IntervalTimer, TimerEvent, TimerMode};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Rest countdown between strength sets
const REST_TIMER_SECS: u32 = 60;

/// Sets and reps for an exercise added without them
const NEW_EXERCISE_SETS: u32 = 3;
const NEW_EXERCISE_REPS: &str = "8-10";

/// Line-editing prompts opened from the checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    /// "name, sets, reps"
    AddExercise,
    /// "sets, reps" for the selected exercise
    EditExercise,
    Notes,
}

impl InputMode {
    fn prompt(&self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::AddExercise => "Add (name, sets, reps): ",
            InputMode::EditExercise => "Edit (sets, reps): ",
            InputMode::Notes => "Notes: ",
        }
    }
}

/// What the timer on this screen is for
#[derive(Debug, Clone, Copy)]
pub enum TimerKind {
    Rest,
    Cardio { option: CardioOption, minutes: u32 },
}

/// App state for TUI
pub struct App {
    db: Database,
    config: Config,
    session: WorkoutSession,
    timer_kind: TimerKind,
    timer: SharedTimer,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    ticker: Option<Ticker>,
    selected: usize,
    input_mode: InputMode,
    input: String,
    status: String,
    should_quit: bool,
}

impl App {
    /// Must be called inside a tokio runtime: the timer ticker is spawned on it
    pub fn new(db: Database, config: Config, session: WorkoutSession, timer_kind: TimerKind) -> Self {
        let timer: SharedTimer = Arc::new(Mutex::new(IntervalTimer::new()));
        let (tx, events) = mpsc::unbounded_channel();
        let ticker = Ticker::spawn(timer.clone(), TICK_PERIOD, tx);

        Self {
            db,
            config,
            session,
            timer_kind,
            timer,
            events,
            ticker: Some(ticker),
            selected: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            status: String::new(),
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);

        // Leaving the screen cancels the pending tick
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            self.drain_timer_events();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn timer_snapshot(&self) -> Result<IntervalTimer> {
        self.timer
            .lock()
            .map(|t| t.clone())
            .map_err(|_| anyhow!("timer lock poisoned"))
    }

    fn drain_timer_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.status = match (event, self.timer_kind) {
                (TimerEvent::PhaseChanged(phase), TimerKind::Cardio { option, .. }) => {
                    let label = option.phase_label(phase).unwrap_or("-");
                    info!("Cardio phase: {}", label);
                    format!("Switch: {}", label)
                }
                (TimerEvent::PhaseChanged(_), TimerKind::Rest) => String::new(),
                (TimerEvent::Completed, TimerKind::Rest) => "Rest over, next set!".to_string(),
                (TimerEvent::Completed, TimerKind::Cardio { .. }) => {
                    info!("Cardio countdown finished");
                    "Time is up! Press f to save".to_string()
                }
            };
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(area);

        // Header
        let state = match self.session.state() {
            SessionState::NotStarted => "",
            SessionState::InProgress => " (in progress)",
            SessionState::Completed => " (completed)",
        };
        let header = Paragraph::new(format!("setwise - {}{}", self.session.meta().title, state))
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Timer
        let timer = self.timer_snapshot().unwrap_or_default();
        let (title, phase) = match self.timer_kind {
            TimerKind::Rest => ("Rest timer".to_string(), None),
            TimerKind::Cardio { option, minutes } => (
                format!("{} - {} min", option.title(), minutes),
                option.phase_label(timer.phase()).filter(|_| timer.remaining_secs() > 0),
            ),
        };
        let mut lines = vec![Line::from(format_clock(timer.remaining_secs()).bold())];
        if let Some(label) = phase {
            lines.push(Line::from(label.yellow().bold()));
        }
        let running = if timer.is_running() { "running" } else { "stopped" };
        lines.push(Line::from(running.dark_gray()));
        let clock = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(clock, chunks[1]);

        // Exercise checklist
        let rows: Vec<Row> = self
            .session
            .exercises()
            .iter()
            .enumerate()
            .map(|(i, ex)| {
                let marker = if i == self.selected { ">" } else { " " };
                let boxes: String = ex
                    .flags()
                    .iter()
                    .map(|done| if *done { "[x]" } else { "[ ]" })
                    .collect();
                let style = if ex.is_done() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(marker),
                    Cell::from(ex.name.clone()),
                    Cell::from(format!("{}x{}", ex.target_sets(), ex.reps)),
                    Cell::from(boxes),
                    Cell::from(format!("{}/{}", ex.completed_count(), ex.target_sets())),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Min(20),
                Constraint::Length(18),
                Constraint::Length(20),
                Constraint::Length(6),
            ],
        )
        .header(Row::new(vec!["", "Exercise", "Sets x Reps", "Sets", "Done"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Exercises"));
        frame.render_widget(table, chunks[2]);

        // Footer
        let help = match self.input_mode {
            InputMode::Normal => {
                "space: start/pause | r: reset | ↑/↓: select | 1-9: toggle set | a/e/d: add/edit/delete | n: notes | f: finish | q: quit"
            }
            _ => "enter: save | esc: cancel",
        };
        let second = if self.input_mode == InputMode::Normal {
            Line::from(Span::styled(self.status.clone(), Style::default().fg(Color::Yellow)))
        } else {
            Line::from(vec![
                Span::raw(self.input_mode.prompt()),
                Span::styled(format!("{}_", self.input), Style::default().fg(Color::White)),
            ])
        };
        let footer = Paragraph::new(vec![Line::from(help), second])
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if !event::poll(std::time::Duration::from_millis(100))? {
            return Ok(());
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key.code)?;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        if self.input_mode != InputMode::Normal {
            self.handle_input_key(code);
            return Ok(());
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle_timer()?,
            KeyCode::Char('r') => {
                self.with_timer(|t| t.reset())?;
                self.status.clear();
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.session.exercises().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char(c @ '1'..='9') => self.toggle_set(c as usize - '1' as usize),
            KeyCode::Char('a') => self.open_input(InputMode::AddExercise, String::new()),
            KeyCode::Char('e') => {
                if let Some(ex) = self.session.exercises().get(self.selected) {
                    let current = format!("{}, {}", ex.target_sets(), ex.reps);
                    self.open_input(InputMode::EditExercise, current);
                }
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('n') => {
                let current = self.session.meta().notes.clone().unwrap_or_default();
                self.open_input(InputMode::Notes, current);
            }
            KeyCode::Char('f') => self.finish(),
            _ => {}
        }
        Ok(())
    }

    fn open_input(&mut self, mode: InputMode, initial: String) {
        self.input_mode = mode;
        self.input = initial;
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => {
                let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
                let text = std::mem::take(&mut self.input);
                self.submit_input(mode, text.trim());
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn submit_input(&mut self, mode: InputMode, text: &str) {
        let result = match mode {
            InputMode::Normal => Ok(()),
            InputMode::AddExercise => parse_new_exercise(text).and_then(|spec| {
                let name = spec.name.clone();
                self.session.add_exercise(spec)?;
                self.selected = self.session.exercises().len() - 1;
                self.status = format!("Added {}", name);
                Ok(())
            }),
            InputMode::EditExercise => {
                let Some(exercise_id) = self.selected_id() else {
                    return;
                };
                parse_sets_reps(text).and_then(|(sets, reps)| {
                    let patch = ExercisePatch { sets: Some(sets), reps, ..Default::default() };
                    self.session.update_exercise(exercise_id, patch)?;
                    self.status = "Exercise updated".to_string();
                    Ok(())
                })
            }
            InputMode::Notes => {
                self.session.set_notes(text);
                self.status = "Notes saved".to_string();
                Ok(())
            }
        };

        if let Err(e) = result {
            self.status = e.to_string();
        }
    }

    fn selected_id(&self) -> Option<u32> {
        self.session.exercises().get(self.selected).map(|e| e.exercise_id)
    }

    fn delete_selected(&mut self) {
        let Some(exercise_id) = self.selected_id() else {
            return;
        };
        match self.session.delete_exercise(exercise_id) {
            Ok(()) => {
                let left = self.session.exercises().len();
                self.selected = self.selected.min(left.saturating_sub(1));
                self.status = "Exercise removed".to_string();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn with_timer<T>(&self, f: impl FnOnce(&mut IntervalTimer) -> T) -> Result<T> {
        let mut timer = self.timer.lock().map_err(|_| anyhow!("timer lock poisoned"))?;
        Ok(f(&mut timer))
    }

    fn toggle_timer(&mut self) -> Result<()> {
        let kind = self.timer_kind;
        let phase_secs = self.config.hiit_phase_secs;
        let started = self.with_timer(|t| {
            if t.is_running() {
                t.pause();
                return Ok(false);
            }
            match kind {
                TimerKind::Rest => t.start(TimerMode::PlainCountdown, REST_TIMER_SECS, 0),
                TimerKind::Cardio { option, minutes } => option.start(t, minutes, phase_secs),
            }
            .map(|_| true)
        })?;

        match started {
            Ok(true) => self.session.touch(),
            Ok(false) => {}
            Err(e) => self.status = e.to_string(),
        }
        Ok(())
    }

    fn toggle_set(&mut self, set_index: usize) {
        let Some(exercise_id) = self.selected_id() else {
            return;
        };
        if let Err(e) = self.session.toggle_set(exercise_id, set_index) {
            self.status = e.to_string();
        }
    }

    fn finish(&mut self) {
        let result = self.session.finish(
            &self.db,
            &self.config.user_id,
            Utc::now(),
            self.config.rollback_on_save_failure,
        );

        self.status = match result {
            Ok(FinishOutcome::Saved(id)) => {
                let saved = match self.session.summary() {
                    Some(s) => format!(
                        "Workout saved (id: {}) - {} min, {}/{} sets ({:.0}%)",
                        id,
                        s.duration_minutes,
                        s.completed_sets(),
                        s.total_sets(),
                        s.completion_percent()
                    ),
                    None => format!("Workout saved (id: {})", id),
                };
                match self.with_timer(|t| t.pause()) {
                    Ok(()) => saved,
                    Err(e) => {
                        warn!("Could not stop timer: {}", e);
                        format!("{} - timer error: {}", saved, e)
                    }
                }
            }
            Ok(FinishOutcome::AlreadyCompleted) => "Workout already completed".to_string(),
            Err(e) => {
                warn!("Save failed: {}", e);
                format!("Error saving workout: {}", e)
            }
        };
    }
}

/// "Dips", "Dips, 4" or "Dips, 4, 12"
fn parse_new_exercise(text: &str) -> crate::Result<ExerciseSpec> {
    let mut parts = text.splitn(3, ',').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let sets = match parts.next() {
        Some(raw) => parse_sets(raw)?,
        None => NEW_EXERCISE_SETS,
    };
    let reps = parts.next().filter(|r| !r.is_empty()).unwrap_or(NEW_EXERCISE_REPS);
    Ok(ExerciseSpec::new(name, sets, reps))
}

/// "4" or "4, 8-10"
fn parse_sets_reps(text: &str) -> crate::Result<(u32, Option<String>)> {
    let (sets, reps) = match text.split_once(',') {
        Some((sets, reps)) => (sets, Some(reps.trim()).filter(|r| !r.is_empty())),
        None => (text, None),
    };
    Ok((parse_sets(sets.trim())?, reps.map(str::to_string)))
}

fn parse_sets(raw: &str) -> crate::Result<u32> {
    raw.parse()
        .map_err(|_| crate::CoreError::invalid(format!("sets must be a number, got {:?}", raw)))
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::BuiltinWorkout;

    fn app(kind: TimerKind) -> App {
        let db = Database::open_in_memory().unwrap();
        let session = match kind {
            TimerKind::Rest => WorkoutSession::new(
                BuiltinWorkout::Push.title(),
                BuiltinWorkout::Push.specs(),
                Utc::now(),
            ),
            TimerKind::Cardio { option, minutes } => WorkoutSession::cardio(option, minutes, Utc::now()),
        };
        App::new(db, Config::default(), session, kind)
    }

    #[tokio::test]
    async fn test_space_starts_and_pauses_rest_timer() {
        let mut app = app(TimerKind::Rest);
        app.toggle_timer().unwrap();
        assert!(app.timer_snapshot().unwrap().is_running());
        assert_eq!(app.timer_snapshot().unwrap().remaining_secs(), REST_TIMER_SECS);
        assert_eq!(app.session.state(), SessionState::InProgress);

        app.toggle_timer().unwrap();
        assert!(!app.timer_snapshot().unwrap().is_running());
    }

    #[tokio::test]
    async fn test_hiit_uses_configured_phase() {
        let mut app = app(TimerKind::Cardio { option: CardioOption::Hiit, minutes: 20 });
        app.config.hiit_phase_secs = 45;
        app.toggle_timer().unwrap();
        assert_eq!(app.timer_snapshot().unwrap().remaining_secs(), 45);
    }

    #[tokio::test]
    async fn test_bad_cardio_minutes_show_status() {
        let mut app = app(TimerKind::Cardio { option: CardioOption::InclineWalk, minutes: 33 });
        app.toggle_timer().unwrap();
        assert!(!app.timer_snapshot().unwrap().is_running());
        assert!(app.status.contains("invalid argument"));
    }

    fn type_line(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c)).unwrap();
        }
        app.handle_key(KeyCode::Enter).unwrap();
    }

    #[tokio::test]
    async fn test_add_exercise_from_keys() {
        let mut app = app(TimerKind::Rest);
        app.handle_key(KeyCode::Char('a')).unwrap();
        assert_eq!(app.input_mode, InputMode::AddExercise);

        // Typed letters go to the prompt, not to the key bindings
        type_line(&mut app, "Dips, 4, 12");
        assert_eq!(app.input_mode, InputMode::Normal);

        let added = app.session.exercises().last().unwrap();
        assert_eq!(added.name, "Dips");
        assert_eq!(added.target_sets(), 4);
        assert_eq!(added.reps, "12");
        assert_eq!(added.exercise_id, 7);
        assert_eq!(app.selected, 6);
        assert!(!app.should_quit);

        app.handle_key(KeyCode::Char('a')).unwrap();
        type_line(&mut app, "Face pulls");
        let added = app.session.exercises().last().unwrap();
        assert_eq!((added.target_sets(), added.reps.as_str()), (3, "8-10"));
    }

    #[tokio::test]
    async fn test_bad_input_keeps_session() {
        let mut app = app(TimerKind::Rest);
        app.handle_key(KeyCode::Char('a')).unwrap();
        type_line(&mut app, " , 3");
        assert!(app.status.contains("name is required"), "{}", app.status);
        assert_eq!(app.session.exercises().len(), 6);

        app.handle_key(KeyCode::Char('e')).unwrap();
        app.input.clear();
        type_line(&mut app, "zero");
        assert!(app.status.contains("sets must be a number"));

        app.handle_key(KeyCode::Char('a')).unwrap();
        app.handle_key(KeyCode::Esc).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_edit_delete_and_notes_are_saved() {
        let mut app = app(TimerKind::Rest);
        app.toggle_set(0);
        app.toggle_set(3);

        // Prefilled with current "sets, reps"; shrink to two sets
        app.handle_key(KeyCode::Char('e')).unwrap();
        assert_eq!(app.input, "4, 8-10");
        app.input.clear();
        type_line(&mut app, "2, 5");
        let first = &app.session.exercises()[0];
        assert_eq!(first.target_sets(), 2);
        assert_eq!(first.reps, "5");
        assert_eq!(first.completed_count(), 1);

        app.selected = 5;
        app.handle_key(KeyCode::Char('d')).unwrap();
        assert_eq!(app.session.exercises().len(), 5);
        assert_eq!(app.selected, 4);

        app.handle_key(KeyCode::Char('n')).unwrap();
        type_line(&mut app, "felt strong");
        app.handle_key(KeyCode::Char('f')).unwrap();
        assert!(app.status.contains(", 1/"), "{}", app.status);
        assert!(app.status.contains('%'));

        let saved = &app.db.get_workout_history("local").unwrap()[0];
        assert_eq!(saved.notes.as_deref(), Some("felt strong"));
        assert_eq!(saved.exercises.len(), 5);
        assert_eq!(saved.exercises[0].sets, 2);
        assert_eq!(saved.completed_sets(), 1);
    }

    #[tokio::test]
    async fn test_finish_reports_timer_error() {
        let mut app = app(TimerKind::Rest);
        let timer = app.timer.clone();
        let _ = std::thread::spawn(move || {
            let _guard = timer.lock().unwrap();
            panic!("poison the timer lock");
        })
        .join();

        app.finish();
        assert!(app.status.starts_with("Workout saved"), "{}", app.status);
        assert!(app.status.contains("timer error: timer lock poisoned"), "{}", app.status);
        assert_eq!(app.db.get_workout_history("local").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_and_finish_saves() {
        let mut app = app(TimerKind::Rest);
        app.selected = 1;
        app.toggle_set(0);
        app.toggle_set(8);
        assert!(app.status.contains("out of range"));
        assert_eq!(app.session.completed_count(2).unwrap(), 1);

        app.finish();
        assert!(app.status.starts_with("Workout saved"), "{}", app.status);
        app.finish();
        assert_eq!(app.status, "Workout already completed");

        let history = app.db.get_workout_history("local").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].completed_sets(), 1);
    }
}
