use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use setwise::db::{Database, ProgramFilter};
use setwise::exercises::BuiltinWorkout;
use setwise::session::{FinishOutcome, ProgramSource, SessionState, WorkoutSession};
use setwise::timer::CardioOption;
use setwise::CoreError;

fn db_path(dir: &TempDir) -> String {
    dir.path().join("setwise.db").to_string_lossy().into_owned()
}

#[test]
fn finished_session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap();

    let id = {
        let db = Database::open(&path).unwrap();
        let mut session = WorkoutSession::new(
            BuiltinWorkout::Pull.title(),
            BuiltinWorkout::Pull.specs(),
            start,
        );
        session.toggle_set(1, 0).unwrap();
        session.toggle_set(1, 1).unwrap();
        session.set_notes("grip felt weak");

        let outcome = session.finish(&db, "anna", start + Duration::minutes(52), false).unwrap();
        assert_matches!(outcome, FinishOutcome::Saved(_));
        match outcome {
            FinishOutcome::Saved(id) => id,
            FinishOutcome::AlreadyCompleted => unreachable!(),
        }
    };

    let db = Database::open(&path).unwrap();
    let record = db.get_workout(id, "anna").unwrap().unwrap();
    assert_eq!(record.title, "PULL WORKOUT");
    assert_eq!(record.workout_type, "pull-workout");
    assert_eq!(record.duration_minutes, Some(52));
    assert_eq!(record.notes.as_deref(), Some("grip felt weak"));
    assert_eq!(record.exercises.len(), 6);
    assert_eq!(record.completed_sets(), 2);

    // Other users do not see it
    assert!(db.get_workout(id, "bob").unwrap().is_none());
    assert!(db.get_workout_history("bob").unwrap().is_empty());
}

#[test]
fn cardio_session_is_saved_as_cardio() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&db_path(&dir)).unwrap();
    let start = Utc::now();

    let mut session = WorkoutSession::cardio(CardioOption::Hiit, 20, start);
    session.finish(&db, "local", start + Duration::minutes(20), false).unwrap();

    let history = db.get_workout_history("local").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].workout_type, "cardio");
    assert_eq!(history[0].exercises[0].reps, "20 minutes");
    assert_eq!(history[0].completed_sets(), 1);
}

#[test]
fn legacy_database_gets_user_column() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                workout_type TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                notes TEXT,
                duration_minutes INTEGER
            );
            INSERT INTO workouts (title, workout_type, completed_at, duration_minutes)
            VALUES ('OLD WORKOUT', 'old-workout', '2023-01-01T10:00:00+00:00', 40);",
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), 3);

    // Untagged rows stay but belong to nobody
    assert!(db.get_workout_history("local").unwrap().is_empty());

    let mut session = WorkoutSession::new("LEGS & ABS WORKOUT", BuiltinWorkout::LegsAbs.specs(), Utc::now());
    session.finish(&db, "local", Utc::now(), false).unwrap();
    let history = db.get_workout_history("local").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].workout_type, "legs--abs-workout");
}

#[test]
fn reopening_does_not_reseed_templates() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let filter = ProgramFilter { include_templates: true, ..Default::default() };

    let first = Database::open(&path).unwrap().get_workout_programs(&filter).unwrap();
    let second = Database::open(&path).unwrap().get_workout_programs(&filter).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[test]
fn program_workout_runs_as_session() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&db_path(&dir)).unwrap();

    let templates = db
        .get_workout_programs(&ProgramFilter { include_templates: true, ..Default::default() })
        .unwrap();
    let copy_id = db.copy_template_program(templates[0].id, "local", None).unwrap();
    let program = db.get_workout_program(copy_id).unwrap();
    let day_one = &program.workouts[0];

    let loaded = db.load_workout(day_one.id).unwrap();
    let mut session = WorkoutSession::from_loaded(loaded, Utc::now());
    assert_eq!(session.meta().workout_type, "program-based");
    assert_eq!(session.exercises().len(), day_one.exercises.len());

    session.toggle_set(1, 0).unwrap();
    session.finish(&db, "local", Utc::now(), false).unwrap();
    assert_eq!(session.state(), SessionState::Completed);

    let saved = &db.get_workout_history("local").unwrap()[0];
    assert_eq!(saved.title, format!("{} - {}", program.name, day_one.name));
    assert_eq!(saved.workout_type, "program-based");

    assert_matches!(db.load_workout(9999), Err(CoreError::NotFound(_)));
}
