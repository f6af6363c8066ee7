//! Database module - SQLite storage for sessions, profiles and programs

mod profile;
mod programs;

pub use profile::UserProfile;
pub use programs::{
    group_by_category, split_templates, NewProgram, NewProgramExercise, NewProgramWorkout, ProgramCategory,
    ProgramExercise, ProgramFilter, ProgramWorkout, WorkoutProgram,
};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::session::{SessionSink, SessionSummary};

/// Current schema version stored in `PRAGMA user_version`
const SCHEMA_VERSION: i32 = 3;

/// Saved workout session with its exercises
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub user_id: Option<String>,
    pub title: String,
    pub workout_type: String,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub duration_minutes: Option<i64>,
    pub exercises: Vec<ExerciseRecord>,
}

impl WorkoutRecord {
    pub fn completed_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.completed_sets).sum()
    }

    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_name: String,
    pub sets: u32,
    pub reps: String,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub completed_sets: u32,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn schema_version(&self) -> Result<i32> {
        Ok(self.conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Bring the schema up to `SCHEMA_VERSION`, one step at a time
    fn init_schema(&self) -> Result<()> {
        let mut version = self.schema_version()?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS workouts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT,
                    title TEXT NOT NULL,
                    workout_type TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    notes TEXT,
                    duration_minutes INTEGER
                );
                CREATE TABLE IF NOT EXISTS workout_exercises (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                    exercise_name TEXT NOT NULL,
                    sets INTEGER NOT NULL,
                    reps TEXT NOT NULL,
                    description TEXT,
                    media_url TEXT,
                    completed_sets INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE IF NOT EXISTS user_profile (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL UNIQUE,
                    height_cm REAL,
                    weight_kg REAL,
                    age INTEGER,
                    gender TEXT,
                    body_fat_percentage REAL,
                    muscle_mass_kg REAL,
                    chest_cm REAL,
                    waist_cm REAL,
                    bicep_cm REAL,
                    thigh_cm REAL,
                    notes TEXT,
                    updated_at TEXT NOT NULL
                );",
            )?;
            version = self.set_version(1)?;
        }

        // Legacy databases created before sessions were tagged with a user
        if version < 2 {
            let has_user_id = self
                .conn
                .prepare("SELECT 1 FROM pragma_table_info('workouts') WHERE name = 'user_id'")?
                .exists([])?;
            if !has_user_id {
                self.conn.execute("ALTER TABLE workouts ADD COLUMN user_id TEXT", [])?;
                info!("Migrated workouts table: added user_id");
            }
            version = self.set_version(2)?;
        }

        if version < 3 {
            programs::create_tables(&self.conn)?;
            programs::seed_templates(&self.conn)?;
            version = self.set_version(3)?;
        }

        if version > SCHEMA_VERSION {
            warn!("Database schema {} is newer than supported {}", version, SCHEMA_VERSION);
        }
        debug!("Schema at version {}", version);
        Ok(())
    }

    fn set_version(&self, version: i32) -> Result<i32> {
        self.conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        Ok(version)
    }

    /// Insert a finished session and its exercises in one transaction
    pub fn save_workout(&self, summary: &SessionSummary, user_id: &str) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO workouts (user_id, title, workout_type, completed_at, notes, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                summary.title,
                summary.workout_type,
                summary.ended_at.to_rfc3339(),
                summary.notes,
                summary.duration_minutes,
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO workout_exercises (workout_id, exercise_name, sets, reps, description, media_url, completed_sets)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for ex in &summary.exercises {
                stmt.execute(params![
                    workout_id,
                    ex.exercise_name,
                    ex.sets,
                    ex.reps,
                    ex.description,
                    ex.media_url,
                    ex.completed_sets,
                ])?;
            }
        }

        tx.commit()?;
        info!("Saved workout {} for {} ({} exercises)", workout_id, user_id, summary.exercises.len());
        Ok(workout_id)
    }

    /// All sessions of a user, newest first
    pub fn get_workout_history(&self, user_id: &str) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, workout_type, completed_at, notes, duration_minutes
             FROM workouts WHERE user_id = ?1 ORDER BY completed_at DESC, id DESC",
        )?;

        let mut workouts = stmt
            .query_map([user_id], workout_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for workout in &mut workouts {
            workout.exercises = self.get_workout_exercises(workout.id)?;
        }

        debug!("Loaded {} workouts for {}", workouts.len(), user_id);
        Ok(workouts)
    }

    pub fn get_workout(&self, workout_id: i64, user_id: &str) -> Result<Option<WorkoutRecord>> {
        let workout = self
            .conn
            .query_row(
                "SELECT id, user_id, title, workout_type, completed_at, notes, duration_minutes
                 FROM workouts WHERE id = ?1 AND user_id = ?2",
                params![workout_id, user_id],
                workout_from_row,
            )
            .optional()?;

        match workout {
            Some(mut w) => {
                w.exercises = self.get_workout_exercises(w.id)?;
                Ok(Some(w))
            }
            None => Ok(None),
        }
    }

    fn get_workout_exercises(&self, workout_id: i64) -> Result<Vec<ExerciseRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, workout_id, exercise_name, sets, reps, description, media_url, completed_sets
             FROM workout_exercises WHERE workout_id = ?1 ORDER BY id",
        )?;

        let exercises = stmt
            .query_map([workout_id], |row| {
                Ok(ExerciseRecord {
                    id: row.get(0)?,
                    workout_id: row.get(1)?,
                    exercise_name: row.get(2)?,
                    sets: row.get(3)?,
                    reps: row.get(4)?,
                    description: row.get(5)?,
                    media_url: row.get(6)?,
                    completed_sets: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(exercises)
    }

    /// Delete one of the user's sessions. Exercises go with it.
    pub fn delete_workout(&self, workout_id: i64, user_id: &str) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM workouts WHERE id = ?1 AND user_id = ?2",
            params![workout_id, user_id],
        )?;
        if deleted == 0 {
            return Err(CoreError::NotFound(format!("workout {}", workout_id)));
        }
        info!("Deleted workout {}", workout_id);
        Ok(())
    }

    pub fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        profile::get(&self.conn, user_id)
    }

    /// Create or update the user's body profile
    pub fn save_user_profile(&self, profile: &UserProfile, user_id: &str) -> Result<UserProfile> {
        profile::upsert(&self.conn, profile, user_id)?;
        self.get_user_profile(user_id)?
            .ok_or_else(|| CoreError::PersistenceFailure("profile vanished after save".into()))
    }

    pub fn get_program_categories(&self) -> Result<Vec<ProgramCategory>> {
        programs::get_categories(&self.conn)
    }

    pub fn add_program_category(&self, name: &str, description: Option<&str>) -> Result<i64> {
        programs::add_category(&self.conn, name, description)
    }

    pub fn get_workout_programs(&self, filter: &ProgramFilter) -> Result<Vec<WorkoutProgram>> {
        programs::get_programs(&self.conn, filter)
    }

    /// All categories, each with the programs `filter` selects
    pub fn get_programs_by_category(
        &self,
        filter: &ProgramFilter,
    ) -> Result<Vec<(ProgramCategory, Vec<WorkoutProgram>)>> {
        let categories = self.get_program_categories()?;
        let programs = self.get_workout_programs(filter)?;
        Ok(group_by_category(categories, programs))
    }

    pub fn get_workout_program(&self, program_id: i64) -> Result<WorkoutProgram> {
        programs::get_program(&self.conn, program_id)?
            .ok_or_else(|| CoreError::NotFound(format!("program {}", program_id)))
    }

    /// Validate and store a user-authored program
    pub fn create_workout_program(&self, data: NewProgram, user_id: &str) -> Result<i64> {
        let data = data.validate()?;
        programs::insert_program(&self.conn, &data, user_id)
    }

    /// Copy a template into the user's programs
    pub fn copy_template_program(&self, template_id: i64, user_id: &str, name: Option<&str>) -> Result<i64> {
        let template = self.get_workout_program(template_id)?;
        let data = NewProgram::from_template(&template, name);
        programs::insert_program(&self.conn, &data, user_id)
    }

    pub fn delete_workout_program(&self, program_id: i64, user_id: &str) -> Result<()> {
        programs::delete_program(&self.conn, program_id, user_id)
    }

    pub fn get_program_workout(&self, workout_id: i64) -> Result<(WorkoutProgram, ProgramWorkout)> {
        let program_id: i64 = self
            .conn
            .query_row(
                "SELECT program_id FROM program_workouts WHERE id = ?1",
                [workout_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| CoreError::NotFound(format!("program workout {}", workout_id)))?;

        let mut program = self.get_workout_program(program_id)?;
        let pos = program
            .workouts
            .iter()
            .position(|w| w.id == workout_id)
            .ok_or_else(|| CoreError::NotFound(format!("program workout {}", workout_id)))?;
        let workout = program.workouts.remove(pos);
        Ok((program, workout))
    }
}

impl SessionSink for Database {
    fn save_session(&self, summary: &SessionSummary, user_id: &str) -> Result<i64> {
        self.save_workout(summary, user_id)
    }
}

fn workout_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkoutRecord> {
    let date_str: String = row.get(4)?;
    Ok(WorkoutRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        workout_type: row.get(3)?,
        completed_at: parse_timestamp(&date_str),
        notes: row.get(5)?,
        duration_minutes: row.get(6)?,
        exercises: Vec::new(),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
