//! Program catalogue: category -> program -> workout -> exercise

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::exercises::BuiltinWorkout;
use crate::session::{ExerciseSpec, LoadedWorkout, ProgramSource};

use super::Database;

const DEFAULT_DURATION_WEEKS: u32 = 4;
const DEFAULT_FREQUENCY_PER_WEEK: u32 = 3;
const DEFAULT_DIFFICULTY: &str = "intermediate";
const DEFAULT_WORKOUT_MINUTES: u32 = 60;
const DEFAULT_REST_SECS: u32 = 60;

const DAY_NAMES: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutProgram {
    pub id: i64,
    pub user_id: Option<String>,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub is_template: bool,
    pub is_public: bool,
    pub duration_weeks: Option<u32>,
    pub frequency_per_week: Option<u32>,
    pub difficulty_level: Option<String>,
    pub target_goal: Option<String>,
    pub equipment_type: Option<String>,
    pub program_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub category: Option<ProgramCategory>,
    /// Sorted by day number
    pub workouts: Vec<ProgramWorkout>,
}

impl WorkoutProgram {
    pub fn exercise_count(&self) -> usize {
        self.workouts.iter().map(|w| w.exercises.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramWorkout {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub day_number: u32,
    pub week_number: Option<u32>,
    pub estimated_duration_minutes: Option<u32>,
    /// Sorted by order index
    pub exercises: Vec<ProgramExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramExercise {
    pub id: i64,
    pub program_workout_id: i64,
    pub exercise_name: String,
    pub sets: u32,
    pub reps: String,
    pub rest_seconds: Option<u32>,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub order_index: Option<u32>,
}

impl ProgramExercise {
    pub fn to_spec(&self) -> ExerciseSpec {
        ExerciseSpec {
            name: self.exercise_name.clone(),
            sets: self.sets,
            reps: self.reps.clone(),
            description: self.description.clone().unwrap_or_default(),
            media_ref: self.media_url.clone(),
        }
    }
}

/// Query filter for program listing. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    pub user_id: Option<String>,
    pub include_templates: bool,
    pub category_id: Option<i64>,
    pub target_goal: Option<String>,
    pub difficulty_level: Option<String>,
    pub equipment_type: Option<String>,
    pub program_type: Option<String>,
}

/// User-authored program, as submitted (e.g. from a JSON file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProgram {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub frequency_per_week: Option<u32>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub target_goal: Option<String>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub program_type: Option<String>,
    #[serde(default)]
    pub workouts: Vec<NewProgramWorkout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProgramWorkout {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub day_number: u32,
    #[serde(default)]
    pub week_number: Option<u32>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<NewProgramExercise>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProgramExercise {
    pub exercise_name: String,
    pub sets: u32,
    pub reps: String,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub order_index: Option<u32>,
}

impl NewProgram {
    /// Check required fields and drop empty entries.
    ///
    /// Exercises without a name and workouts without exercises are removed;
    /// an unnamed workout gets "<Weekday> Workout".
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CoreError::invalid("program name is required"));
        }
        if self.category_id.is_none() {
            return Err(CoreError::invalid("program category is required"));
        }

        self.workouts = self
            .workouts
            .into_iter()
            .filter_map(|mut w| {
                w.exercises.retain(|e| !e.exercise_name.trim().is_empty());
                if w.exercises.is_empty() {
                    return None;
                }
                if w.name.trim().is_empty() {
                    w.name = default_workout_name(w.day_number);
                }
                Some(w)
            })
            .collect();

        if self.workouts.is_empty() {
            return Err(CoreError::invalid("add at least one workout with exercises"));
        }

        if let Some(ex) = self
            .workouts
            .iter()
            .flat_map(|w| w.exercises.iter())
            .find(|e| e.sets == 0)
        {
            return Err(CoreError::invalid(format!("{} needs at least one set", ex.exercise_name)));
        }

        Ok(self)
    }

    /// Program data for a personal copy of `template`
    pub fn from_template(template: &WorkoutProgram, name: Option<&str>) -> Self {
        Self {
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("My {}", template.name)),
            description: template.description.clone(),
            category_id: template.category_id,
            duration_weeks: template.duration_weeks,
            frequency_per_week: template.frequency_per_week,
            difficulty_level: template.difficulty_level.clone(),
            target_goal: template.target_goal.clone(),
            equipment_type: template.equipment_type.clone(),
            program_type: template.program_type.clone(),
            workouts: template
                .workouts
                .iter()
                .map(|w| NewProgramWorkout {
                    name: w.name.clone(),
                    description: w.description.clone(),
                    day_number: w.day_number,
                    week_number: w.week_number,
                    estimated_duration_minutes: w.estimated_duration_minutes,
                    exercises: w
                        .exercises
                        .iter()
                        .map(|e| NewProgramExercise {
                            exercise_name: e.exercise_name.clone(),
                            sets: e.sets,
                            reps: e.reps.clone(),
                            rest_seconds: e.rest_seconds,
                            description: e.description.clone(),
                            media_url: e.media_url.clone(),
                            order_index: e.order_index,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn default_workout_name(day_number: u32) -> String {
    match DAY_NAMES.get((day_number as usize).wrapping_sub(1)) {
        Some(day) => format!("{} Workout", day),
        None => format!("Day {} Workout", day_number),
    }
}

/// Partition into (templates, user programs), keeping order
pub fn split_templates(programs: Vec<WorkoutProgram>) -> (Vec<WorkoutProgram>, Vec<WorkoutProgram>) {
    programs.into_iter().partition(|p| p.is_template)
}

/// Every category with its programs, in category order. Programs whose
/// category is unknown are left out.
pub fn group_by_category(
    categories: Vec<ProgramCategory>,
    programs: Vec<WorkoutProgram>,
) -> Vec<(ProgramCategory, Vec<WorkoutProgram>)> {
    let mut groups: Vec<(ProgramCategory, Vec<WorkoutProgram>)> =
        categories.into_iter().map(|c| (c, Vec::new())).collect();
    for program in programs {
        if let Some((_, list)) = groups
            .iter_mut()
            .find(|(c, _)| Some(c.id) == program.category_id)
        {
            list.push(program);
        }
    }
    groups
}

pub(super) fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS program_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            icon TEXT,
            color TEXT
        );
        CREATE TABLE IF NOT EXISTS workout_programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT,
            category_id INTEGER REFERENCES program_categories(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            description TEXT,
            is_template INTEGER NOT NULL DEFAULT 0,
            is_public INTEGER NOT NULL DEFAULT 0,
            duration_weeks INTEGER,
            frequency_per_week INTEGER,
            difficulty_level TEXT,
            target_goal TEXT,
            equipment_type TEXT,
            program_type TEXT,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS program_workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_id INTEGER NOT NULL REFERENCES workout_programs(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            day_number INTEGER NOT NULL,
            week_number INTEGER,
            estimated_duration_minutes INTEGER
        );
        CREATE TABLE IF NOT EXISTS program_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            program_workout_id INTEGER NOT NULL REFERENCES program_workouts(id) ON DELETE CASCADE,
            exercise_name TEXT NOT NULL,
            sets INTEGER NOT NULL,
            reps TEXT NOT NULL,
            rest_seconds INTEGER,
            description TEXT,
            media_url TEXT,
            order_index INTEGER
        );",
    )?;
    Ok(())
}

/// Seed the built-in push/pull/legs split as a template program
pub(super) fn seed_templates(conn: &Connection) -> Result<()> {
    let category_id = add_category(conn, "Strength", Some("Barbell and dumbbell strength training"))?;

    let program = NewProgram {
        name: "Push Pull Legs".to_string(),
        description: Some("Classic three day split".to_string()),
        category_id: Some(category_id),
        difficulty_level: Some(DEFAULT_DIFFICULTY.to_string()),
        target_goal: Some("muscle_gain".to_string()),
        equipment_type: Some("gym".to_string()),
        program_type: Some("split".to_string()),
        workouts: BuiltinWorkout::all()
            .iter()
            .enumerate()
            .map(|(i, w)| NewProgramWorkout {
                name: w.title().to_string(),
                day_number: i as u32 + 1,
                exercises: w
                    .exercises()
                    .iter()
                    .map(|e| NewProgramExercise {
                        exercise_name: e.name.to_string(),
                        sets: e.sets,
                        reps: e.reps.to_string(),
                        description: Some(e.description.to_string()),
                        media_url: Some(e.media.to_string()),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let id = insert(conn, &program, None, true)?;
    info!("Seeded template program {}", id);
    Ok(())
}

pub(super) fn get_categories(conn: &Connection) -> Result<Vec<ProgramCategory>> {
    let mut stmt = conn.prepare("SELECT id, name, description, icon, color FROM program_categories ORDER BY name")?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub(super) fn add_category(conn: &Connection, name: &str, description: Option<&str>) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::invalid("category name is required"));
    }
    conn.execute(
        "INSERT INTO program_categories (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgramCategory> {
    Ok(ProgramCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
    })
}

const PROGRAM_COLUMNS: &str = "id, user_id, category_id, name, description, is_template, is_public,
    duration_weeks, frequency_per_week, difficulty_level, target_goal, equipment_type, program_type, created_at";

fn program_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkoutProgram> {
    let created: String = row.get(13)?;
    Ok(WorkoutProgram {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        is_template: row.get(5)?,
        is_public: row.get(6)?,
        duration_weeks: row.get(7)?,
        frequency_per_week: row.get(8)?,
        difficulty_level: row.get(9)?,
        target_goal: row.get(10)?,
        equipment_type: row.get(11)?,
        program_type: row.get(12)?,
        created_at: super::parse_timestamp(&created),
        category: None,
        workouts: Vec::new(),
    })
}

pub(super) fn get_programs(conn: &Connection, filter: &ProgramFilter) -> Result<Vec<WorkoutProgram>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    match (&filter.user_id, filter.include_templates) {
        (Some(user), true) => {
            clauses.push("(user_id = ? OR is_template = 1)".to_string());
            values.push(Value::Text(user.clone()));
        }
        (Some(user), false) => {
            clauses.push("user_id = ?".to_string());
            values.push(Value::Text(user.clone()));
        }
        (None, true) => clauses.push("is_template = 1".to_string()),
        (None, false) => {}
    }

    if let Some(category_id) = filter.category_id {
        clauses.push("category_id = ?".to_string());
        values.push(Value::Integer(category_id));
    }

    let text_filters = [
        ("target_goal", &filter.target_goal),
        ("difficulty_level", &filter.difficulty_level),
        ("equipment_type", &filter.equipment_type),
        ("program_type", &filter.program_type),
    ];
    for (column, value) in text_filters {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            clauses.push(format!("{} = ?", column));
            values.push(Value::Text(v.clone()));
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {} FROM workout_programs {} ORDER BY created_at DESC, id DESC",
        PROGRAM_COLUMNS, where_sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut programs = stmt
        .query_map(params_from_iter(values), program_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for program in &mut programs {
        load_children(conn, program)?;
    }

    debug!("Program query returned {}", programs.len());
    Ok(programs)
}

pub(super) fn get_program(conn: &Connection, program_id: i64) -> Result<Option<WorkoutProgram>> {
    let program = conn
        .query_row(
            &format!("SELECT {} FROM workout_programs WHERE id = ?1", PROGRAM_COLUMNS),
            [program_id],
            program_from_row,
        )
        .optional()?;

    match program {
        Some(mut p) => {
            load_children(conn, &mut p)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

/// Attach category, workouts and exercises, sorted for display
fn load_children(conn: &Connection, program: &mut WorkoutProgram) -> Result<()> {
    program.category = match program.category_id {
        Some(id) => conn
            .query_row(
                "SELECT id, name, description, icon, color FROM program_categories WHERE id = ?1",
                [id],
                category_from_row,
            )
            .optional()?,
        None => None,
    };

    let mut stmt = conn.prepare_cached(
        "SELECT id, program_id, name, description, day_number, week_number, estimated_duration_minutes
         FROM program_workouts WHERE program_id = ?1",
    )?;
    let mut workouts = stmt
        .query_map([program.id], |row| {
            Ok(ProgramWorkout {
                id: row.get(0)?,
                program_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                day_number: row.get(4)?,
                week_number: row.get(5)?,
                estimated_duration_minutes: row.get(6)?,
                exercises: Vec::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut ex_stmt = conn.prepare_cached(
        "SELECT id, program_workout_id, exercise_name, sets, reps, rest_seconds, description, media_url, order_index
         FROM program_exercises WHERE program_workout_id = ?1 ORDER BY id",
    )?;
    for workout in &mut workouts {
        workout.exercises = ex_stmt
            .query_map([workout.id], |row| {
                Ok(ProgramExercise {
                    id: row.get(0)?,
                    program_workout_id: row.get(1)?,
                    exercise_name: row.get(2)?,
                    sets: row.get(3)?,
                    reps: row.get(4)?,
                    rest_seconds: row.get(5)?,
                    description: row.get(6)?,
                    media_url: row.get(7)?,
                    order_index: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        workout.exercises.sort_by_key(|e| e.order_index.unwrap_or(0));
    }

    workouts.sort_by_key(|w| w.day_number);
    program.workouts = workouts;
    Ok(())
}

/// Store a program owned by `user_id`, applying defaults
pub(super) fn insert_program(conn: &Connection, data: &NewProgram, user_id: &str) -> Result<i64> {
    let id = insert(conn, data, Some(user_id), false)?;
    info!("Created program {} '{}' for {}", id, data.name, user_id);
    Ok(id)
}

fn insert(conn: &Connection, data: &NewProgram, user_id: Option<&str>, is_template: bool) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO workout_programs (user_id, category_id, name, description, is_template, is_public,
            duration_weeks, frequency_per_week, difficulty_level, target_goal, equipment_type, program_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user_id,
            data.category_id,
            data.name,
            data.description,
            is_template,
            is_template,
            data.duration_weeks.unwrap_or(DEFAULT_DURATION_WEEKS),
            data.frequency_per_week.unwrap_or(DEFAULT_FREQUENCY_PER_WEEK),
            data.difficulty_level.as_deref().unwrap_or(DEFAULT_DIFFICULTY),
            data.target_goal,
            data.equipment_type,
            data.program_type,
            Utc::now().to_rfc3339(),
        ],
    )?;
    let program_id = tx.last_insert_rowid();

    for workout in &data.workouts {
        tx.execute(
            "INSERT INTO program_workouts (program_id, name, description, day_number, week_number, estimated_duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                program_id,
                workout.name,
                workout.description,
                workout.day_number,
                workout.week_number.unwrap_or(1),
                workout.estimated_duration_minutes.unwrap_or(DEFAULT_WORKOUT_MINUTES),
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare_cached(
            "INSERT INTO program_exercises (program_workout_id, exercise_name, sets, reps, rest_seconds,
                description, media_url, order_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (index, ex) in workout.exercises.iter().enumerate() {
            stmt.execute(params![
                workout_id,
                ex.exercise_name,
                ex.sets,
                ex.reps,
                ex.rest_seconds.unwrap_or(DEFAULT_REST_SECS),
                ex.description,
                ex.media_url,
                ex.order_index.unwrap_or(index as u32 + 1),
            ])?;
        }
    }

    tx.commit()?;
    Ok(program_id)
}

pub(super) fn delete_program(conn: &Connection, program_id: i64, user_id: &str) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM workout_programs WHERE id = ?1 AND user_id = ?2",
        params![program_id, user_id],
    )?;
    if deleted == 0 {
        return Err(CoreError::NotFound(format!("program {}", program_id)));
    }
    info!("Deleted program {}", program_id);
    Ok(())
}

impl ProgramSource for Database {
    /// Session title is "<program> - <workout>"
    fn load_workout(&self, workout_id: i64) -> Result<LoadedWorkout> {
        let (program, workout) = self.get_program_workout(workout_id)?;
        Ok(LoadedWorkout {
            title: format!("{} - {}", program.name, workout.name),
            workout_type: "program-based".to_string(),
            exercises: workout.exercises.iter().map(ProgramExercise::to_spec).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn exercise(name: &str) -> NewProgramExercise {
        NewProgramExercise {
            exercise_name: name.to_string(),
            sets: 3,
            reps: "10".to_string(),
            ..Default::default()
        }
    }

    fn program(category_id: Option<i64>) -> NewProgram {
        NewProgram {
            name: "  Home Basics ".to_string(),
            category_id,
            workouts: vec![
                NewProgramWorkout {
                    day_number: 3,
                    exercises: vec![exercise("Lunges"), exercise(" ")],
                    ..Default::default()
                },
                NewProgramWorkout {
                    name: "Rest".to_string(),
                    day_number: 4,
                    exercises: vec![],
                    ..Default::default()
                },
                NewProgramWorkout {
                    name: "Upper".to_string(),
                    day_number: 1,
                    exercises: vec![
                        NewProgramExercise { order_index: Some(2), ..exercise("Push-ups") },
                        NewProgramExercise { order_index: Some(1), ..exercise("Rows") },
                    ],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_cleans_up() {
        let p = program(Some(1)).validate().unwrap();
        assert_eq!(p.name, "Home Basics");
        assert_eq!(p.workouts.len(), 2);
        assert_eq!(p.workouts[0].name, "Wednesday Workout");
        assert_eq!(p.workouts[0].exercises.len(), 1);
    }

    #[test]
    fn test_validate_rejects() {
        assert_matches!(program(None).validate(), Err(CoreError::InvalidArgument(_)));

        let unnamed = NewProgram { name: " ".into(), ..program(Some(1)) };
        assert_matches!(unnamed.validate(), Err(CoreError::InvalidArgument(_)));

        let empty = NewProgram { workouts: vec![], ..program(Some(1)) };
        assert_matches!(empty.validate(), Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_workout_name() {
        assert_eq!(default_workout_name(1), "Monday Workout");
        assert_eq!(default_workout_name(7), "Sunday Workout");
        assert_eq!(default_workout_name(0), "Day 0 Workout");
        assert_eq!(default_workout_name(9), "Day 9 Workout");
    }

    #[test]
    fn test_seeded_template() {
        let db = Database::open_in_memory().unwrap();
        let templates = db
            .get_workout_programs(&ProgramFilter { include_templates: true, ..Default::default() })
            .unwrap();
        assert_eq!(templates.len(), 1);
        let t = &templates[0];
        assert!(t.is_template);
        assert_eq!(t.workouts.len(), 3);
        assert_eq!(t.exercise_count(), 18);
        assert_eq!(t.category.as_ref().map(|c| c.name.as_str()), Some("Strength"));
        assert_eq!(t.workouts[0].exercises[0].exercise_name, "Bench Press");
        assert_eq!(t.workouts[0].exercises[0].rest_seconds, Some(60));
    }

    #[test]
    fn test_create_sorts_and_defaults() {
        let db = Database::open_in_memory().unwrap();
        let cat = db.add_program_category("Home", None).unwrap();
        let id = db.create_workout_program(program(Some(cat)), "u1").unwrap();

        let p = db.get_workout_program(id).unwrap();
        assert!(!p.is_template);
        assert_eq!(p.user_id.as_deref(), Some("u1"));
        assert_eq!(p.duration_weeks, Some(4));
        assert_eq!(p.frequency_per_week, Some(3));
        assert_eq!(p.difficulty_level.as_deref(), Some("intermediate"));

        let days: Vec<u32> = p.workouts.iter().map(|w| w.day_number).collect();
        assert_eq!(days, vec![1, 3]);
        let names: Vec<&str> = p.workouts[0].exercises.iter().map(|e| e.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["Rows", "Push-ups"]);
        assert_eq!(p.workouts[1].estimated_duration_minutes, Some(60));
        assert_eq!(p.workouts[1].week_number, Some(1));
    }

    #[test]
    fn test_filtering() {
        let db = Database::open_in_memory().unwrap();
        let home = db.add_program_category("Home", None).unwrap();
        let mut mine = program(Some(home));
        mine.difficulty_level = Some("beginner".into());
        db.create_workout_program(mine, "u1").unwrap();
        db.create_workout_program(program(Some(home)), "u2").unwrap();

        let both = db
            .get_workout_programs(&ProgramFilter {
                user_id: Some("u1".into()),
                include_templates: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(both.len(), 2);
        let (templates, user) = split_templates(both);
        assert_eq!(templates.len(), 1);
        assert_eq!(user.len(), 1);

        let only_mine = db
            .get_workout_programs(&ProgramFilter { user_id: Some("u1".into()), ..Default::default() })
            .unwrap();
        assert_eq!(only_mine.len(), 1);

        let home_beginner = db
            .get_workout_programs(&ProgramFilter {
                category_id: Some(home),
                difficulty_level: Some("beginner".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(home_beginner.len(), 1);
        assert_eq!(home_beginner[0].user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_group_by_category() {
        let db = Database::open_in_memory().unwrap();
        let home = db.add_program_category("Home", None).unwrap();
        db.create_workout_program(program(Some(home)), "u1").unwrap();
        db.add_program_category("Mobility", None).unwrap();

        let filter = ProgramFilter {
            user_id: Some("u1".into()),
            include_templates: true,
            ..Default::default()
        };
        let groups = db.get_programs_by_category(&filter).unwrap();
        let names: Vec<(&str, usize)> = groups.iter().map(|(c, p)| (c.name.as_str(), p.len())).collect();
        assert_eq!(names, vec![("Home", 1), ("Mobility", 0), ("Strength", 1)]);
        assert_eq!(groups[0].1[0].name, "Home Basics");
        assert!(groups[2].1[0].is_template);
    }

    #[test]
    fn test_copy_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let template_id = db
            .get_workout_programs(&ProgramFilter { include_templates: true, ..Default::default() })
            .unwrap()[0]
            .id;

        let copy_id = db.copy_template_program(template_id, "u1", None).unwrap();
        let copy = db.get_workout_program(copy_id).unwrap();
        assert_eq!(copy.name, "My Push Pull Legs");
        assert!(!copy.is_template);
        assert_eq!(copy.exercise_count(), 18);

        assert_matches!(db.delete_workout_program(template_id, "u1"), Err(CoreError::NotFound(_)));
        db.delete_workout_program(copy_id, "u1").unwrap();
        assert_matches!(db.get_workout_program(copy_id), Err(CoreError::NotFound(_)));
    }

    #[test]
    fn test_load_workout_for_session() {
        let db = Database::open_in_memory().unwrap();
        let template = db
            .get_workout_programs(&ProgramFilter { include_templates: true, ..Default::default() })
            .unwrap()
            .remove(0);
        let pull = &template.workouts[1];

        let loaded = db.load_workout(pull.id).unwrap();
        assert_eq!(loaded.title, "Push Pull Legs - PULL WORKOUT");
        assert_eq!(loaded.workout_type, "program-based");
        assert_eq!(loaded.exercises.len(), 6);
        assert_eq!(loaded.exercises[0].name, "Pull-ups");

        assert_matches!(db.load_workout(9999), Err(CoreError::NotFound(_)));
    }
}
