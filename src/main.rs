//! setwise - Personal workout tracker
//!
//! Strength checklists, cardio intervals, and a local session history.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use setwise::config::Config;
use setwise::db::{split_templates, Database, NewProgram, ProgramFilter, UserProfile, WorkoutProgram};
use setwise::exercises::BuiltinWorkout;
use setwise::session::{completion_percent, ProgramSource, WorkoutSession};
use setwise::timer::CardioOption;
use setwise::tui::{App, TimerKind};

#[derive(Parser)]
#[command(name = "setwise")]
#[command(author, version, about = "Personal workout tracker")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in strength workout (push, pull, legs-abs)
    Workout {
        workout: BuiltinWorkout,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Run one workout day from a program
    Program {
        /// Program workout id (see `programs --details`)
        workout_id: i64,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Run a cardio session (incline, hiit)
    Cardio {
        option: CardioOption,

        /// Session length in minutes
        #[arg(short, long, default_value_t = CardioOption::DEFAULT_MINUTES)]
        minutes: u32,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List saved sessions
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Delete a saved session
    Delete { id: i64 },

    /// Show or update body measurements
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// List programs (templates and your own)
    Programs {
        /// Filter by category id
        #[arg(short, long)]
        category: Option<i64>,

        /// Only programs created by you
        #[arg(long)]
        mine: bool,

        #[arg(long)]
        goal: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long)]
        equipment: Option<String>,

        /// Print workout days and exercises
        #[arg(short, long)]
        details: bool,

        /// Group programs under their category
        #[arg(long, conflicts_with = "category")]
        by_category: bool,
    },

    /// List program categories, or add one
    Categories {
        #[arg(long)]
        add: Option<String>,

        #[arg(long, requires = "add")]
        description: Option<String>,
    },

    /// Create a program from a JSON file
    CreateProgram { file: PathBuf },

    /// Copy a template program into your programs
    CopyProgram {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete one of your programs
    DeleteProgram { id: i64 },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,

    /// Replace the stored profile (unset fields are cleared)
    Set {
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        body_fat: Option<f64>,
        #[arg(long)]
        muscle_mass: Option<f64>,
        #[arg(long)]
        chest: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        bicep: Option<f64>,
        #[arg(long)]
        thigh: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;
    let user = config.user_id.clone();

    match cli.command {
        Some(Commands::Workout { workout, notes }) => {
            let mut session = WorkoutSession::new(workout.title(), workout.specs(), Utc::now());
            if let Some(n) = notes {
                session.set_notes(&n);
            }
            App::new(db, config, session, TimerKind::Rest).run()?;
        }

        Some(Commands::Program { workout_id, notes }) => {
            let mut session = WorkoutSession::from_loaded(db.load_workout(workout_id)?, Utc::now());
            if let Some(n) = notes {
                session.set_notes(&n);
            }
            App::new(db, config, session, TimerKind::Rest).run()?;
        }

        Some(Commands::Cardio { option, minutes, notes }) => {
            option.validate_minutes(minutes)?;
            let mut session = WorkoutSession::cardio(option, minutes, Utc::now());
            if let Some(n) = notes {
                session.set_notes(&n);
            }
            App::new(db, config, session, TimerKind::Cardio { option, minutes }).run()?;
        }

        Some(Commands::History { limit }) => print_history(&db, &user, limit)?,

        Some(Commands::Delete { id }) => {
            db.delete_workout(id, &user)?;
            println!("Deleted workout {}", id);
        }

        Some(Commands::Profile { action }) => match action {
            None | Some(ProfileAction::Show) => match db.get_user_profile(&user)? {
                Some(profile) => print_profile(&profile),
                None => println!("No profile yet. Use `setwise profile set --height .. --weight ..`"),
            },
            Some(ProfileAction::Set {
                height,
                weight,
                age,
                gender,
                body_fat,
                muscle_mass,
                chest,
                waist,
                bicep,
                thigh,
                notes,
            }) => {
                let profile = UserProfile {
                    height_cm: height,
                    weight_kg: weight,
                    age,
                    gender,
                    body_fat_percentage: body_fat,
                    muscle_mass_kg: muscle_mass,
                    chest_cm: chest,
                    waist_cm: waist,
                    bicep_cm: bicep,
                    thigh_cm: thigh,
                    notes,
                    updated_at: None,
                };
                let saved = db.save_user_profile(&profile, &user)?;
                println!("Profile saved");
                print_profile(&saved);
            }
        },

        Some(Commands::Programs { category, mine, goal, difficulty, equipment, details, by_category }) => {
            let filter = ProgramFilter {
                user_id: Some(user.clone()),
                include_templates: !mine,
                category_id: category,
                target_goal: goal,
                difficulty_level: difficulty,
                equipment_type: equipment,
                program_type: None,
            };

            if by_category {
                for (c, programs) in db.get_programs_by_category(&filter)? {
                    println!("{} ({})", c.name, programs.len());
                    println!("{:-<60}", "");
                    for p in &programs {
                        print_program(p, details);
                    }
                    println!();
                }
                return Ok(());
            }

            let (templates, own) = split_templates(db.get_workout_programs(&filter)?);

            if !templates.is_empty() {
                println!("Templates");
                println!("{:-<60}", "");
                for p in &templates {
                    print_program(p, details);
                }
            }
            println!("My programs");
            println!("{:-<60}", "");
            if own.is_empty() {
                println!("(none - try `setwise copy-program <id>`)");
            }
            for p in &own {
                print_program(p, details);
            }
        }

        Some(Commands::Categories { add, description }) => {
            if let Some(name) = add {
                let id = db.add_program_category(&name, description.as_deref())?;
                println!("Added category: {} (id: {})", name, id);
            }
            for c in db.get_program_categories()? {
                println!("{:3} | {:20} | {}", c.id, c.name, c.description.as_deref().unwrap_or("-"));
            }
        }

        Some(Commands::CreateProgram { file }) => {
            let raw = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let data: NewProgram = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
            let id = db.create_workout_program(data, &user)?;
            println!("Created program (id: {})", id);
        }

        Some(Commands::CopyProgram { id, name }) => {
            let new_id = db.copy_template_program(id, &user, name.as_deref())?;
            println!("Copied program {} -> {}", id, new_id);
        }

        Some(Commands::DeleteProgram { id }) => {
            db.delete_workout_program(id, &user)?;
            println!("Deleted program {}", id);
        }

        None => {
            println!("Workouts:");
            for w in BuiltinWorkout::all() {
                println!("  {} {:14} setwise workout {}", w.emoji(), w.title(), w);
            }
            println!();
            print_history(&db, &user, 5)?;
        }
    }

    Ok(())
}

fn print_history(db: &Database, user: &str, limit: usize) -> Result<()> {
    let workouts = db.get_workout_history(user)?;
    println!("Recent workouts:");
    println!("{:-<72}", "");
    for w in workouts.iter().take(limit) {
        println!(
            "{:4} | {} | {:28} | {:>3} min | {}/{} sets ({:.0}%) | {}",
            w.id,
            w.completed_at.format("%Y-%m-%d %H:%M"),
            w.title,
            w.duration_minutes.unwrap_or(0),
            w.completed_sets(),
            w.total_sets(),
            completion_percent(w.completed_sets(), w.total_sets()),
            w.notes.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn print_profile(p: &UserProfile) {
    let show = |label: &str, v: Option<f64>, unit: &str| {
        if let Some(v) = v {
            println!("{:14} {:.1} {}", label, v, unit);
        }
    };
    show("Height", p.height_cm, "cm");
    show("Weight", p.weight_kg, "kg");
    if let Some(age) = p.age {
        println!("{:14} {}", "Age", age);
    }
    if let Some(g) = &p.gender {
        println!("{:14} {}", "Gender", g);
    }
    show("Body fat", p.body_fat_percentage, "%");
    show("Muscle mass", p.muscle_mass_kg, "kg");
    show("Chest", p.chest_cm, "cm");
    show("Waist", p.waist_cm, "cm");
    show("Bicep", p.bicep_cm, "cm");
    show("Thigh", p.thigh_cm, "cm");
    show("BMI", p.bmi(), "");
    if let Some((low, high)) = p.healthy_weight_range() {
        println!("{:14} {:.1}-{:.1} kg", "Healthy range", low, high);
    }
    if let Some(n) = &p.notes {
        println!("{:14} {}", "Notes", n);
    }
}

fn print_program(p: &WorkoutProgram, details: bool) {
    println!(
        "{:4} | {:24} | {} | {} workouts, {} exercises",
        p.id,
        p.name,
        p.difficulty_level.as_deref().unwrap_or("-"),
        p.workouts.len(),
        p.exercise_count()
    );
    if !details {
        return;
    }
    for w in &p.workouts {
        println!("       day {} - {} (workout id: {})", w.day_number, w.name, w.id);
        for e in &w.exercises {
            println!("         {:24} {}x{}", e.exercise_name, e.sets, e.reps);
        }
    }
}
