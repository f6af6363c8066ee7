//! Built-in workouts - fixed push / pull / legs programs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::session::ExerciseSpec;

#[derive(Debug, Clone)]
pub struct Exercise {
    pub name: &'static str,
    pub sets: u32,
    pub reps: &'static str,
    pub description: &'static str,
    pub media: &'static str,
}

impl Exercise {
    pub fn to_spec(&self) -> ExerciseSpec {
        ExerciseSpec {
            name: self.name.to_string(),
            sets: self.sets,
            reps: self.reps.to_string(),
            description: self.description.to_string(),
            media_ref: Some(self.media.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BuiltinWorkout {
    Push,
    Pull,
    LegsAbs,
}

impl BuiltinWorkout {
    pub fn all() -> &'static [BuiltinWorkout] {
        &[BuiltinWorkout::Push, BuiltinWorkout::Pull, BuiltinWorkout::LegsAbs]
    }

    pub fn title(&self) -> &'static str {
        match self {
            BuiltinWorkout::Push => "PUSH WORKOUT",
            BuiltinWorkout::Pull => "PULL WORKOUT",
            BuiltinWorkout::LegsAbs => "LEGS & ABS WORKOUT",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            BuiltinWorkout::Push => "💪",
            BuiltinWorkout::Pull => "🏋️",
            BuiltinWorkout::LegsAbs => "🦵",
        }
    }

    pub fn exercises(&self) -> &'static [Exercise] {
        match self {
            BuiltinWorkout::Push => PUSH_EXERCISES,
            BuiltinWorkout::Pull => PULL_EXERCISES,
            BuiltinWorkout::LegsAbs => LEGS_ABS_EXERCISES,
        }
    }

    pub fn specs(&self) -> Vec<ExerciseSpec> {
        self.exercises().iter().map(Exercise::to_spec).collect()
    }
}

impl fmt::Display for BuiltinWorkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            BuiltinWorkout::Push => "push",
            BuiltinWorkout::Pull => "pull",
            BuiltinWorkout::LegsAbs => "legs-abs",
        };
        write!(f, "{}", slug)
    }
}

impl FromStr for BuiltinWorkout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(BuiltinWorkout::Push),
            "pull" => Ok(BuiltinWorkout::Pull),
            "legs-abs" | "legs" | "legs&abs" => Ok(BuiltinWorkout::LegsAbs),
            other => Err(CoreError::invalid(format!("unknown workout: {}", other))),
        }
    }
}

pub const PUSH_EXERCISES: &[Exercise] = &[
    Exercise {
        name: "Bench Press",
        sets: 4,
        reps: "8-10",
        description: "Lie on bench, lower bar to chest, press up with control",
        media: "/placeholder.svg?height=200&width=300&text=Bench+Press",
    },
    Exercise {
        name: "Overhead Press",
        sets: 3,
        reps: "8-10",
        description: "Press barbell overhead from shoulder height, keep core tight",
        media: "/placeholder.svg?height=200&width=300&text=Overhead+Press",
    },
    Exercise {
        name: "Incline Dumbbell Press",
        sets: 3,
        reps: "10-12",
        description: "Press dumbbells on incline bench, focus on upper chest",
        media: "/placeholder.svg?height=200&width=300&text=Incline+Press",
    },
    Exercise {
        name: "Lateral Raises",
        sets: 3,
        reps: "12-15",
        description: "Raise dumbbells to sides until parallel with floor",
        media: "/placeholder.svg?height=200&width=300&text=Lateral+Raises",
    },
    Exercise {
        name: "Tricep Dips",
        sets: 3,
        reps: "10-15",
        description: "Lower body by bending arms, push back up",
        media: "/placeholder.svg?height=200&width=300&text=Tricep+Dips",
    },
    Exercise {
        name: "Push-ups",
        sets: 3,
        reps: "15-20",
        description: "Classic push-up with proper form and full range of motion",
        media: "/placeholder.svg?height=200&width=300&text=Push+Ups",
    },
];

pub const PULL_EXERCISES: &[Exercise] = &[
    Exercise {
        name: "Pull-ups",
        sets: 4,
        reps: "6-10",
        description: "Hang from bar, pull body up until chin over bar",
        media: "/placeholder.svg?height=200&width=300&text=Pull+Ups",
    },
    Exercise {
        name: "Barbell Rows",
        sets: 4,
        reps: "8-10",
        description: "Bend over, pull barbell to lower chest, squeeze shoulder blades",
        media: "/placeholder.svg?height=200&width=300&text=Barbell+Rows",
    },
    Exercise {
        name: "Lat Pulldowns",
        sets: 3,
        reps: "10-12",
        description: "Pull bar down to upper chest, focus on lat engagement",
        media: "/placeholder.svg?height=200&width=300&text=Lat+Pulldowns",
    },
    Exercise {
        name: "Seated Cable Rows",
        sets: 3,
        reps: "10-12",
        description: "Pull cable to torso, squeeze shoulder blades together",
        media: "/placeholder.svg?height=200&width=300&text=Cable+Rows",
    },
    Exercise {
        name: "Bicep Curls",
        sets: 3,
        reps: "12-15",
        description: "Curl dumbbells up, control the negative movement",
        media: "/placeholder.svg?height=200&width=300&text=Bicep+Curls",
    },
    Exercise {
        name: "Face Pulls",
        sets: 3,
        reps: "15-20",
        description: "Pull cable to face level, focus on rear delts",
        media: "/placeholder.svg?height=200&width=300&text=Face+Pulls",
    },
];

pub const LEGS_ABS_EXERCISES: &[Exercise] = &[
    Exercise {
        name: "Squats",
        sets: 4,
        reps: "10-12",
        description: "Lower body until thighs parallel, drive through heels",
        media: "/placeholder.svg?height=200&width=300&text=Squats",
    },
    Exercise {
        name: "Romanian Deadlifts",
        sets: 4,
        reps: "8-10",
        description: "Hinge at hips, lower bar while keeping back straight",
        media: "/placeholder.svg?height=200&width=300&text=Romanian+Deadlifts",
    },
    Exercise {
        name: "Bulgarian Split Squats",
        sets: 3,
        reps: "10-12 each leg",
        description: "Rear foot elevated, lower into lunge position",
        media: "/placeholder.svg?height=200&width=300&text=Bulgarian+Split+Squats",
    },
    Exercise {
        name: "Leg Press",
        sets: 3,
        reps: "12-15",
        description: "Press weight with legs, full range of motion",
        media: "/placeholder.svg?height=200&width=300&text=Leg+Press",
    },
    Exercise {
        name: "Plank",
        sets: 3,
        reps: "30-60 seconds",
        description: "Hold plank position, keep core tight and body straight",
        media: "/placeholder.svg?height=200&width=300&text=Plank",
    },
    Exercise {
        name: "Russian Twists",
        sets: 3,
        reps: "20-30",
        description: "Sit with feet elevated, rotate torso side to side",
        media: "/placeholder.svg?height=200&width=300&text=Russian+Twists",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{workout_type_tag, WorkoutSession};
    use chrono::Utc;

    #[test]
    fn test_every_workout_has_six_exercises() {
        for w in BuiltinWorkout::all() {
            assert_eq!(w.exercises().len(), 6, "{}", w);
            assert!(w.exercises().iter().all(|e| e.sets > 0));
        }
    }

    #[test]
    fn test_parse_roundtrip_slug() {
        for w in BuiltinWorkout::all() {
            assert_eq!(w.to_string().parse::<BuiltinWorkout>().unwrap(), *w);
        }
        assert!("arms".parse::<BuiltinWorkout>().is_err());
    }

    #[test]
    fn test_session_from_builtin() {
        let session = WorkoutSession::new(BuiltinWorkout::Pull.title(), BuiltinWorkout::Pull.specs(), Utc::now());
        assert_eq!(session.exercises().len(), 6);
        assert_eq!(session.exercises()[0].target_sets(), 4);
        assert_eq!(session.exercises()[5].exercise_id, 6);
        assert_eq!(session.meta().workout_type, workout_type_tag("PULL WORKOUT"));
    }
}
