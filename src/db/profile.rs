//! Body measurement profile (one row per user)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Healthy BMI bounds used for the weight range hint
const BMI_HEALTHY_LOW: f64 = 18.5;
const BMI_HEALTHY_HIGH: f64 = 24.9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub body_fat_percentage: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub chest_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub bicep_cm: Option<f64>,
    pub thigh_cm: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Body mass index, when both height and weight are known
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height_cm? / 100.0;
        let weight = self.weight_kg?;
        Some(weight / (height_m * height_m))
    }

    /// Weight range (kg) for a healthy BMI at this height
    pub fn healthy_weight_range(&self) -> Option<(f64, f64)> {
        let height_m = self.height_cm? / 100.0;
        let sq = height_m * height_m;
        Some((BMI_HEALTHY_LOW * sq, BMI_HEALTHY_HIGH * sq))
    }

    /// Zero or negative measurements and blank text count as "not set"
    fn normalized(&self) -> Self {
        let pos = |v: Option<f64>| v.filter(|x| *x > 0.0);
        let text = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            height_cm: pos(self.height_cm),
            weight_kg: pos(self.weight_kg),
            age: self.age.filter(|a| *a > 0),
            gender: text(&self.gender),
            body_fat_percentage: pos(self.body_fat_percentage),
            muscle_mass_kg: pos(self.muscle_mass_kg),
            chest_cm: pos(self.chest_cm),
            waist_cm: pos(self.waist_cm),
            bicep_cm: pos(self.bicep_cm),
            thigh_cm: pos(self.thigh_cm),
            notes: text(&self.notes),
            updated_at: self.updated_at,
        }
    }
}

pub(super) fn get(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    let profile = conn
        .query_row(
            "SELECT height_cm, weight_kg, age, gender, body_fat_percentage, muscle_mass_kg,
                    chest_cm, waist_cm, bicep_cm, thigh_cm, notes, updated_at
             FROM user_profile WHERE user_id = ?1",
            [user_id],
            |row| {
                let updated: String = row.get(11)?;
                Ok(UserProfile {
                    height_cm: row.get(0)?,
                    weight_kg: row.get(1)?,
                    age: row.get(2)?,
                    gender: row.get(3)?,
                    body_fat_percentage: row.get(4)?,
                    muscle_mass_kg: row.get(5)?,
                    chest_cm: row.get(6)?,
                    waist_cm: row.get(7)?,
                    bicep_cm: row.get(8)?,
                    thigh_cm: row.get(9)?,
                    notes: row.get(10)?,
                    updated_at: DateTime::parse_from_rfc3339(&updated)
                        .ok()
                        .map(|d| d.with_timezone(&Utc)),
                })
            },
        )
        .optional()?;
    Ok(profile)
}

pub(super) fn upsert(conn: &Connection, profile: &UserProfile, user_id: &str) -> Result<()> {
    let p = profile.normalized();
    conn.execute(
        "INSERT INTO user_profile (user_id, height_cm, weight_kg, age, gender, body_fat_percentage,
                                   muscle_mass_kg, chest_cm, waist_cm, bicep_cm, thigh_cm, notes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(user_id) DO UPDATE SET
            height_cm = excluded.height_cm,
            weight_kg = excluded.weight_kg,
            age = excluded.age,
            gender = excluded.gender,
            body_fat_percentage = excluded.body_fat_percentage,
            muscle_mass_kg = excluded.muscle_mass_kg,
            chest_cm = excluded.chest_cm,
            waist_cm = excluded.waist_cm,
            bicep_cm = excluded.bicep_cm,
            thigh_cm = excluded.thigh_cm,
            notes = excluded.notes,
            updated_at = excluded.updated_at",
        params![
            user_id,
            p.height_cm,
            p.weight_kg,
            p.age,
            p.gender,
            p.body_fat_percentage,
            p.muscle_mass_kg,
            p.chest_cm,
            p.waist_cm,
            p.bicep_cm,
            p.thigh_cm,
            p.notes,
            Utc::now().to_rfc3339(),
        ],
    )?;
    info!("Profile saved for {}", user_id);
    Ok(())
}
