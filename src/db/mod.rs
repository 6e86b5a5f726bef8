//! Database module - SQLite-backed key-value storage for workouts and nutrition

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::nutrition::{DayLog, MacroTargets, Meal};
use crate::workout::Workout;

const KEY_WORKOUTS: &str = "workouts";
const KEY_MACRO_TARGETS: &str = "macro_targets";
const PREFIX_NUTRITION: &str = "nutrition:";

fn nutrition_key(date: NaiveDate) -> String {
    format!("{}{}", PREFIX_NUTRITION, date.format("%Y-%m-%d"))
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read and decode a JSON value
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;

        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("decoding stored value for {key}"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Encode and store a JSON value, replacing any previous one
    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, raw],
        )?;
        debug!("Stored {} ({} bytes)", key, raw.len());
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// All workouts, newest first
    pub fn get_workouts(&self) -> Result<Vec<Workout>> {
        let mut workouts: Vec<Workout> = self.get_json(KEY_WORKOUTS)?.unwrap_or_default();
        workouts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(workouts)
    }

    /// Add new workout, assigning the next id
    pub fn add_workout(&self, mut workout: Workout) -> Result<u64> {
        if !workout.is_finite() {
            bail!("workout {:?} has a weight that is not a finite number", workout.name);
        }
        let mut workouts: Vec<Workout> = self.get_json(KEY_WORKOUTS)?.unwrap_or_default();
        workout.id = workouts.iter().map(|w| w.id).max().map_or(1, |id| id + 1);
        let id = workout.id;
        workouts.push(workout);
        self.put_json(KEY_WORKOUTS, &workouts)?;
        Ok(id)
    }

    pub fn unsynced_workouts(&self) -> Result<Vec<Workout>> {
        Ok(self
            .get_workouts()?
            .into_iter()
            .filter(|w| !w.synced)
            .collect())
    }

    /// Flag workouts as synced, returns how many changed
    pub fn mark_synced(&self, ids: &[u64]) -> Result<usize> {
        let mut workouts: Vec<Workout> = self.get_json(KEY_WORKOUTS)?.unwrap_or_default();
        let mut changed = 0;
        for workout in workouts.iter_mut().filter(|w| ids.contains(&w.id) && !w.synced) {
            workout.synced = true;
            changed += 1;
        }
        if changed > 0 {
            self.put_json(KEY_WORKOUTS, &workouts)?;
        }
        Ok(changed)
    }

    /// Meals for a day (empty log when nothing is stored)
    pub fn day_log(&self, date: NaiveDate) -> Result<DayLog> {
        Ok(self
            .get_json(&nutrition_key(date))?
            .unwrap_or_else(|| DayLog::new(date)))
    }

    pub fn add_meal(&self, date: NaiveDate, meal: Meal) -> Result<u64> {
        if !meal.macros.is_finite() {
            bail!("meal {:?} has macros that are not finite numbers", meal.name);
        }
        let mut day = self.day_log(date)?;
        let id = day.add_meal(meal);
        self.put_json(&nutrition_key(date), &day)?;
        Ok(id)
    }

    pub fn remove_meal(&self, date: NaiveDate, id: u64) -> Result<bool> {
        let mut day = self.day_log(date)?;
        if !day.remove_meal(id) {
            return Ok(false);
        }
        self.put_json(&nutrition_key(date), &day)?;
        Ok(true)
    }

    /// Stored day logs within `from..=to`, oldest first
    pub fn nutrition_history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayLog>> {
        let first = nutrition_key(from);
        let last = nutrition_key(to);
        let mut days = Vec::new();
        for key in self.keys_with_prefix(PREFIX_NUTRITION)? {
            if key < first || key > last {
                continue;
            }
            if let Some(day) = self.get_json::<DayLog>(&key)? {
                days.push(day);
            }
        }
        Ok(days)
    }

    pub fn macro_targets(&self) -> Result<MacroTargets> {
        Ok(self.get_json(KEY_MACRO_TARGETS)?.unwrap_or_default())
    }

    pub fn set_macro_targets(&self, targets: &MacroTargets) -> Result<()> {
        if !targets.0.is_finite() {
            bail!("macro targets must be finite numbers");
        }
        self.put_json(KEY_MACRO_TARGETS, targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::Macros;
    use crate::workout::{WorkoutExercise, WorkoutSet};
    use chrono::{TimeZone, Utc};

    fn workout(name: &str, day: u32) -> Workout {
        Workout {
            id: 0,
            date: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
            name: name.to_string(),
            exercises: vec![WorkoutExercise {
                name: "Squat".to_string(),
                sets: vec![WorkoutSet { weight: 100.0, reps: 5, completed: true }],
            }],
            duration: Some(40),
            synced: false,
        }
    }

    fn meal(name: &str, calories: f64) -> Meal {
        Meal {
            id: 0,
            name: name.to_string(),
            time: Some("08:00".to_string()),
            macros: Macros::new(calories, 10.0, 10.0, 10.0),
            barcode: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_kv_roundtrip_and_delete() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_json::<Vec<u32>>("numbers").unwrap(), None);

        db.put_json("numbers", &vec![1, 2, 3]).unwrap();
        db.put_json("numbers", &vec![4]).unwrap();
        assert_eq!(db.get_json::<Vec<u32>>("numbers").unwrap(), Some(vec![4]));

        assert!(db.delete("numbers").unwrap());
        assert!(!db.delete("numbers").unwrap());
    }

    #[test]
    fn test_keys_with_prefix_is_literal() {
        let db = Database::open_in_memory().unwrap();
        db.put_json("nutrition:2024-03-02", &1).unwrap();
        db.put_json("nutrition:2024-03-01", &1).unwrap();
        db.put_json("nutritionist", &1).unwrap();
        db.put_json("n%x", &1).unwrap();

        assert_eq!(
            db.keys_with_prefix("nutrition:").unwrap(),
            vec!["nutrition:2024-03-01", "nutrition:2024-03-02"]
        );
        assert_eq!(db.keys_with_prefix("n%").unwrap(), vec!["n%x"]);
    }

    #[test]
    fn test_workouts_ids_and_order() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.add_workout(workout("Legs", 1)).unwrap(), 1);
        assert_eq!(db.add_workout(workout("Push", 3)).unwrap(), 2);
        assert_eq!(db.add_workout(workout("Pull", 2)).unwrap(), 3);

        let names: Vec<_> = db.get_workouts().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Push", "Pull", "Legs"]);
    }

    #[test]
    fn test_mark_synced() {
        let db = Database::open_in_memory().unwrap();
        db.add_workout(workout("Legs", 1)).unwrap();
        db.add_workout(workout("Push", 2)).unwrap();

        assert_eq!(db.mark_synced(&[1, 99]).unwrap(), 1);
        assert_eq!(db.mark_synced(&[1]).unwrap(), 0);

        let unsynced = db.unsynced_workouts().unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].name, "Push");
    }

    #[test]
    fn test_meals_and_history() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.day_log(date(1)).unwrap().meals.is_empty());

        db.add_meal(date(1), meal("Oats", 300.0)).unwrap();
        db.add_meal(date(1), meal("Rice", 400.0)).unwrap();
        db.add_meal(date(3), meal("Eggs", 200.0)).unwrap();
        db.add_meal(date(9), meal("Fish", 250.0)).unwrap();

        assert_eq!(db.day_log(date(1)).unwrap().totals().calories, 700.0);

        assert!(db.remove_meal(date(1), 1).unwrap());
        assert!(!db.remove_meal(date(2), 1).unwrap());

        let history = db.nutrition_history(date(1), date(3)).unwrap();
        let days: Vec<_> = history.iter().map(|d| d.date).collect();
        assert_eq!(days, vec![date(1), date(3)]);
        assert_eq!(history[0].meals.len(), 1);
    }

    #[test]
    fn test_macro_targets_default_and_update() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.macro_targets().unwrap(), MacroTargets::default());

        let targets = MacroTargets(Macros::new(2400.0, 180.0, 250.0, 70.0));
        db.set_macro_targets(&targets).unwrap();
        assert_eq!(db.macro_targets().unwrap(), targets);
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let db = Database::open_in_memory().unwrap();
        db.add_workout(workout("Legs", 1)).unwrap();

        let mut bad = workout("Push", 2);
        bad.exercises[0].sets[0].weight = f64::NAN;
        assert!(db.add_workout(bad).is_err());

        // history stays readable and writable
        assert_eq!(db.get_workouts().unwrap().len(), 1);
        assert_eq!(db.add_workout(workout("Pull", 3)).unwrap(), 2);

        assert!(db.add_meal(date(1), meal("Cake", f64::INFINITY)).is_err());
        assert!(db.day_log(date(1)).unwrap().meals.is_empty());

        let targets = MacroTargets(Macros::new(2000.0, f64::NAN, 200.0, 65.0));
        assert!(db.set_macro_targets(&targets).is_err());
        assert_eq!(db.macro_targets().unwrap(), MacroTargets::default());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gymfuel.db");
        {
            let db = Database::open(&path).unwrap();
            db.add_workout(workout("Legs", 1)).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_workouts().unwrap().len(), 1);
    }
}
