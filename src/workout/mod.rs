//! Workout records and training analytics

pub mod muscle_balance;

pub use muscle_balance::MuscleBalance;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Load in kg, 0 for bodyweight
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl WorkoutExercise {
    /// Weight x reps over completed sets
    pub fn volume(&self) -> f64 {
        self.sets
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.weight * s.reps as f64)
            .sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    pub fn completed_reps(&self) -> u32 {
        self.sets.iter().filter(|s| s.completed).map(|s| s.reps).sum()
    }
}

/// Workout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub synced: bool,
}

impl Workout {
    pub fn volume(&self) -> f64 {
        self.exercises.iter().map(WorkoutExercise::volume).sum()
    }

    /// Every set weight is a finite number
    pub fn is_finite(&self) -> bool {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .all(|s| s.weight.is_finite())
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(WorkoutExercise::completed_sets).sum()
    }
}

/// Training analytics over a workout history (newest first)
pub struct Analytics {
    workouts: Vec<Workout>,
}

impl Analytics {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    fn matching<'a>(&'a self, exercise: &str) -> impl Iterator<Item = &'a WorkoutExercise> + 'a {
        let needle = exercise.to_lowercase();
        self.workouts
            .iter()
            .flat_map(|w| w.exercises.iter())
            .filter(move |e| e.name.to_lowercase().contains(&needle))
    }

    /// Total volume (weight x reps over completed sets) for an exercise
    pub fn total_volume(&self, exercise: &str) -> f64 {
        self.matching(exercise).map(WorkoutExercise::volume).sum()
    }

    /// Get training frequency (sessions per week)
    pub fn weekly_frequency(&self) -> f64 {
        if self.workouts.len() < 2 {
            return 0.0;
        }

        let Some(first) = self.workouts.iter().map(|w| w.date.date_naive()).min() else {
            return 0.0;
        };
        let Some(last) = self.workouts.iter().map(|w| w.date.date_naive()).max() else {
            return 0.0;
        };
        let days = (last - first).num_days() as f64;

        if days == 0.0 {
            return self.workouts.len() as f64;
        }

        (self.workouts.len() as f64 / days) * 7.0
    }

    /// Suggest next load from the last five sessions: average sets, average reps + 1
    pub fn predict_next_load(&self, exercise: &str) -> Option<(usize, u32)> {
        let recent: Vec<_> = self
            .matching(exercise)
            .filter(|e| e.completed_sets() > 0)
            .take(5)
            .collect();

        if recent.is_empty() {
            return None;
        }

        let sessions = recent.len();
        let avg_sets = recent.iter().map(|e| e.completed_sets()).sum::<usize>() / sessions;
        let total_sets: usize = recent.iter().map(|e| e.completed_sets()).sum();
        let avg_reps = recent.iter().map(|e| e.completed_reps()).sum::<u32>() / total_sets as u32;

        Some((avg_sets, avg_reps + 1))
    }
}
