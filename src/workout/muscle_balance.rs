//! Weekly training balance across muscle groups

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::Workout;
use crate::catalog::{ExerciseCatalog, MuscleGroup};

/// Completed sets per muscle group over a window
pub struct MuscleBalance {
    sets: BTreeMap<MuscleGroup, usize>,
    /// Exercise names the catalog could not place
    unknown: Vec<String>,
}

impl MuscleBalance {
    /// Build from workouts dated within `days` before `now`
    pub fn from_workouts(
        workouts: &[Workout],
        catalog: &ExerciseCatalog,
        now: DateTime<Utc>,
        days: i64,
    ) -> Self {
        let mut sets: BTreeMap<MuscleGroup, usize> = MuscleGroup::all()
            .iter()
            .map(|g| (g.clone(), 0))
            .collect();
        let mut unknown = Vec::new();
        let since = now - Duration::days(days);

        for workout in workouts.iter().filter(|w| w.date >= since && w.date <= now) {
            for exercise in &workout.exercises {
                let Some(entry) = catalog.find(&exercise.name) else {
                    if !unknown.contains(&exercise.name) {
                        unknown.push(exercise.name.clone());
                    }
                    continue;
                };
                *sets.entry(entry.muscle_group.clone()).or_default() += exercise.completed_sets();
            }
        }

        Self { sets, unknown }
    }

    pub fn sets(&self, group: &MuscleGroup) -> usize {
        self.sets.get(group).copied().unwrap_or(0)
    }

    pub fn unknown_exercises(&self) -> &[String] {
        &self.unknown
    }

    /// Groups with the fewest sets first, excluding full body
    pub fn underworked(&self, limit: usize) -> Vec<MuscleGroup> {
        let mut loads: Vec<_> = self
            .sets
            .iter()
            .filter(|(g, _)| **g != MuscleGroup::FullBody)
            .collect();
        loads.sort_by_key(|(_, sets)| **sets);
        loads.into_iter().take(limit).map(|(g, _)| g.clone()).collect()
    }

    /// Report rows sorted by sets descending, with a four-step bar
    pub fn report(&self) -> Vec<(MuscleGroup, usize, &'static str)> {
        let max = self.sets.values().copied().max().unwrap_or(0).max(1);

        let mut rows: Vec<_> = self
            .sets
            .iter()
            .map(|(group, sets)| {
                let ratio = *sets as f32 / max as f32;
                let bar = match ratio {
                    r if r >= 0.75 => "[++++]",
                    r if r >= 0.50 => "[+++.]",
                    r if r >= 0.25 => "[++..]",
                    r if r > 0.0 => "[+...]",
                    _ => "[....]",
                };
                (group.clone(), *sets, bar)
            })
            .collect();

        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}
