//! Exercise image mapping - (exercise, equipment) -> external image id
//!
//! The mapping file is a two-level JSON object:
//! `{ "Bench Press": { "Barbell": "0025", "Dumbbell": null } }`.
//! A `null` id means no image is available for that variant.

pub mod fix;
pub mod image_db;
pub mod validate;

pub use fix::{FixOptions, FixRun, FixSummary, fix, fix_file};
pub use image_db::{ImageDatabase, ImageRecord};
pub use validate::{ValidationReport, validate};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::normalize_name;

pub type ImageId = String;

/// Equipment -> image id for one exercise
pub type VariantImages = BTreeMap<String, Option<ImageId>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageMapping {
    exercises: BTreeMap<String, VariantImages>,
}

impl ImageMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load mapping from JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading image mapping {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing image mapping {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Write mapping back as pretty JSON with sorted keys
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut raw = serde_json::to_string_pretty(self)?;
        raw.push('\n');
        std::fs::write(path, raw)
            .with_context(|| format!("writing image mapping {}", path.display()))?;
        Ok(())
    }

    /// Exact lookup.
    ///
    /// `None` - no entry, `Some(None)` - explicit null, `Some(Some(id))` - resolved.
    pub fn get(&self, exercise: &str, equipment: &str) -> Option<Option<&str>> {
        self.exercises
            .get(exercise)?
            .get(equipment)
            .map(|id| id.as_deref())
    }

    /// Lookup tolerant of case, spacing and punctuation differences in both keys
    pub fn resolve(&self, exercise: &str, equipment: &str) -> Option<&str> {
        if let Some(found) = self.get(exercise, equipment) {
            return found;
        }

        let wanted_exercise = normalize_name(exercise);
        let wanted_equipment = normalize_name(equipment);
        self.exercises
            .iter()
            .filter(|(name, _)| normalize_name(name) == wanted_exercise)
            .flat_map(|(_, variants)| variants.iter())
            .find(|(eq, _)| normalize_name(eq) == wanted_equipment)
            .and_then(|(_, id)| id.as_deref())
    }

    pub fn set(&mut self, exercise: &str, equipment: &str, id: Option<ImageId>) {
        self.exercises
            .entry(exercise.to_string())
            .or_default()
            .insert(equipment.to_string(), id);
    }

    pub fn remove_variant(&mut self, exercise: &str, equipment: &str) -> bool {
        let Some(variants) = self.exercises.get_mut(exercise) else {
            return false;
        };
        let removed = variants.remove(equipment).is_some();
        if variants.is_empty() {
            self.exercises.remove(exercise);
        }
        removed
    }

    pub fn remove_exercise(&mut self, exercise: &str) -> bool {
        self.exercises.remove(exercise).is_some()
    }

    pub fn contains_exercise(&self, exercise: &str) -> bool {
        self.exercises.contains_key(exercise)
    }

    /// All entries as (exercise, equipment, id)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, Option<&str>)> {
        self.exercises.iter().flat_map(|(name, variants)| {
            variants
                .iter()
                .map(move |(eq, id)| (name.as_str(), eq.as_str(), id.as_deref()))
        })
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }
}
