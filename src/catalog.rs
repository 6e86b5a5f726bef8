//! Exercise catalog - static reference data loaded from JSON

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Muscle groups used by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Core,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    FullBody,
    /// Label not known to this build, kept verbatim
    Other(String),
}

impl MuscleGroup {
    pub fn label(&self) -> &str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Forearms => "Forearms",
            MuscleGroup::Core => "Core",
            MuscleGroup::Quads => "Quads",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Calves => "Calves",
            MuscleGroup::FullBody => "Full Body",
            MuscleGroup::Other(label) => label,
        }
    }

    /// Parse a catalog label. Accepts the common synonyms found in exported catalogs.
    pub fn parse(label: &str) -> Self {
        match normalize_name(label).as_str() {
            "chest" | "pecs" => MuscleGroup::Chest,
            "back" | "lats" | "upper back" | "lower back" => MuscleGroup::Back,
            "shoulders" | "delts" => MuscleGroup::Shoulders,
            "biceps" => MuscleGroup::Biceps,
            "triceps" => MuscleGroup::Triceps,
            "forearms" => MuscleGroup::Forearms,
            "core" | "abs" | "abdominals" => MuscleGroup::Core,
            "quads" | "quadriceps" => MuscleGroup::Quads,
            "hamstrings" => MuscleGroup::Hamstrings,
            "glutes" => MuscleGroup::Glutes,
            "calves" => MuscleGroup::Calves,
            "full body" | "fullbody" => MuscleGroup::FullBody,
            _ => MuscleGroup::Other(label.trim().to_string()),
        }
    }

    /// All known muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Forearms,
            MuscleGroup::Core,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
            MuscleGroup::FullBody,
        ]
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl Serialize for MuscleGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MuscleGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(MuscleGroup::parse(&label))
    }
}

/// Equipment-specific version of an exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub equipment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub muscle_group: MuscleGroup,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl CatalogEntry {
    pub fn has_equipment(&self, equipment: &str) -> bool {
        let wanted = normalize_name(equipment);
        self.variants
            .iter()
            .any(|v| normalize_name(&v.equipment) == wanted)
    }
}

/// Ordered exercise catalog
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    entries: Vec<CatalogEntry>,
}

impl ExerciseCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load catalog from a JSON array file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing catalog {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find exercise by name, falling back to a normalized comparison
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.name == name) {
            return Some(entry);
        }
        let wanted = normalize_name(name);
        self.entries
            .iter()
            .find(|e| normalize_name(&e.name) == wanted)
    }

    /// Every (exercise, equipment) pair in catalog order.
    ///
    /// A repeated exercise name is skipped, the first entry wins as in [`find`](Self::find).
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(move |entry| seen.insert(entry.name.as_str()))
            .flat_map(|entry| {
                entry
                    .variants
                    .iter()
                    .map(move |v| (entry.name.as_str(), v.equipment.as_str()))
            })
    }

    pub fn by_muscle_group<'a>(
        &'a self,
        group: &'a MuscleGroup,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |e| &e.muscle_group == group)
    }
}

/// Lowercase, map punctuation to spaces and collapse whitespace.
///
/// "Bench Press (Incline)" and "bench-press  incline" normalize to the same key.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
