//! Local export of the external exercise image database

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::normalize_name;

/// One record of the image database export. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageDatabase {
    records: Vec<ImageRecord>,
    ids: HashSet<String>,
}

impl ImageDatabase {
    pub fn new(records: Vec<ImageRecord>) -> Self {
        let ids = records.iter().map(|r| r.id.clone()).collect();
        Self { records, ids }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading image database {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("parsing image database {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<ImageRecord> = serde_json::from_str(raw)?;
        Ok(Self::new(records))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the image for an exercise variant.
    ///
    /// Records are matched on normalized name, either the bare exercise name with
    /// a matching equipment field or the name prefixed with the equipment
    /// ("barbell bench press"). First match in database order wins.
    pub fn search(&self, exercise: &str, equipment: &str) -> Option<&ImageRecord> {
        let name = normalize_name(exercise);
        let equipment = normalize_name(equipment);
        let prefixed = format!("{equipment} {name}");

        self.records.iter().find(|record| {
            let record_name = normalize_name(&record.name);
            let record_equipment = record.equipment.as_deref().map(normalize_name);

            if record_name == prefixed {
                return true;
            }
            record_name == name && record_equipment.as_deref() == Some(equipment.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = r#"[
        {"id": "0025", "name": "barbell bench press", "equipment": "barbell", "bodyPart": "chest"},
        {"id": "0289", "name": "Bench Press", "equipment": "dumbbell"},
        {"id": "0043", "name": "barbell full squat", "equipment": "barbell"}
    ]"#;

    #[test]
    fn test_contains() {
        let db = ImageDatabase::from_json(DB).unwrap();
        assert_eq!(db.len(), 3);
        assert!(db.contains("0289"));
        assert!(!db.contains("9999"));
    }

    #[test]
    fn test_search_prefixed_name() {
        let db = ImageDatabase::from_json(DB).unwrap();
        assert_eq!(db.search("Bench Press", "Barbell").unwrap().id, "0025");
    }

    #[test]
    fn test_search_name_and_equipment() {
        let db = ImageDatabase::from_json(DB).unwrap();
        assert_eq!(db.search("bench press", "Dumbbell").unwrap().id, "0289");
    }

    #[test]
    fn test_search_miss() {
        let db = ImageDatabase::from_json(DB).unwrap();
        assert!(db.search("Squat", "Barbell").is_none());
        assert!(db.search("Bench Press", "Cable").is_none());
    }
}
