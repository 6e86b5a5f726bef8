//! Mapping integrity checks against the catalog and the image database

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::{ImageDatabase, ImageMapping};
use crate::catalog::ExerciseCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VariantRef {
    pub exercise: String,
    pub equipment: String,
}

impl VariantRef {
    pub fn new(exercise: &str, equipment: &str) -> Self {
        Self {
            exercise: exercise.to_string(),
            equipment: equipment.to_string(),
        }
    }
}

impl fmt::Display for VariantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.exercise, self.equipment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownId {
    pub variant: VariantRef,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Number of catalog (exercise, equipment) pairs checked
    pub checked_pairs: usize,
    /// Catalog exercises without any mapping entry
    pub missing_exercises: Vec<String>,
    /// Catalog variants absent under an existing mapping entry
    pub missing_variants: Vec<VariantRef>,
    /// Catalog variants explicitly mapped to null
    pub null_ids: Vec<VariantRef>,
    /// Catalog variants whose id is not present in the image database
    pub unknown_ids: Vec<UnknownId>,
    /// Mapping entries with no catalog counterpart
    pub orphans: Vec<VariantRef>,
    /// Orphans whose id is not present in the image database; listed, not a problem
    pub orphan_unknown_ids: Vec<UnknownId>,
    /// False when no image database was supplied
    pub ids_checked: bool,
}

impl ValidationReport {
    /// Every catalog pair resolves to a non-null id known to the image database
    pub fn is_clean(&self) -> bool {
        self.missing_exercises.is_empty()
            && self.missing_variants.is_empty()
            && self.null_ids.is_empty()
            && self.unknown_ids.is_empty()
    }

    pub fn problem_count(&self) -> usize {
        self.missing_exercises.len()
            + self.missing_variants.len()
            + self.null_ids.len()
            + self.unknown_ids.len()
    }
}

/// Check the mapping against the catalog and, when given, the image database.
///
/// Keys are compared exactly: the mapping is keyed by catalog names, so a
/// spelling difference is reported as missing plus orphan.
pub fn validate(
    catalog: &ExerciseCatalog,
    mapping: &ImageMapping,
    image_db: Option<&ImageDatabase>,
) -> ValidationReport {
    let mut report = ValidationReport {
        ids_checked: image_db.is_some(),
        ..Default::default()
    };
    let mut reported_exercises = HashSet::new();

    for (exercise, equipment) in catalog.pairs() {
        report.checked_pairs += 1;

        if !mapping.contains_exercise(exercise) {
            if reported_exercises.insert(exercise) {
                report.missing_exercises.push(exercise.to_string());
            }
            continue;
        }

        match mapping.get(exercise, equipment) {
            None => report
                .missing_variants
                .push(VariantRef::new(exercise, equipment)),
            Some(None) => report.null_ids.push(VariantRef::new(exercise, equipment)),
            Some(Some(_)) => {}
        }
    }

    let catalog_pairs: HashSet<(&str, &str)> = catalog.pairs().collect();
    for (exercise, equipment, id) in mapping.entries() {
        let in_catalog = catalog_pairs.contains(&(exercise, equipment));
        if !in_catalog {
            report.orphans.push(VariantRef::new(exercise, equipment));
        }

        if let (Some(db), Some(id)) = (image_db, id)
            && !db.contains(id)
        {
            let unknown = UnknownId {
                variant: VariantRef::new(exercise, equipment),
                id: id.to_string(),
            };
            if in_catalog {
                report.unknown_ids.push(unknown);
            } else {
                report.orphan_unknown_ids.push(unknown);
            }
        }
    }

    report
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checked {} exercise variants", self.checked_pairs)?;
        writeln!(f, "{:-<50}", "")?;

        section(f, "Exercises without mapping", &self.missing_exercises)?;
        section(f, "Variants without mapping", &self.missing_variants)?;
        section(f, "Variants mapped to null", &self.null_ids)?;

        if self.ids_checked {
            section(f, "Ids missing from image database", &arrows(&self.unknown_ids))?;
        } else {
            writeln!(f, "Image ids not checked (no image database given)")?;
        }

        section(f, "Mapping entries not in catalog", &self.orphans)?;
        section(
            f,
            "Entries not in catalog with unknown ids",
            &arrows(&self.orphan_unknown_ids),
        )?;

        if self.is_clean() {
            writeln!(f, "OK: every variant has a valid image")
        } else {
            writeln!(f, "FAILED: {} problems", self.problem_count())
        }
    }
}

fn arrows(unknown: &[UnknownId]) -> Vec<String> {
    unknown
        .iter()
        .map(|u| format!("{} -> {}", u.variant, u.id))
        .collect()
}

fn section<T: fmt::Display>(f: &mut fmt::Formatter<'_>, title: &str, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "{} ({}):", title, items.len())?;
    for item in items {
        writeln!(f, "  - {}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ExerciseCatalog {
        ExerciseCatalog::from_json(
            r#"[
                {"name": "Bench Press", "muscleGroup": "Chest",
                 "variants": [{"equipment": "Barbell"}, {"equipment": "Dumbbell"}, {"equipment": "Machine"}]},
                {"name": "Squat", "muscleGroup": "Quads", "variants": [{"equipment": "Barbell"}]},
                {"name": "Lunge", "muscleGroup": "Quads",
                 "variants": [{"equipment": "Bodyweight"}, {"equipment": "Dumbbell"}]}
            ]"#,
        )
        .unwrap()
    }

    fn image_db() -> ImageDatabase {
        ImageDatabase::from_json(
            r#"[{"id": "0025", "name": "barbell bench press"},
                {"id": "0043", "name": "barbell full squat"}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_clean_mapping() {
        let catalog = ExerciseCatalog::from_json(
            r#"[{"name": "Squat", "muscleGroup": "Quads", "variants": [{"equipment": "Barbell"}]}]"#,
        )
        .unwrap();
        let mapping = ImageMapping::from_json(r#"{"Squat": {"Barbell": "0043"}}"#).unwrap();

        let report = validate(&catalog, &mapping, Some(&image_db()));
        assert!(report.is_clean());
        assert_eq!(report.checked_pairs, 1);
        assert_eq!(report.problem_count(), 0);
    }

    #[test]
    fn test_reports_every_problem_kind() {
        let mapping = ImageMapping::from_json(
            r#"{
                "Bench Press": {"Barbell": "0025", "Dumbbell": null},
                "Squat": {"Barbell": "9999"},
                "Deadlift": {"Barbell": "0032"}
            }"#,
        )
        .unwrap();

        let report = validate(&catalog(), &mapping, Some(&image_db()));
        assert!(!report.is_clean());
        assert_eq!(report.checked_pairs, 6);
        assert_eq!(report.missing_exercises, vec!["Lunge".to_string()]);
        assert_eq!(
            report.missing_variants,
            vec![VariantRef::new("Bench Press", "Machine")]
        );
        assert_eq!(report.null_ids, vec![VariantRef::new("Bench Press", "Dumbbell")]);

        let unknown: Vec<_> = report.unknown_ids.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(unknown, vec!["9999"]);
        assert_eq!(report.orphans, vec![VariantRef::new("Deadlift", "Barbell")]);
        assert_eq!(report.orphan_unknown_ids[0].id, "0032");
        assert_eq!(report.problem_count(), 4);
    }

    #[test]
    fn test_stale_orphan_id_keeps_report_clean() {
        let catalog = ExerciseCatalog::from_json(
            r#"[{"name": "Squat", "muscleGroup": "Quads", "variants": [{"equipment": "Barbell"}]}]"#,
        )
        .unwrap();
        let mapping = ImageMapping::from_json(
            r#"{"Squat": {"Barbell": "0043"}, "Deadlift": {"Barbell": "0032"}}"#,
        )
        .unwrap();

        let report = validate(&catalog, &mapping, Some(&image_db()));
        assert!(report.is_clean(), "{}", report);
        assert!(report.unknown_ids.is_empty());
        assert_eq!(report.orphan_unknown_ids.len(), 1);

        let text = report.to_string();
        assert!(text.contains("Deadlift [Barbell] -> 0032"));
        assert!(text.contains("OK:"));
    }

    #[test]
    fn test_duplicate_catalog_entries_checked_once() {
        let catalog = ExerciseCatalog::from_json(
            r#"[
                {"name": "Squat", "muscleGroup": "Quads", "variants": [{"equipment": "Barbell"}]},
                {"name": "Squat", "muscleGroup": "Glutes", "variants": [{"equipment": "Barbell"}]}
            ]"#,
        )
        .unwrap();
        let mapping = ImageMapping::from_json(r#"{"Squat": {"Barbell": null}}"#).unwrap();

        let report = validate(&catalog, &mapping, Some(&image_db()));
        assert_eq!(report.checked_pairs, 1);
        assert_eq!(report.null_ids.len(), 1);
    }

    #[test]
    fn test_without_image_database() {
        let mapping = ImageMapping::from_json(r#"{"Squat": {"Barbell": "9999"}}"#).unwrap();
        let catalog = ExerciseCatalog::from_json(
            r#"[{"name": "Squat", "muscleGroup": "Quads", "variants": [{"equipment": "Barbell"}]}]"#,
        )
        .unwrap();

        let report = validate(&catalog, &mapping, None);
        assert!(!report.ids_checked);
        assert!(report.is_clean());
        assert!(report.to_string().contains("not checked"));
    }

    #[test]
    fn test_display_lists_failures() {
        let report = validate(&catalog(), &ImageMapping::new(), None);
        let text = report.to_string();
        assert!(text.contains("Exercises without mapping (3):"));
        assert!(text.contains("FAILED: 3 problems"));
    }
}
