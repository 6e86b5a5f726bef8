//! Validate -> fix -> write back -> validate, on files

use std::fs;

use gymfuel::catalog::ExerciseCatalog;
use gymfuel::images::{self, FixOptions, ImageDatabase, ImageMapping};

const CATALOG: &str = r#"[
    {"name": "Bench Press", "muscleGroup": "Chest",
     "variants": [{"equipment": "Barbell"}, {"equipment": "Dumbbell"}]},
    {"name": "Lat Pulldown", "muscleGroup": "Back", "variants": [{"equipment": "Cable"}]},
    {"name": "Bicep Curl", "muscleGroup": "Biceps",
     "variants": [{"equipment": "Dumbbell"}, {"equipment": "EZ Bar"}]}
]"#;

const IMAGE_DB: &str = r#"[
    {"id": "0025", "name": "barbell bench press", "equipment": "barbell", "bodyPart": "chest"},
    {"id": "0289", "name": "dumbbell bench press", "equipment": "dumbbell", "bodyPart": "chest"},
    {"id": "0150", "name": "cable lat pulldown", "equipment": "cable", "bodyPart": "back"},
    {"id": "0294", "name": "dumbbell biceps curl", "equipment": "dumbbell", "bodyPart": "upper arms"},
    {"id": "0447", "name": "ez barbell curl", "equipment": "ez barbell", "bodyPart": "upper arms"}
]"#;

const MAPPING: &str = r#"{
    "Bench Press": {"Barbell": "0025", "Dumbbell": "1234"},
    "Lat Pulldown": {"Cable": null},
    "Squat": {"Barbell": "0043"}
}"#;

const PATCHES: &str = r#"{
    "Bicep Curl": {"Dumbbell": "0294", "EZ Bar": "0447"}
}"#;

#[test]
fn test_fix_makes_mapping_clean() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("exercises.json");
    let mapping_path = dir.path().join("exercise-images.json");
    let db_path = dir.path().join("image-db.json");
    let patches_path = dir.path().join("patches.json");
    fs::write(&catalog_path, CATALOG).unwrap();
    fs::write(&mapping_path, MAPPING).unwrap();
    fs::write(&db_path, IMAGE_DB).unwrap();
    fs::write(&patches_path, PATCHES).unwrap();

    let catalog = ExerciseCatalog::load(&catalog_path).unwrap();
    let image_db = ImageDatabase::load(&db_path).unwrap();
    let mut mapping = ImageMapping::load(&mapping_path).unwrap();

    let before = images::validate(&catalog, &mapping, Some(&image_db));
    assert!(!before.is_clean());
    assert_eq!(before.missing_exercises, vec!["Bicep Curl".to_string()]);
    assert_eq!(before.null_ids.len(), 1);
    assert_eq!(before.unknown_ids.len(), 1);
    assert_eq!(before.unknown_ids[0].id, "1234");
    assert_eq!(before.orphans.len(), 1);
    assert_eq!(before.orphan_unknown_ids[0].id, "0043");

    let patches = ImageMapping::load(&patches_path).unwrap();
    let summary = images::fix(
        &catalog,
        &mut mapping,
        &image_db,
        Some(&patches),
        FixOptions { prune_orphans: true, ..Default::default() },
    );
    assert!(summary.unresolved.is_empty());
    assert!(summary.rejected_patches.is_empty());
    mapping.save(&mapping_path).unwrap();

    let reloaded = ImageMapping::load(&mapping_path).unwrap();
    assert_eq!(reloaded.get("Bench Press", "Dumbbell"), Some(Some("0289")));
    assert_eq!(reloaded.get("Lat Pulldown", "Cable"), Some(Some("0150")));
    assert_eq!(reloaded.get("Bicep Curl", "EZ Bar"), Some(Some("0447")));
    assert!(!reloaded.contains_exercise("Squat"));

    let after = images::validate(&catalog, &reloaded, Some(&image_db));
    assert!(after.is_clean(), "{}", after);
    assert!(after.orphans.is_empty());
}

#[test]
fn test_missing_file_reports_path() {
    let err = ImageMapping::load("/nonexistent/exercise-images.json").unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/exercise-images.json"));
}

#[test]
fn test_dry_run_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mapping_path = dir.path().join("exercise-images.json");
    let output_path = dir.path().join("fixed.json");
    fs::write(&mapping_path, MAPPING).unwrap();

    let catalog = ExerciseCatalog::from_json(CATALOG).unwrap();
    let image_db = ImageDatabase::from_json(IMAGE_DB).unwrap();

    let dry = images::fix_file(
        &catalog,
        &mapping_path,
        &image_db,
        None,
        FixOptions { dry_run: true, ..Default::default() },
        Some(&output_path),
    )
    .unwrap();
    assert!(!dry.summary.is_noop());
    assert!(dry.written.is_none());
    assert_eq!(fs::read_to_string(&mapping_path).unwrap(), MAPPING);
    assert!(!output_path.exists());

    let run = images::fix_file(
        &catalog,
        &mapping_path,
        &image_db,
        None,
        FixOptions::default(),
        None,
    )
    .unwrap();
    assert_eq!(run.written.as_deref(), Some(mapping_path.as_path()));
    assert_eq!(run.summary.changes, dry.summary.changes);

    let fixed = ImageMapping::load(&mapping_path).unwrap();
    assert_eq!(fixed.get("Bench Press", "Dumbbell"), Some(Some("0289")));
}
