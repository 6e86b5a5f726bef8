//! Repair the image mapping: apply hand patches, then fill gaps from the image database

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::validate::{UnknownId, VariantRef};
use super::{ImageDatabase, ImageMapping};
use crate::catalog::ExerciseCatalog;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixOptions {
    /// Remove mapping entries that have no catalog counterpart
    pub prune_orphans: bool,
    /// Compute the summary without writing the mapping file
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    /// Taken from the patch table
    Patched,
    /// Found by searching the image database
    Resolved,
    /// Id was unknown to the image database and nothing replaced it
    Cleared,
    /// Variant had no entry; written as explicit null
    MarkedMissing,
    /// Entry removed because the catalog does not know it
    Pruned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub variant: VariantRef,
    /// `None` when the entry did not exist
    pub before: Option<Option<String>>,
    /// `None` when the entry was removed
    pub after: Option<Option<String>>,
    pub reason: ChangeReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixSummary {
    pub changes: Vec<Change>,
    /// Patch entries pointing at ids the image database does not have
    pub rejected_patches: Vec<UnknownId>,
    /// Catalog variants still without an image after fixing
    pub unresolved: Vec<VariantRef>,
}

impl FixSummary {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, reason: ChangeReason) -> usize {
        self.changes.iter().filter(|c| c.reason == reason).count()
    }
}

/// Fix `mapping` in place.
///
/// Patches win over everything, including an explicit null patch. Catalog
/// variants that are missing, null or point at an unknown id are then looked up
/// in the image database; what cannot be resolved ends up as an explicit null.
pub fn fix(
    catalog: &ExerciseCatalog,
    mapping: &mut ImageMapping,
    image_db: &ImageDatabase,
    patches: Option<&ImageMapping>,
    options: FixOptions,
) -> FixSummary {
    let mut summary = FixSummary::default();
    let mut patched: HashSet<(String, String)> = HashSet::new();

    if let Some(patches) = patches {
        for (exercise, equipment, id) in patches.entries() {
            if let Some(id) = id
                && !image_db.contains(id)
            {
                warn!("Patch for {} [{}] rejected: unknown id {}", exercise, equipment, id);
                summary.rejected_patches.push(UnknownId {
                    variant: VariantRef::new(exercise, equipment),
                    id: id.to_string(),
                });
                continue;
            }

            patched.insert((exercise.to_string(), equipment.to_string()));
            let before = owned(mapping.get(exercise, equipment));
            let after = id.map(str::to_string);
            if before.as_ref() == Some(&after) {
                continue;
            }

            mapping.set(exercise, equipment, after.clone());
            summary.changes.push(Change {
                variant: VariantRef::new(exercise, equipment),
                before,
                after: Some(after),
                reason: ChangeReason::Patched,
            });
        }
    }

    for (exercise, equipment) in catalog.pairs() {
        if patched.contains(&(exercise.to_string(), equipment.to_string())) {
            continue;
        }

        let before = owned(mapping.get(exercise, equipment));
        let needs_fix = match &before {
            None | Some(None) => true,
            Some(Some(id)) => !image_db.contains(id),
        };
        if !needs_fix {
            continue;
        }

        let variant = VariantRef::new(exercise, equipment);
        if let Some(record) = image_db.search(exercise, equipment) {
            debug!("Resolved {} -> {}", variant, record.id);
            mapping.set(exercise, equipment, Some(record.id.clone()));
            summary.changes.push(Change {
                variant,
                before,
                after: Some(Some(record.id.clone())),
                reason: ChangeReason::Resolved,
            });
            continue;
        }

        let reason = match &before {
            None => Some(ChangeReason::MarkedMissing),
            Some(Some(_)) => Some(ChangeReason::Cleared),
            Some(None) => None,
        };
        if let Some(reason) = reason {
            mapping.set(exercise, equipment, None);
            summary.changes.push(Change {
                variant: variant.clone(),
                before,
                after: Some(None),
                reason,
            });
        }
        summary.unresolved.push(variant);
    }

    let catalog_pairs: HashSet<(&str, &str)> = catalog.pairs().collect();
    let orphans: Vec<(String, String, Option<String>)> = mapping
        .entries()
        .filter(|(exercise, equipment, _)| !catalog_pairs.contains(&(*exercise, *equipment)))
        .map(|(exercise, equipment, id)| {
            (exercise.to_string(), equipment.to_string(), id.map(str::to_string))
        })
        .collect();

    for (exercise, equipment, id) in orphans {
        let variant = VariantRef::new(&exercise, &equipment);
        if options.prune_orphans {
            mapping.remove_variant(&exercise, &equipment);
            summary.changes.push(Change {
                variant,
                before: Some(id),
                after: None,
                reason: ChangeReason::Pruned,
            });
        } else if let Some(known) = id
            && !image_db.contains(&known)
            && !patched.contains(&(exercise.clone(), equipment.clone()))
        {
            mapping.set(&exercise, &equipment, None);
            summary.changes.push(Change {
                variant,
                before: Some(Some(known)),
                after: Some(None),
                reason: ChangeReason::Cleared,
            });
        }
    }

    summary
}

/// Outcome of [`fix_file`]
#[derive(Debug)]
pub struct FixRun {
    pub summary: FixSummary,
    /// File written, `None` for a dry run or an unchanged mapping
    pub written: Option<PathBuf>,
}

/// Load the mapping at `mapping_path`, fix it and write the result to `output`
/// (default: back to `mapping_path`).
pub fn fix_file(
    catalog: &ExerciseCatalog,
    mapping_path: &Path,
    image_db: &ImageDatabase,
    patches: Option<&ImageMapping>,
    options: FixOptions,
    output: Option<&Path>,
) -> Result<FixRun> {
    let mut mapping = ImageMapping::load(mapping_path)?;
    let summary = fix(catalog, &mut mapping, image_db, patches, options);

    if options.dry_run || (summary.is_noop() && output.is_none()) {
        return Ok(FixRun { summary, written: None });
    }

    let target = output.unwrap_or(mapping_path).to_path_buf();
    mapping
        .save(&target)
        .with_context(|| format!("saving fixed mapping to {}", target.display()))?;
    info!("Wrote {} changes to {}", summary.changes.len(), target.display());
    Ok(FixRun { summary, written: Some(target) })
}

fn owned(value: Option<Option<&str>>) -> Option<Option<String>> {
    value.map(|id| id.map(str::to_string))
}

fn show(value: &Option<Option<String>>) -> &str {
    match value {
        None => "(absent)",
        Some(None) => "null",
        Some(Some(id)) => id,
    }
}

impl fmt::Display for FixSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "patched: {}, resolved: {}, cleared: {}, marked missing: {}, pruned: {}",
            self.count(ChangeReason::Patched),
            self.count(ChangeReason::Resolved),
            self.count(ChangeReason::Cleared),
            self.count(ChangeReason::MarkedMissing),
            self.count(ChangeReason::Pruned),
        )?;
        for change in &self.changes {
            writeln!(
                f,
                "  {:?}: {} {} -> {}",
                change.reason,
                change.variant,
                show(&change.before),
                show(&change.after)
            )?;
        }
        if !self.rejected_patches.is_empty() {
            writeln!(f, "Rejected patches ({}):", self.rejected_patches.len())?;
            for rejected in &self.rejected_patches {
                writeln!(f, "  - {} -> {}", rejected.variant, rejected.id)?;
            }
        }
        if !self.unresolved.is_empty() {
            writeln!(f, "Still without image ({}):", self.unresolved.len())?;
            for variant in &self.unresolved {
                writeln!(f, "  - {}", variant)?;
            }
        }
        Ok(())
    }
}
