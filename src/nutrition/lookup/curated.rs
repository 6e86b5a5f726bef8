//! Hand-curated food list, checked before any remote API

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{FoodProduct, Source, same_barcode};
use crate::catalog::normalize_name;
use crate::nutrition::Macros;

/// Record as stored in the curated JSON file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CuratedRecord {
    name: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    serving_size: Option<String>,
    #[serde(default)]
    serving_grams: Option<f64>,
    per100g: Macros,
}

struct CuratedFood {
    product: FoodProduct,
    /// Normalized name plus aliases
    keys: Vec<String>,
}

pub struct CuratedFoods {
    foods: Vec<CuratedFood>,
}

impl CuratedFoods {
    pub fn new(products: Vec<FoodProduct>) -> Self {
        let foods = products
            .into_iter()
            .map(|product| CuratedFood {
                keys: vec![normalize_name(&product.name)],
                product,
            })
            .collect();
        Self { foods }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading curated foods {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing curated foods {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<CuratedRecord> = serde_json::from_str(raw)?;
        let foods = records
            .into_iter()
            .map(|r| {
                let mut keys = vec![normalize_name(&r.name)];
                keys.extend(r.aliases.iter().map(|a| normalize_name(a)));
                CuratedFood {
                    product: FoodProduct {
                        name: r.name,
                        brand: r.brand,
                        barcode: r.barcode,
                        serving_size: r.serving_size,
                        serving_grams: r.serving_grams,
                        per_100g: Some(r.per100g),
                        per_serving: None,
                        source: Source::Curated,
                    },
                    keys,
                }
            })
            .collect();
        Ok(Self { foods })
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn by_barcode(&self, barcode: &str) -> Option<FoodProduct> {
        self.foods
            .iter()
            .find(|f| f.product.barcode.as_deref().is_some_and(|b| same_barcode(b, barcode)))
            .map(|f| f.product.clone())
    }

    /// Exact name/alias matches first, then substring matches
    pub fn search(&self, query: &str, limit: usize) -> Vec<FoodProduct> {
        let needle = normalize_name(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let exact = self.foods.iter().filter(|f| f.keys.iter().any(|k| *k == needle));
        let partial = self
            .foods
            .iter()
            .filter(|f| !f.keys.iter().any(|k| *k == needle))
            .filter(|f| f.keys.iter().any(|k| k.contains(&needle)));

        exact
            .chain(partial)
            .take(limit)
            .map(|f| f.product.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOODS: &str = r#"[
        {"name": "Greek Yogurt 0%", "brand": "Fage", "barcode": "05200435000027",
         "servingGrams": 170, "per100g": {"calories": 54, "protein": 10.3, "carbs": 3.0, "fat": 0.0}},
        {"name": "Chicken Breast", "aliases": ["chicken"],
         "per100g": {"calories": 165, "protein": 31, "carbs": 0, "fat": 3.6}},
        {"name": "Chicken Thigh",
         "per100g": {"calories": 209, "protein": 26, "carbs": 0, "fat": 10.9}}
    ]"#;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foods.json");
        std::fs::write(&path, FOODS).unwrap();

        let foods = CuratedFoods::load(&path).unwrap();
        assert_eq!(foods.len(), 3);
    }

    #[test]
    fn test_by_barcode_ignores_leading_zeros() {
        let foods = CuratedFoods::from_json(FOODS).unwrap();
        let yogurt = foods.by_barcode("5200435000027").unwrap();
        assert_eq!(yogurt.brand.as_deref(), Some("Fage"));
        assert_eq!(yogurt.source, Source::Curated);
        assert!(foods.by_barcode("1234567890123").is_none());
    }

    #[test]
    fn test_search_exact_alias_first() {
        let foods = CuratedFoods::from_json(FOODS).unwrap();
        let results = foods.search("Chicken", 10);
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken Breast", "Chicken Thigh"]);

        assert_eq!(foods.search("yogurt", 10).len(), 1);
        assert_eq!(foods.search("chicken", 1).len(), 1);
        assert!(foods.search("tofu", 10).is_empty());
    }
}
