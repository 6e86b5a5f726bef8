//! Open Food Facts product API (barcode lookup, no key required)

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::{FoodProduct, LookupError, Source, get_json, number};
use crate::nutrition::Macros;

const SERVICE: &str = "Open Food Facts";

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    serving_size: Option<String>,
    #[serde(default)]
    serving_quantity: Option<Value>,
    #[serde(default)]
    nutriments: HashMap<String, Value>,
}

#[derive(Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, barcode);
        let request = self.http.get(&url).query(&[(
            "fields",
            "product_name,brands,serving_size,serving_quantity,nutriments",
        )]);

        let Some(response) = get_json::<ProductResponse>(SERVICE, request).await? else {
            return Ok(None);
        };
        if response.status != 1 {
            return Ok(None);
        }
        let Some(product) = response.product else {
            return Ok(None);
        };
        let Some(name) = product.product_name.filter(|n| !n.trim().is_empty()) else {
            return Ok(None);
        };

        let n = &product.nutriments;
        Ok(Some(FoodProduct {
            name: name.trim().to_string(),
            brand: product
                .brands
                .as_deref()
                .and_then(|b| b.split(',').next())
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            barcode: Some(barcode.to_string()),
            serving_size: product.serving_size,
            serving_grams: number(product.serving_quantity.as_ref()),
            per_100g: nutriments(n, "_100g"),
            per_serving: nutriments(n, "_serving"),
            source: Source::OpenFoodFacts,
        }))
    }
}

/// Macros from the nutriments map; energy in kJ is converted when kcal is absent
fn nutriments(n: &HashMap<String, Value>, suffix: &str) -> Option<Macros> {
    let get = |key: &str| number(n.get(&format!("{key}{suffix}")));

    let calories = get("energy-kcal").or_else(|| get("energy").map(|kj| kj / 4.184));
    let protein = get("proteins");
    let carbs = get("carbohydrates");
    let fat = get("fat");

    if calories.is_none() && protein.is_none() && carbs.is_none() && fat.is_none() {
        return None;
    }
    Some(Macros {
        calories: calories.unwrap_or(0.0),
        protein: protein.unwrap_or(0.0),
        carbs: carbs.unwrap_or(0.0),
        fat: fat.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nutriments_prefers_kcal() {
        let n: HashMap<String, Value> = serde_json::from_value(json!({
            "energy-kcal_100g": 539,
            "energy_100g": 2252,
            "proteins_100g": "6.3",
            "carbohydrates_100g": 57.5,
            "fat_100g": 30.9
        }))
        .unwrap();

        let macros = nutriments(&n, "_100g").unwrap();
        assert_eq!(macros, Macros::new(539.0, 6.3, 57.5, 30.9));
        assert!(nutriments(&n, "_serving").is_none());
    }

    #[test]
    fn test_nutriments_from_kilojoules() {
        let n: HashMap<String, Value> =
            serde_json::from_value(json!({"energy_100g": 418.4})).unwrap();
        let macros = nutriments(&n, "_100g").unwrap();
        assert!((macros.calories - 100.0).abs() < 1e-9);
        assert_eq!(macros.protein, 0.0);
    }
}
