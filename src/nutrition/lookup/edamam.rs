//! Edamam food database parser endpoint (per 100 g values)

use std::collections::HashMap;

use serde::Deserialize;

use super::{FoodProduct, LookupError, Source, get_json};
use crate::config::AppCredentials;
use crate::nutrition::Macros;

const SERVICE: &str = "Edamam";

#[derive(Debug, Deserialize)]
struct ParserResponse {
    #[serde(default)]
    hints: Vec<Hint>,
}

#[derive(Debug, Deserialize)]
struct Hint {
    food: Food,
}

#[derive(Debug, Deserialize)]
struct Food {
    label: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    nutrients: HashMap<String, f64>,
}

#[derive(Clone)]
pub struct EdamamClient {
    http: reqwest::Client,
    base_url: String,
    credentials: AppCredentials,
}

impl EdamamClient {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: AppCredentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        let url = format!("{}/api/food-database/v2/parser", self.base_url);
        let request = self.http.get(&url).query(&[
            ("upc", barcode),
            ("app_id", self.credentials.app_id.as_str()),
            ("app_key", self.credentials.app_key.as_str()),
        ]);

        let Some(response) = get_json::<ParserResponse>(SERVICE, request).await? else {
            return Ok(None);
        };
        let Some(hint) = response.hints.into_iter().next() else {
            return Ok(None);
        };

        let food = hint.food;
        let get = |key: &str| food.nutrients.get(key).copied();
        let per_100g = (!food.nutrients.is_empty()).then(|| Macros {
            calories: get("ENERC_KCAL").unwrap_or(0.0),
            protein: get("PROCNT").unwrap_or(0.0),
            carbs: get("CHOCDF").unwrap_or(0.0),
            fat: get("FAT").unwrap_or(0.0),
        });

        Ok(Some(FoodProduct {
            brand: food.brand,
            barcode: Some(barcode.to_string()),
            per_100g,
            ..FoodProduct::new(food.label, Source::Edamam)
        }))
    }
}
