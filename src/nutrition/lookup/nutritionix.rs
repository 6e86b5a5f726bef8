//! Nutritionix item search by UPC (per-serving values)

use serde::Deserialize;

use super::{FoodProduct, LookupError, Source, get_json};
use crate::config::AppCredentials;
use crate::nutrition::Macros;

const SERVICE: &str = "Nutritionix";

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    foods: Vec<Food>,
}

#[derive(Debug, Deserialize)]
struct Food {
    food_name: String,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    serving_qty: Option<f64>,
    #[serde(default)]
    serving_unit: Option<String>,
    #[serde(default)]
    serving_weight_grams: Option<f64>,
    #[serde(default)]
    nf_calories: Option<f64>,
    #[serde(default)]
    nf_protein: Option<f64>,
    #[serde(default)]
    nf_total_carbohydrate: Option<f64>,
    #[serde(default)]
    nf_total_fat: Option<f64>,
}

#[derive(Clone)]
pub struct NutritionixClient {
    http: reqwest::Client,
    base_url: String,
    credentials: AppCredentials,
}

impl NutritionixClient {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: AppCredentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        let url = format!("{}/v2/search/item", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&[("upc", barcode)])
            .header("x-app-id", &self.credentials.app_id)
            .header("x-app-key", &self.credentials.app_key);

        let Some(response) = get_json::<ItemResponse>(SERVICE, request).await? else {
            return Ok(None);
        };
        let Some(food) = response.foods.into_iter().next() else {
            return Ok(None);
        };

        let per_serving = Macros {
            calories: food.nf_calories.unwrap_or(0.0),
            protein: food.nf_protein.unwrap_or(0.0),
            carbs: food.nf_total_carbohydrate.unwrap_or(0.0),
            fat: food.nf_total_fat.unwrap_or(0.0),
        };
        let grams = food.serving_weight_grams.filter(|g| *g > 0.0);
        let serving_size = match (food.serving_qty, food.serving_unit) {
            (Some(qty), Some(unit)) => Some(format!("{qty} {unit}")),
            (None, Some(unit)) => Some(unit),
            _ => None,
        };

        Ok(Some(FoodProduct {
            brand: food.brand_name,
            barcode: Some(barcode.to_string()),
            serving_size,
            serving_grams: grams,
            per_100g: grams.map(|g| per_serving.scale(100.0 / g)),
            per_serving: Some(per_serving),
            ..FoodProduct::new(food.food_name, Source::Nutritionix)
        }))
    }
}
