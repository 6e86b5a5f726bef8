//! USDA FoodData Central - text search and branded-food barcode lookup
//!
//! `foodNutrients` in search results are per 100 g.

use serde::Deserialize;

use super::{FoodProduct, LookupError, Source, get_json, same_barcode};
use crate::nutrition::Macros;

const SERVICE: &str = "USDA FoodData Central";
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    description: String,
    #[serde(default)]
    brand_owner: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    gtin_upc: Option<String>,
    #[serde(default)]
    serving_size: Option<f64>,
    #[serde(default)]
    serving_size_unit: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    #[serde(default)]
    nutrient_name: String,
    #[serde(default)]
    unit_name: String,
    #[serde(default)]
    value: Option<f64>,
}

impl SearchFood {
    fn into_product(self) -> FoodProduct {
        let mut macros = Macros::default();
        let mut seen = false;
        for n in &self.food_nutrients {
            let Some(value) = n.value else { continue };
            let slot = match n.nutrient_name.as_str() {
                "Energy" if n.unit_name.eq_ignore_ascii_case("KCAL") => &mut macros.calories,
                "Protein" => &mut macros.protein,
                "Carbohydrate, by difference" => &mut macros.carbs,
                "Total lipid (fat)" => &mut macros.fat,
                _ => continue,
            };
            *slot = value;
            seen = true;
        }

        let serving_grams = match self.serving_size_unit.as_deref() {
            Some(unit) if unit.eq_ignore_ascii_case("g") || unit.eq_ignore_ascii_case("grm") => {
                self.serving_size
            }
            _ => None,
        };
        let serving_size = match (self.serving_size, &self.serving_size_unit) {
            (Some(size), Some(unit)) => Some(format!("{size} {}", unit.to_lowercase())),
            _ => None,
        };

        FoodProduct {
            brand: self.brand_name.or(self.brand_owner),
            barcode: self.gtin_upc,
            serving_size,
            serving_grams,
            per_100g: seen.then_some(macros),
            ..FoodProduct::new(self.description, Source::Usda)
        }
    }
}

#[derive(Clone)]
pub struct UsdaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl UsdaClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn query(
        &self,
        query: &str,
        page_size: usize,
        data_type: Option<&str>,
    ) -> Result<Vec<SearchFood>, LookupError> {
        let url = format!("{}/foods/search", self.base_url);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("query", query),
            ("pageSize", page_size.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(data_type) = data_type {
            params.push(("dataType", data_type));
        }

        let response = get_json::<SearchResponse>(SERVICE, self.http.get(&url).query(&params)).await?;
        Ok(response.map(|r| r.foods).unwrap_or_default())
    }

    /// Search foods by description
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoodProduct>, LookupError> {
        let foods = self.query(query, limit, None).await?;
        Ok(foods
            .into_iter()
            .take(limit)
            .map(SearchFood::into_product)
            .collect())
    }

    /// Branded food whose GTIN/UPC matches the barcode
    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        let foods = self.query(barcode, 10, Some("Branded")).await?;
        Ok(foods
            .into_iter()
            .find(|f| f.gtin_upc.as_deref().is_some_and(|g| same_barcode(g, barcode)))
            .map(SearchFood::into_product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_product_picks_kcal() {
        let food: SearchFood = serde_json::from_str(
            r#"{
                "description": "PEANUT BUTTER",
                "brandOwner": "Acme Foods",
                "gtinUpc": "041234567890",
                "servingSize": 32,
                "servingSizeUnit": "g",
                "foodNutrients": [
                    {"nutrientName": "Energy", "unitName": "kJ", "value": 2470},
                    {"nutrientName": "Energy", "unitName": "KCAL", "value": 590},
                    {"nutrientName": "Protein", "unitName": "G", "value": 25},
                    {"nutrientName": "Carbohydrate, by difference", "unitName": "G", "value": 20},
                    {"nutrientName": "Total lipid (fat)", "unitName": "G", "value": 50},
                    {"nutrientName": "Sodium, Na", "unitName": "MG", "value": 400}
                ]
            }"#,
        )
        .unwrap();

        let product = food.into_product();
        assert_eq!(product.per_100g, Some(Macros::new(590.0, 25.0, 20.0, 50.0)));
        assert_eq!(product.brand.as_deref(), Some("Acme Foods"));
        assert_eq!(product.serving_grams, Some(32.0));
        assert_eq!(product.serving_size.as_deref(), Some("32 g"));
    }

    #[test]
    fn test_into_product_without_nutrients() {
        let food: SearchFood = serde_json::from_str(r#"{"description": "WATER"}"#).unwrap();
        let product = food.into_product();
        assert!(product.per_100g.is_none());
        assert!(!product.has_macros());
    }
}
