//! UPCitemdb trial API - product name and brand only, no nutrition data

use serde::Deserialize;

use super::{FoodProduct, LookupError, Source, get_json};

const SERVICE: &str = "UPCitemdb";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    size: Option<String>,
}

#[derive(Clone)]
pub struct UpcItemDbClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpcItemDbClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        let url = format!("{}/prod/trial/lookup", self.base_url);
        let request = self.http.get(&url).query(&[("upc", barcode)]);

        let Some(response) = get_json::<LookupResponse>(SERVICE, request).await? else {
            return Ok(None);
        };
        if response.code != "OK" {
            return Ok(None);
        }

        let product = response
            .items
            .into_iter()
            .find(|item| !item.title.trim().is_empty())
            .map(|item| FoodProduct {
                brand: item.brand.filter(|b| !b.trim().is_empty()),
                barcode: Some(barcode.to_string()),
                serving_size: item.size.filter(|s| !s.trim().is_empty()),
                ..FoodProduct::new(item.title.trim(), Source::UpcItemDb)
            });
        Ok(product)
    }
}
