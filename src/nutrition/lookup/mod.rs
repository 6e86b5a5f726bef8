//! Food lookup against the curated food list and public nutrition APIs
//!
//! Providers are asked one after another, first hit wins. Any provider failure
//! is logged and treated as "not found"; callers only see `found: false`.

pub mod curated;
pub mod edamam;
pub mod nutritionix;
pub mod open_food_facts;
pub mod upcitemdb;
pub mod usda;

pub use curated::CuratedFoods;
pub use edamam::EdamamClient;
pub use nutritionix::NutritionixClient;
pub use open_food_facts::OpenFoodFactsClient;
pub use upcitemdb::UpcItemDbClient;
pub use usda::UsdaClient;

use std::fmt;

use anyhow::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Macros, Meal};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Curated,
    OpenFoodFacts,
    Nutritionix,
    Edamam,
    Usda,
    UpcItemDb,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Curated => "curated",
            Source::OpenFoodFacts => "Open Food Facts",
            Source::Nutritionix => "Nutritionix",
            Source::Edamam => "Edamam",
            Source::Usda => "USDA FoodData Central",
            Source::UpcItemDb => "UPCitemdb",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{service}: request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service}: HTTP {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },
    #[error("{service}: unexpected response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid barcode {0:?}")]
    InvalidBarcode(String),
}

/// Product as reported by one source. Macro values may be missing entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodProduct {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    /// Free-form label, e.g. "30 g" or "1 cup"
    pub serving_size: Option<String>,
    pub serving_grams: Option<f64>,
    pub per_100g: Option<Macros>,
    pub per_serving: Option<Macros>,
    pub source: Source,
}

impl FoodProduct {
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            brand: None,
            barcode: None,
            serving_size: None,
            serving_grams: None,
            per_100g: None,
            per_serving: None,
            source,
        }
    }

    pub fn has_macros(&self) -> bool {
        self.per_100g.is_some() || self.per_serving.is_some()
    }

    /// Macros for a portion in grams
    pub fn macros_for(&self, grams: f64) -> Option<Macros> {
        if let Some(per_100g) = self.per_100g {
            return Some(per_100g.scale(grams / 100.0));
        }
        match (self.per_serving, self.serving_grams) {
            (Some(per_serving), Some(serving)) if serving > 0.0 => {
                Some(per_serving.scale(grams / serving))
            }
            _ => None,
        }
    }

    /// Meal entry for a portion; falls back to one serving when grams are not given
    pub fn to_meal(&self, grams: Option<f64>) -> Option<Meal> {
        let macros = match grams {
            Some(grams) => self.macros_for(grams)?,
            None => self
                .per_serving
                .or_else(|| self.serving_grams.and_then(|g| self.macros_for(g)))
                .or(self.per_100g)?,
        };
        let name = match &self.brand {
            Some(brand) => format!("{} ({})", self.name, brand),
            None => self.name.clone(),
        };
        Some(Meal {
            id: 0,
            name,
            time: None,
            macros,
            barcode: self.barcode.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupOutcome {
    pub found: bool,
    pub product: Option<FoodProduct>,
    /// Which source answered
    pub source: Option<Source>,
}

impl LookupOutcome {
    pub fn not_found() -> Self {
        Self { found: false, product: None, source: None }
    }

    pub fn found(product: FoodProduct) -> Self {
        Self {
            found: true,
            source: Some(product.source),
            product: Some(product),
        }
    }
}

/// One remote nutrition API
pub enum Provider {
    OpenFoodFacts(OpenFoodFactsClient),
    Nutritionix(NutritionixClient),
    Edamam(EdamamClient),
    Usda(UsdaClient),
    UpcItemDb(UpcItemDbClient),
}

impl Provider {
    pub fn source(&self) -> Source {
        match self {
            Provider::OpenFoodFacts(_) => Source::OpenFoodFacts,
            Provider::Nutritionix(_) => Source::Nutritionix,
            Provider::Edamam(_) => Source::Edamam,
            Provider::Usda(_) => Source::Usda,
            Provider::UpcItemDb(_) => Source::UpcItemDb,
        }
    }

    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Option<FoodProduct>, LookupError> {
        match self {
            Provider::OpenFoodFacts(client) => client.lookup_barcode(barcode).await,
            Provider::Nutritionix(client) => client.lookup_barcode(barcode).await,
            Provider::Edamam(client) => client.lookup_barcode(barcode).await,
            Provider::Usda(client) => client.lookup_barcode(barcode).await,
            Provider::UpcItemDb(client) => client.lookup_barcode(barcode).await,
        }
    }
}

/// Sequential lookup over the curated list and the configured providers
pub struct FoodLookup {
    curated: Option<CuratedFoods>,
    providers: Vec<Provider>,
    usda: Option<UsdaClient>,
}

impl FoodLookup {
    pub fn new(curated: Option<CuratedFoods>, providers: Vec<Provider>) -> Self {
        Self { curated, providers, usda: None }
    }

    /// Use a USDA client for text search
    pub fn with_search(mut self, usda: UsdaClient) -> Self {
        self.usda = Some(usda);
        self
    }

    /// Build the standard provider chain.
    ///
    /// Order: curated, Open Food Facts, Nutritionix, Edamam, USDA, UPCitemdb.
    /// Nutritionix and Edamam are skipped without credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("gymfuel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let p = &config.providers;

        let curated = match &config.foods_path {
            Some(path) => Some(CuratedFoods::load(path)?),
            None => None,
        };

        let mut providers = vec![Provider::OpenFoodFacts(OpenFoodFactsClient::new(
            http.clone(),
            &p.open_food_facts_url,
        ))];
        match &p.nutritionix {
            Some(creds) => providers.push(Provider::Nutritionix(NutritionixClient::new(
                http.clone(),
                &p.nutritionix_url,
                creds.clone(),
            ))),
            None => debug!("Nutritionix credentials not set, provider disabled"),
        }
        match &p.edamam {
            Some(creds) => providers.push(Provider::Edamam(EdamamClient::new(
                http.clone(),
                &p.edamam_url,
                creds.clone(),
            ))),
            None => debug!("Edamam credentials not set, provider disabled"),
        }
        let usda = UsdaClient::new(http.clone(), &p.usda_url, &p.usda_api_key);
        providers.push(Provider::Usda(usda.clone()));
        providers.push(Provider::UpcItemDb(UpcItemDbClient::new(http, &p.upcitemdb_url)));

        Ok(Self::new(curated, providers).with_search(usda))
    }

    /// Look up a product by barcode. Never fails; errors become `found: false`.
    pub async fn barcode(&self, barcode: &str) -> LookupOutcome {
        let barcode = match normalize_barcode(barcode) {
            Ok(code) => code,
            Err(e) => {
                warn!("{}", e);
                return LookupOutcome::not_found();
            }
        };

        if let Some(product) = self.curated.as_ref().and_then(|c| c.by_barcode(&barcode)) {
            info!("Barcode {} found in curated foods", barcode);
            return LookupOutcome::found(product);
        }

        for provider in &self.providers {
            match provider.lookup_barcode(&barcode).await {
                Ok(Some(product)) => {
                    info!("Barcode {} found via {}", barcode, provider.source());
                    return LookupOutcome::found(product);
                }
                Ok(None) => debug!("Barcode {} not in {}", barcode, provider.source()),
                Err(e) => warn!("Barcode lookup failed: {}", e),
            }
        }

        LookupOutcome::not_found()
    }

    /// Text search: curated matches first, then USDA. Never fails.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<FoodProduct> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut results: Vec<FoodProduct> = self
            .curated
            .as_ref()
            .map(|c| c.search(query, limit))
            .unwrap_or_default();

        if results.len() < limit
            && let Some(usda) = &self.usda
        {
            match usda.search(query, limit - results.len()).await {
                Ok(found) => results.extend(found),
                Err(e) => warn!("Food search failed: {}", e),
            }
        }

        results.truncate(limit);
        results
    }
}

/// Strip spaces and dashes; barcodes are 6-14 digits
pub fn normalize_barcode(raw: &str) -> Result<String, LookupError> {
    let code: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if (6..=14).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(LookupError::InvalidBarcode(raw.to_string()))
    }
}

/// Same barcode ignoring leading zeros (UPC-A vs EAN-13 vs GTIN-14).
/// All-zero codes never match.
pub(crate) fn same_barcode(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    !a.is_empty() && a == b
}

/// Send a GET and decode JSON. 404 means "not found", not an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Option<T>, LookupError> {
    let response = request
        .send()
        .await
        .map_err(|source| LookupError::Http { service, source })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(LookupError::Status { service, status });
    }

    let body = response
        .json::<T>()
        .await
        .map_err(|source| LookupError::Decode { service, source })?;
    Ok(Some(body))
}

/// Number from a JSON value that may also be a numeric string
pub(crate) fn number(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
