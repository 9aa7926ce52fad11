//! Client for the remote nutrition database.
//!
//! Lookups are by normalized food name. "Unknown food" is a normal
//! outcome (`Ok(None)`), signalled either by a 404 or by an empty
//! match in the body; only transport and server failures surface as
//! errors.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use mealscan_core::error::CoreError;
use mealscan_core::nutrients::NutrientsPer100g;
use mealscan_core::ports::{NutritionProvider, ProviderFood};

use crate::{build_client, require_success, transport_err};

pub struct HttpNutritionProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    food: Option<FoodRow>,
}

#[derive(Debug, Deserialize)]
struct FoodRow {
    provider_id: String,
    confidence: f64,
    per_100g: NutrientsPer100g,
}

impl HttpNutritionProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl NutritionProvider for HttpNutritionProvider {
    async fn lookup(
        &self,
        normalized_name: &str,
        locale: &str,
    ) -> Result<Option<ProviderFood>, CoreError> {
        let response = self
            .client
            .get(format!("{}/v1/foods/lookup", self.base_url))
            .query(&[("name", normalized_name), ("locale", locale)])
            .send()
            .await
            .map_err(|e| transport_err("nutrition", e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = require_success("nutrition", response).await?;

        let parsed: LookupResponse = response
            .json()
            .await
            .map_err(|e| transport_err("nutrition", e))?;

        Ok(parsed.food.map(|f| ProviderFood {
            provider_id: f.provider_id,
            per_100g: f.per_100g,
            confidence: f.confidence,
        }))
    }
}
