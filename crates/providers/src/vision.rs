//! Client for the vision extraction service.
//!
//! One endpoint covers both input kinds: image submissions send the
//! URL for the service to fetch, text submissions send the free-text
//! meal description for the same structured-extraction model.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use mealscan_core::error::CoreError;
use mealscan_core::job::AnalysisInput;
use mealscan_core::ports::{FoodCandidate, VisionExtractor};

use crate::{build_client, require_success, transport_err};

pub struct HttpVisionExtractor {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    items: Vec<ExtractedItem>,
}

#[derive(Debug, Deserialize)]
struct ExtractedItem {
    name: String,
    portion_g: f64,
    calories: f64,
    #[serde(default)]
    protein_g: f64,
    #[serde(default)]
    carbs_g: f64,
    #[serde(default)]
    fat_g: f64,
}

impl HttpVisionExtractor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VisionExtractor for HttpVisionExtractor {
    async fn extract(
        &self,
        input: &AnalysisInput,
        locale: &str,
    ) -> Result<Vec<FoodCandidate>, CoreError> {
        let body = match input {
            AnalysisInput::ImageUrl(url) => serde_json::json!({
                "image_url": url,
                "locale": locale,
            }),
            AnalysisInput::TextQuery(text) => serde_json::json!({
                "text": text,
                "locale": locale,
            }),
        };

        let response = self
            .client
            .post(format!("{}/v1/extract", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_err("vision", e))?;
        let response = require_success("vision", response).await?;

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| transport_err("vision", e))?;

        tracing::debug!(count = parsed.items.len(), "extraction returned");
        Ok(parsed
            .items
            .into_iter()
            .map(|i| FoodCandidate {
                name: i.name,
                portion_g: i.portion_g,
                calories: i.calories,
                protein_g: i.protein_g,
                carbs_g: i.carbs_g,
                fat_g: i.fat_g,
            })
            .collect())
    }
}
