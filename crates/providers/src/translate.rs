//! Client for the translation service used to localize item display
//! names. Callers treat translation as best-effort; this client only
//! reports what the service did.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use mealscan_core::error::CoreError;
use mealscan_core::ports::Translator;

use crate::{build_client, require_success, transport_err};

pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated: String,
}

impl HttpTranslator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_locale: &str) -> Result<String, CoreError> {
        let response = self
            .client
            .post(format!("{}/v1/translate", self.base_url))
            .json(&serde_json::json!({
                "text": text,
                "target_locale": target_locale,
            }))
            .send()
            .await
            .map_err(|e| transport_err("translate", e))?;
        let response = require_success("translate", response).await?;

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| transport_err("translate", e))?;
        Ok(parsed.translated)
    }
}
