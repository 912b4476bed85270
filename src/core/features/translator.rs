//! Translator feature
//!
//! Posts the captured text to the configured endpoint and remembers the last
//! successful call so that re-opening the popup on the same selection does
//! not hit the network again.

pub mod types;

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::TranslationSettings;

pub use types::{Translation, TranslationRequest};
use types::CachedTranslation;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> AppResult<Translation>;
}

pub struct TranslationClient {
    http: Client,
    endpoint: String,
    last: Mutex<Option<CachedTranslation>>,
}

impl TranslationClient {
    pub fn new(settings: &TranslationSettings) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("translation-popup/translator")
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            last: Mutex::new(None),
        })
    }

    fn cached(&self, request: &TranslationRequest) -> Option<Translation> {
        let last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        last.as_ref()
            .filter(|entry| &entry.request == request)
            .map(|entry| entry.response.clone())
    }

    fn remember(&self, request: TranslationRequest, response: Translation) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(CachedTranslation { request, response });
    }

    async fn fetch(&self, request: &TranslationRequest) -> AppResult<Translation> {
        let res = self.http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus(status.as_u16()));
        }

        let body = res.bytes().await.map_err(|e| AppError::Network(e.to_string()))?;
        serde_json::from_slice::<Translation>(&body)
            .map_err(|e| AppError::Decode(format!("Failed to parse translation response: {}", e)))
    }
}

#[async_trait]
impl Translator for TranslationClient {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> AppResult<Translation> {
        let request = TranslationRequest::new(text, source_lang, target_lang);

        if let Some(hit) = self.cached(&request) {
            debug!(source_lang, target_lang, "translation served from last-request memo");
            return Ok(hit);
        }

        match self.fetch(&request).await {
            Ok(translation) => {
                debug!(source_lang, target_lang, "translation received");
                self.remember(request, translation.clone());
                Ok(translation)
            }
            Err(e) => {
                warn!(error = %e, source_lang, target_lang, "translation request failed");
                Err(e)
            }
        }
    }
}
