//! Popup surface that renders to the log.
//!
//! Waits out the configured animation durations so the controller sees the
//! same suspension points as with a real window.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::core::activation::PopupSurface;
use crate::shared::settings::{language_name, ActivationSettings};
use crate::shared::types::{PopupContent, Rect, TranslationView};

pub struct HeadlessSurface {
    reveal: Duration,
    conceal: Duration,
    shown: Mutex<Option<PopupContent>>,
}

impl HeadlessSurface {
    pub fn new(settings: &ActivationSettings) -> Self {
        Self {
            reveal: settings.reveal(),
            conceal: settings.conceal(),
            shown: Mutex::new(None),
        }
    }

    pub fn shown(&self) -> Option<PopupContent> {
        self.shown.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn render(content: &PopupContent) {
        let translation = match &content.translation {
            TranslationView::Pending => "...",
            TranslationView::Translated(text) => text.as_str(),
            TranslationView::Failed(placeholder) => placeholder.as_str(),
        };
        info!(
            pair = %content.languages.label(),
            from = language_name(&content.languages.source).unwrap_or("?"),
            to = language_name(&content.languages.target).unwrap_or("?"),
            source = content.display_text(),
            translation,
            "[Popup]"
        );
    }

    fn store(&self, content: Option<PopupContent>) {
        *self.shown.lock().unwrap_or_else(|p| p.into_inner()) = content;
    }
}

#[async_trait]
impl PopupSurface for HeadlessSurface {
    async fn reveal(&self, content: &PopupContent, origin: Rect, frame: Rect) {
        info!(
            from_x = origin.x,
            from_y = origin.y,
            x = frame.x,
            y = frame.y,
            width = frame.width,
            height = frame.height,
            "[Popup] reveal"
        );
        Self::render(content);
        self.store(Some(content.clone()));
        tokio::time::sleep(self.reveal).await;
    }

    async fn conceal(&self) {
        info!("[Popup] conceal");
        tokio::time::sleep(self.conceal).await;
        self.store(None);
    }

    fn refresh(&self, content: &PopupContent) {
        Self::render(content);
        self.store(Some(content.clone()));
    }
}
