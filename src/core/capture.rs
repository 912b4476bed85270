//! Resolves the selection probe and clipboard fallback into one decision.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::clipboard::ClipboardBridge;
use crate::core::selection::SelectionSource;
use crate::shared::types::SelectionResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Text to translate.
    Text(String),
    /// Nothing selected, or the clipboard fallback came back empty.
    NoText,
    /// Unexpected accessibility failure; drop the attempt silently.
    Abandoned,
}

/// Probe the selection first; fall back to the clipboard only for the codes
/// that mean the app cannot answer the query.
///
/// The probe makes blocking IPC calls into the foreground app, so it runs on
/// the blocking pool.
pub async fn acquire(selection: Arc<dyn SelectionSource>, clipboard: &ClipboardBridge) -> Acquisition {
    let probed = match tokio::task::spawn_blocking(move || selection.probe()).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "selection probe did not complete, abandoning activation");
            return Acquisition::Abandoned;
        }
    };

    match probed {
        SelectionResult::Success(text) => {
            debug!(chars = text.chars().count(), "selection captured via accessibility");
            Acquisition::Text(text)
        }
        SelectionResult::NoSelection => {
            debug!("nothing selected");
            Acquisition::NoText
        }
        SelectionResult::Error(code) if code.allows_clipboard_fallback() => {
            debug!(code = code.code(), "accessibility cannot answer, falling back to clipboard");
            match clipboard.capture().await {
                Some(text) => Acquisition::Text(text),
                None => Acquisition::NoText,
            }
        }
        SelectionResult::Error(code) => {
            warn!(code = code.code(), "unexpected accessibility error, abandoning activation");
            Acquisition::Abandoned
        }
    }
}
