//! Portable backends for platforms without native automation support.
//!
//! Text capture degrades to "nothing selected"; the clipboard goes through
//! `cli-clipboard`.

use cli_clipboard::{ClipboardContext, ClipboardProvider};

use crate::core::activation::hotkey::{KeyEventTap, KeyHandler, TapHandle};
use crate::core::clipboard::{KeyStroke, KeystrokeSink, Pasteboard};
use crate::core::selection::AccessibilityApi;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::AxError;

const NOT_SUPPORTED: &str = "Not supported on this platform";

pub fn check_accessibility_permissions() -> bool {
    false
}

pub struct Accessibility;

impl AccessibilityApi for Accessibility {
    type Element = ();

    fn frontmost_pid(&self) -> Option<u32> {
        None
    }

    fn focused_element(&self, _pid: u32) -> Result<(), AxError> {
        Err(AxError::ATTRIBUTE_UNSUPPORTED)
    }

    fn selected_text(&self, _element: &()) -> Result<String, AxError> {
        Err(AxError::ATTRIBUTE_UNSUPPORTED)
    }
}

pub struct SystemPasteboard;

impl SystemPasteboard {
    fn context() -> AppResult<ClipboardContext> {
        ClipboardContext::new().map_err(|e| AppError::Clipboard(e.to_string()))
    }
}

impl Pasteboard for SystemPasteboard {
    fn clear(&self) -> AppResult<()> {
        Self::context()?
            .clear()
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }

    fn write_text(&self, text: &str) -> AppResult<()> {
        Self::context()?
            .set_contents(text.to_string())
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }

    fn read_text(&self) -> AppResult<Option<String>> {
        let contents = Self::context()?
            .get_contents()
            .map_err(|e| AppError::Clipboard(e.to_string()))?;
        Ok(Some(contents).filter(|text| !text.is_empty()))
    }
}

pub struct KeySynth;

impl KeystrokeSink for KeySynth {
    fn post(&self, _stroke: KeyStroke) -> AppResult<()> {
        Err(AppError::Unsupported(NOT_SUPPORTED.to_string()))
    }
}

pub struct GlobalKeyTap;

impl KeyEventTap for GlobalKeyTap {
    fn install(&self, _handler: KeyHandler) -> AppResult<Box<dyn TapHandle>> {
        Err(AppError::Unsupported(NOT_SUPPORTED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::SelectionProbe;
    use crate::shared::types::SelectionResult;

    #[test]
    fn test_probe_reports_nothing_selected() {
        assert_eq!(SelectionProbe::new(Accessibility).probe(), SelectionResult::NoSelection);
    }

    #[test]
    fn test_input_synthesis_unsupported() {
        let stroke = KeyStroke { key_code: 0x08, key_down: true, flags: Default::default() };
        assert!(matches!(KeySynth.post(stroke), Err(AppError::Unsupported(_))));
    }

    #[test]
    #[ignore] // Touches the real clipboard
    fn test_clipboard_write_read() {
        SystemPasteboard.write_text("translation-popup test").unwrap();
        assert_eq!(
            SystemPasteboard.read_text().unwrap().as_deref(),
            Some("translation-popup test")
        );
    }
}
