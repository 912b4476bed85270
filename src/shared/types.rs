use serde::{Deserialize, Serialize};

/// Shown by a surface in place of empty source text.
pub const EMPTY_SELECTION_PLACEHOLDER: &str = "Select text to translate...";

/// Shown in place of the translation when the request failed.
pub const TRANSLATION_FAILED_PLACEHOLDER: &str = "Translation unavailable";

// ============================================================================
// Activation
// ============================================================================

/// Which trigger owns the currently visible popup.
///
/// Gesture-owned popups hide when the cursor leaves both the hot corner and
/// the popup; hotkey-owned popups hide on a timer or a repeated chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationMethod {
    #[default]
    None,
    Gesture,
    Hotkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationDirection {
    Reveal,
    Conceal,
}

/// Externally observable popup visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupVisibility {
    Hidden,
    Animating(AnimationDirection),
    Visible,
}

/// Persisted hotkey preference, re-read whenever the user toggles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub enabled: bool,
    pub key_index: usize,
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        Self {
            enabled: true,
            key_index: 0,
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Raw accessibility error code as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxError(pub i32);

impl AxError {
    pub const FAILURE: AxError = AxError(-25200);
    pub const CANNOT_COMPLETE: AxError = AxError(-25204);
    pub const ATTRIBUTE_UNSUPPORTED: AxError = AxError(-25205);
    pub const API_DISABLED: AxError = AxError(-25211);
    pub const NO_VALUE: AxError = AxError(-25212);

    pub fn code(&self) -> i32 {
        self.0
    }

    /// Codes for which the focused app cannot answer the selection query but
    /// may still honour a synthesized copy.
    pub fn allows_clipboard_fallback(&self) -> bool {
        *self == Self::ATTRIBUTE_UNSUPPORTED || *self == Self::CANNOT_COMPLETE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    Success(String),
    NoSelection,
    Error(AxError),
}

// ============================================================================
// Geometry (bottom-left origin, y grows upwards)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn mid_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment, matching the platform's frame hit test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }
}

// ============================================================================
// Languages and popup content
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Compact selector label, e.g. `Ru -> En`.
    pub fn label(&self) -> String {
        format!("{} -> {}", short_label(&self.source), short_label(&self.target))
    }
}

fn short_label(code: &str) -> String {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationView {
    Pending,
    Translated(String),
    Failed(String),
}

/// What the popup surface renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    /// Normalized captured text; never empty once a reveal presents it.
    pub source_text: String,
    pub languages: LanguagePair,
    pub translation: TranslationView,
}

impl PopupContent {
    pub fn display_text(&self) -> &str {
        if self.source_text.is_empty() {
            EMPTY_SELECTION_PLACEHOLDER
        } else {
            &self.source_text
        }
    }

    pub fn translated_text(&self) -> Option<&str> {
        match &self.translation {
            TranslationView::Translated(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_codes() {
        assert!(AxError::ATTRIBUTE_UNSUPPORTED.allows_clipboard_fallback());
        assert!(AxError::CANNOT_COMPLETE.allows_clipboard_fallback());
        assert!(!AxError::NO_VALUE.allows_clipboard_fallback());
        assert!(!AxError::API_DISABLED.allows_clipboard_fallback());
        assert!(!AxError(-1).allows_clipboard_fallback());
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(rect.contains(Point::new(109.9, 69.9)));
        assert!(!rect.contains(Point::new(110.0, 30.0)));
        assert!(!rect.contains(Point::new(50.0, 70.0)));
    }

    #[test]
    fn language_pair_label() {
        assert_eq!(LanguagePair::new("ru", "en").label(), "Ru -> En");
    }

    #[test]
    fn placeholder_when_nothing_captured() {
        let content = PopupContent {
            source_text: String::new(),
            languages: LanguagePair::new("ru", "en"),
            translation: TranslationView::Pending,
        };
        assert_eq!(content.display_text(), EMPTY_SELECTION_PLACEHOLDER);
        assert_eq!(content.translated_text(), None);
    }
}
