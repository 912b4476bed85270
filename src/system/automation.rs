//! Platform automation backends, selected at compile time.

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "macos")]
pub use macos::{check_accessibility_permissions, Accessibility, GlobalKeyTap, KeySynth, SystemPasteboard};

#[cfg(not(target_os = "macos"))]
pub mod fallback;
#[cfg(not(target_os = "macos"))]
pub use fallback::{check_accessibility_permissions, Accessibility, GlobalKeyTap, KeySynth, SystemPasteboard};
