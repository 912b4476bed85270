//! Messages delivered to the activation controller.
//!
//! Every OS callback (cursor tick, hotkey, animation completion, timers,
//! network responses) is turned into one of these and processed in order by
//! the single task that owns the popup state.

use tokio::sync::mpsc::UnboundedSender;

use crate::core::features::translator::Translation;
use crate::shared::error::AppResult;
use crate::shared::types::{HotkeyBinding, LanguagePair, Point, PopupContent, Rect};

pub type EventSender = UnboundedSender<ControllerEvent>;

#[derive(Debug)]
pub enum ControllerEvent {
    /// Periodic cursor sample together with the main screen frame.
    CursorSample { cursor: Point, screen: Rect },

    /// The configured hotkey chord was pressed (already filtered).
    HotkeyPressed,

    /// The reveal sequence of `attempt` ended.
    RevealFinished { attempt: u64, outcome: RevealOutcome },

    /// The conceal animation of `attempt` ended.
    ConcealFinished { attempt: u64 },

    /// Auto-hide timer of the given generation fired.
    AutoHideElapsed { generation: u64 },

    /// Background re-translation after a language change.
    TranslationArrived {
        attempt: u64,
        languages: LanguagePair,
        result: AppResult<Translation>,
    },

    SetHotkeyBinding(HotkeyBinding),

    SetLanguages(LanguagePair),

    /// Write the displayed translation to the clipboard.
    CopyTranslation,

    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RevealOutcome {
    /// Text was captured and the popup is now on screen.
    Presented { content: PopupContent, frame: Rect },
    /// Nothing selected, or the clipboard came back empty.
    NoText,
    /// Unexpected accessibility failure, or the sequence was torn down.
    Abandoned,
}
