//! Clipboard fallback: clear, synthesize a copy, settle, read back.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::activation::hotkey::Modifiers;
use crate::core::text;
use crate::shared::error::AppResult;
use crate::shared::settings::ActivationSettings;

/// Process-wide shared pasteboard.
pub trait Pasteboard: Send + Sync {
    fn clear(&self) -> AppResult<()>;
    fn write_text(&self, text: &str) -> AppResult<()>;
    fn read_text(&self) -> AppResult<Option<String>>;
}

/// One synthesized key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key_code: u16,
    pub key_down: bool,
    pub flags: Modifiers,
}

/// Injects key transitions into the OS input stream.
pub trait KeystrokeSink: Send + Sync {
    fn post(&self, stroke: KeyStroke) -> AppResult<()>;
}

/// Modifier key plus letter key of the platform copy shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyShortcut {
    pub modifier_key: u16,
    pub key: u16,
    pub flags: Modifiers,
}

impl CopyShortcut {
    /// Cmd+C with macOS ANSI virtual key codes.
    pub const COMMAND_C: CopyShortcut = CopyShortcut {
        modifier_key: 0x37,
        key: 0x08,
        flags: Modifiers::COMMAND,
    };

    /// Modifier down, key down, key up, modifier up.
    pub fn sequence(&self) -> [KeyStroke; 4] {
        [
            KeyStroke { key_code: self.modifier_key, key_down: true, flags: self.flags },
            KeyStroke { key_code: self.key, key_down: true, flags: self.flags },
            KeyStroke { key_code: self.key, key_down: false, flags: self.flags },
            KeyStroke { key_code: self.modifier_key, key_down: false, flags: Modifiers::NONE },
        ]
    }
}

pub struct ClipboardBridge {
    pasteboard: Arc<dyn Pasteboard>,
    keys: Arc<dyn KeystrokeSink>,
    shortcut: CopyShortcut,
    keystroke_gap: Duration,
    settle: Duration,
}

impl ClipboardBridge {
    pub fn new(
        pasteboard: Arc<dyn Pasteboard>,
        keys: Arc<dyn KeystrokeSink>,
        settings: &ActivationSettings,
    ) -> Self {
        Self {
            pasteboard,
            keys,
            shortcut: CopyShortcut::COMMAND_C,
            keystroke_gap: settings.keystroke_gap(),
            settle: settings.clipboard_settle(),
        }
    }

    /// Copy the foreground selection through the clipboard.
    ///
    /// Racy by nature: the foreground app must finish its copy within the
    /// settle window. Any failure yields `None`.
    pub async fn capture(&self) -> Option<String> {
        if let Err(e) = self.pasteboard.clear() {
            warn!(error = %e, "failed to clear clipboard before copy");
            return None;
        }

        if let Err(e) = self.synthesize_copy().await {
            warn!(error = %e, "failed to synthesize copy shortcut");
            return None;
        }

        tokio::time::sleep(self.settle).await;

        match self.pasteboard.read_text() {
            Ok(Some(raw)) => {
                let text = text::normalize_non_empty(&raw);
                debug!(captured = text.is_some(), "clipboard read back");
                text
            }
            Ok(None) => {
                debug!("clipboard empty after copy");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to read clipboard");
                None
            }
        }
    }

    /// Put `text` on the clipboard.
    pub fn write(&self, text: &str) -> AppResult<()> {
        self.pasteboard.clear()?;
        self.pasteboard.write_text(text)
    }

    async fn synthesize_copy(&self) -> AppResult<()> {
        let strokes = self.shortcut.sequence();
        for (i, stroke) in strokes.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.keystroke_gap).await;
            }
            self.keys.post(*stroke)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use std::sync::Mutex;

    /// In-memory pasteboard whose content appears once a copy is synthesized.
    #[derive(Default)]
    pub(crate) struct FakePasteboard {
        pub content: Mutex<Option<String>>,
        pub on_copy: Mutex<Option<String>>,
        pub clears: Mutex<usize>,
        pub writes: Mutex<Vec<String>>,
    }

    impl FakePasteboard {
        pub fn copying(text: &str) -> Arc<Self> {
            let board = Self::default();
            *board.on_copy.lock().unwrap() = Some(text.to_string());
            Arc::new(board)
        }

        pub fn clear_count(&self) -> usize {
            *self.clears.lock().unwrap()
        }

        fn simulate_copy(&self) {
            let copied = self.on_copy.lock().unwrap().clone();
            if copied.is_some() {
                *self.content.lock().unwrap() = copied;
            }
        }
    }

    impl Pasteboard for FakePasteboard {
        fn clear(&self) -> AppResult<()> {
            *self.clears.lock().unwrap() += 1;
            *self.content.lock().unwrap() = None;
            Ok(())
        }

        fn write_text(&self, text: &str) -> AppResult<()> {
            self.writes.lock().unwrap().push(text.to_string());
            *self.content.lock().unwrap() = Some(text.to_string());
            Ok(())
        }

        fn read_text(&self) -> AppResult<Option<String>> {
            Ok(self.content.lock().unwrap().clone())
        }
    }

    /// Records strokes and triggers the pasteboard copy on the key-up.
    pub(crate) struct FakeKeys {
        pub board: Arc<FakePasteboard>,
        pub strokes: Mutex<Vec<KeyStroke>>,
        pub fail: bool,
    }

    impl FakeKeys {
        pub fn new(board: Arc<FakePasteboard>) -> Arc<Self> {
            Arc::new(Self {
                board,
                strokes: Mutex::new(Vec::new()),
                fail: false,
            })
        }
    }

    impl KeystrokeSink for FakeKeys {
        fn post(&self, stroke: KeyStroke) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Unsupported("no input synthesis".to_string()));
            }
            self.strokes.lock().unwrap().push(stroke);
            if stroke.key_code == CopyShortcut::COMMAND_C.key && !stroke.key_down {
                self.board.simulate_copy();
            }
            Ok(())
        }
    }

    fn bridge(board: Arc<FakePasteboard>, keys: Arc<FakeKeys>) -> ClipboardBridge {
        ClipboardBridge::new(board, keys, &ActivationSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_normalizes_copied_text() {
        let board = FakePasteboard::copying("Hello\n\tworld  !");
        let keys = FakeKeys::new(board.clone());
        let captured = bridge(board.clone(), keys.clone()).capture().await;

        assert_eq!(captured.as_deref(), Some("Hello world !"));
        assert_eq!(board.clear_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_sequence_order() {
        let board = FakePasteboard::copying("x");
        let keys = FakeKeys::new(board.clone());
        bridge(board, keys.clone()).capture().await;

        let strokes = keys.strokes.lock().unwrap().clone();
        assert_eq!(strokes, CopyShortcut::COMMAND_C.sequence().to_vec());
        assert!(strokes[0].key_down && strokes[0].key_code == 0x37);
        assert!(!strokes[3].key_down && strokes[3].flags == Modifiers::NONE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_clipboard_is_not_returned() {
        // Nothing copies: the previous content must have been cleared.
        let board = Arc::new(FakePasteboard::default());
        *board.content.lock().unwrap() = Some("old".to_string());
        let keys = FakeKeys::new(board.clone());

        assert_eq!(bridge(board, keys).capture().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_copy_is_none() {
        let board = FakePasteboard::copying(" \n ");
        let keys = FakeKeys::new(board.clone());
        assert_eq!(bridge(board, keys).capture().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_failure_is_none() {
        let board = FakePasteboard::copying("text");
        let keys = Arc::new(FakeKeys {
            board: board.clone(),
            strokes: Mutex::new(Vec::new()),
            fail: true,
        });
        assert_eq!(bridge(board, keys).capture().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_waits_for_settle() {
        let board = FakePasteboard::copying("text");
        let keys = FakeKeys::new(board.clone());
        let started = tokio::time::Instant::now();
        bridge(board, keys).capture().await;
        // three keystroke gaps plus the settle delay
        assert!(started.elapsed() >= Duration::from_millis(130));
    }

    #[test]
    fn test_write_replaces_content() {
        let board = Arc::new(FakePasteboard::default());
        let keys = FakeKeys::new(board.clone());
        bridge(board.clone(), keys).write("translated").unwrap();
        assert_eq!(board.read_text().unwrap().as_deref(), Some("translated"));
        assert_eq!(board.writes.lock().unwrap().len(), 1);
    }
}
