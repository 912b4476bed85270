//! Global hotkey chord matching and listener (re)registration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::shared::error::{AppError, AppResult};
use crate::shared::events::{ControllerEvent, EventSender};
use crate::shared::types::HotkeyBinding;

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
    pub option: bool,
    pub control: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        command: false,
        shift: false,
        option: false,
        control: false,
    };

    pub const COMMAND: Modifiers = Modifiers {
        command: true,
        ..Modifiers::NONE
    };

    pub const COMMAND_SHIFT: Modifiers = Modifiers {
        command: true,
        shift: true,
        ..Modifiers::NONE
    };

    /// Exact match: every modifier must agree, extra ones reject.
    pub fn matches(&self, required: &Modifiers) -> bool {
        self.command == required.command
            && self.shift == required.shift
            && self.option == required.option
            && self.control == required.control
    }
}

/// Key-down as delivered by the global tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u16,
    pub modifiers: Modifiers,
    pub is_repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key_code: u16,
    pub modifiers: Modifiers,
    pub label: &'static str,
}

impl KeyChord {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        !event.is_repeat && event.key_code == self.key_code && event.modifiers.matches(&self.modifiers)
    }
}

/// Selectable chords, indexed by `HotkeyBinding::key_index`.
/// Key codes are macOS ANSI virtual keys for the digit row.
pub const HOTKEY_CHOICES: [KeyChord; 5] = [
    KeyChord { key_code: 0x12, modifiers: Modifiers::COMMAND_SHIFT, label: "⌘⇧1" },
    KeyChord { key_code: 0x13, modifiers: Modifiers::COMMAND_SHIFT, label: "⌘⇧2" },
    KeyChord { key_code: 0x14, modifiers: Modifiers::COMMAND_SHIFT, label: "⌘⇧3" },
    KeyChord { key_code: 0x15, modifiers: Modifiers::COMMAND_SHIFT, label: "⌘⇧4" },
    KeyChord { key_code: 0x17, modifiers: Modifiers::COMMAND_SHIFT, label: "⌘⇧5" },
];

pub fn chord_for(binding: &HotkeyBinding) -> AppResult<KeyChord> {
    HOTKEY_CHOICES
        .get(binding.key_index)
        .copied()
        .ok_or_else(|| AppError::Validation(format!("Unknown hotkey index {}", binding.key_index)))
}

pub type KeyHandler = Box<dyn Fn(KeyEvent) + Send + Sync>;

/// Source of global key-down events.
pub trait KeyEventTap: Send + Sync {
    fn install(&self, handler: KeyHandler) -> AppResult<Box<dyn TapHandle>>;
}

/// A live listener registration.
pub trait TapHandle: Send {
    fn remove(self: Box<Self>);
}

/// Owns at most one registered listener.
pub struct HotkeyMonitor {
    tap: Arc<dyn KeyEventTap>,
    active: Option<Box<dyn TapHandle>>,
    chord: Option<KeyChord>,
}

impl HotkeyMonitor {
    pub fn new(tap: Arc<dyn KeyEventTap>) -> Self {
        Self {
            tap,
            active: None,
            chord: None,
        }
    }

    /// Remove the current listener, then install one for `binding` if it is
    /// enabled.
    pub fn rebind(&mut self, binding: HotkeyBinding, events: EventSender) -> AppResult<()> {
        self.unbind();

        if !binding.enabled {
            info!("hotkey disabled");
            return Ok(());
        }

        let chord = chord_for(&binding)?;
        let handler = move |event: KeyEvent| {
            if chord.matches(&event) {
                let _ = events.send(ControllerEvent::HotkeyPressed);
            }
        };

        self.active = Some(self.tap.install(Box::new(handler))?);
        self.chord = Some(chord);
        info!(chord = chord.label, "hotkey registered");
        Ok(())
    }

    pub fn unbind(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.remove();
            debug!(chord = self.chord.map(|c| c.label), "hotkey listener removed");
        }
        self.chord = None;
    }

    pub fn chord(&self) -> Option<KeyChord> {
        self.chord
    }
}

impl Drop for HotkeyMonitor {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Tap that keeps the single live handler so tests can feed key events.
    #[derive(Default)]
    pub(crate) struct FakeTap {
        pub handler: Arc<Mutex<Option<KeyHandler>>>,
        pub installs: Mutex<usize>,
        pub removals: Arc<Mutex<usize>>,
    }

    struct FakeHandle {
        handler: Arc<Mutex<Option<KeyHandler>>>,
        removals: Arc<Mutex<usize>>,
    }

    impl TapHandle for FakeHandle {
        fn remove(self: Box<Self>) {
            *self.handler.lock().unwrap() = None;
            *self.removals.lock().unwrap() += 1;
        }
    }

    impl KeyEventTap for FakeTap {
        fn install(&self, handler: KeyHandler) -> AppResult<Box<dyn TapHandle>> {
            let mut slot = self.handler.lock().unwrap();
            assert!(slot.is_none(), "a listener is already installed");
            *slot = Some(handler);
            *self.installs.lock().unwrap() += 1;
            Ok(Box::new(FakeHandle {
                handler: self.handler.clone(),
                removals: self.removals.clone(),
            }))
        }
    }

    impl FakeTap {
        pub fn press(&self, key_code: u16, modifiers: Modifiers) {
            if let Some(handler) = self.handler.lock().unwrap().as_ref() {
                handler(KeyEvent { key_code, modifiers, is_repeat: false });
            }
        }

        pub fn install_count(&self) -> usize {
            *self.installs.lock().unwrap()
        }

        pub fn removal_count(&self) -> usize {
            *self.removals.lock().unwrap()
        }
    }

    #[test]
    fn test_exact_modifier_match() {
        let chord = HOTKEY_CHOICES[0];
        let press = |modifiers| KeyEvent { key_code: 0x12, modifiers, is_repeat: false };

        assert!(chord.matches(&press(Modifiers::COMMAND_SHIFT)));
        assert!(!chord.matches(&press(Modifiers::COMMAND)));
        assert!(!chord.matches(&press(Modifiers { option: true, ..Modifiers::COMMAND_SHIFT })));
        assert!(!chord.matches(&KeyEvent { key_code: 0x13, modifiers: Modifiers::COMMAND_SHIFT, is_repeat: false }));
        assert!(!chord.matches(&KeyEvent { key_code: 0x12, modifiers: Modifiers::COMMAND_SHIFT, is_repeat: true }));
    }

    #[test]
    fn test_chord_lookup() {
        let binding = HotkeyBinding { enabled: true, key_index: 4 };
        assert_eq!(chord_for(&binding).unwrap().label, "⌘⇧5");
        assert!(chord_for(&HotkeyBinding { enabled: true, key_index: 9 }).is_err());
    }

    #[test]
    fn test_rebind_replaces_listener() {
        let tap = Arc::new(FakeTap::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = HotkeyMonitor::new(tap.clone());

        monitor.rebind(HotkeyBinding { enabled: true, key_index: 0 }, tx.clone()).unwrap();
        monitor.rebind(HotkeyBinding { enabled: true, key_index: 1 }, tx.clone()).unwrap();
        assert_eq!(tap.install_count(), 2);
        assert_eq!(tap.removal_count(), 1);

        // Old chord is gone, new chord fires.
        tap.press(0x12, Modifiers::COMMAND_SHIFT);
        assert!(rx.try_recv().is_err());
        tap.press(0x13, Modifiers::COMMAND_SHIFT);
        assert!(matches!(rx.try_recv(), Ok(ControllerEvent::HotkeyPressed)));

        // Partial modifier set is ignored.
        tap.press(0x13, Modifiers::COMMAND);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disable_removes_listener() {
        let tap = Arc::new(FakeTap::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut monitor = HotkeyMonitor::new(tap.clone());

        monitor.rebind(HotkeyBinding::default(), tx.clone()).unwrap();
        monitor.rebind(HotkeyBinding { enabled: false, key_index: 0 }, tx).unwrap();

        assert_eq!(tap.removal_count(), 1);
        assert!(monitor.chord().is_none());
        tap.press(0x12, Modifiers::COMMAND_SHIFT);
        assert!(rx.try_recv().is_err());
    }
}
