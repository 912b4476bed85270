//! Popup activation state machine
//!
//! A single task owns all popup state and consumes [`ControllerEvent`]s in
//! order. Long-running work (text capture, translation, animations) runs in
//! spawned tasks that post their completion back as another event, tagged
//! with the attempt number current when they started. Results from an older
//! attempt are dropped.

pub mod geometry;
pub mod guard;
pub mod hotkey;
pub mod poller;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::capture::{self, Acquisition};
use crate::core::clipboard::ClipboardBridge;
use crate::core::features::translator::{Translation, Translator};
use crate::core::selection::SelectionSource;
use crate::shared::error::AppResult;
use crate::shared::events::{ControllerEvent, EventSender, RevealOutcome};
use crate::shared::settings::{ActivationSettings, AppSettings};
use crate::shared::types::{
    ActivationMethod, AnimationDirection, HotkeyBinding, LanguagePair, Point, PopupContent,
    PopupVisibility, Rect, TranslationView, TRANSLATION_FAILED_PLACEHOLDER,
};

use geometry::HotCorner;
use guard::CompletionGuard;
use hotkey::HotkeyMonitor;
use poller::PointerTracker;

/// System sound played when text was captured.
pub const CAPTURE_SOUND: &str = "Pop";

/// The on-screen popup.
#[async_trait]
pub trait PopupSurface: Send + Sync {
    /// Grow from `origin` to `frame` showing `content`; resolves when the
    /// reveal animation ends.
    async fn reveal(&self, content: &PopupContent, origin: Rect, frame: Rect);

    /// Resolves when the conceal animation ends.
    async fn conceal(&self);

    /// Replace the displayed content without animating.
    fn refresh(&self, content: &PopupContent);
}

pub trait SoundPlayer: Send + Sync {
    fn play(&self, name: &str);
}

/// Collaborators used by the reveal and hide sequences.
#[derive(Clone)]
pub struct Services {
    pub selection: Arc<dyn SelectionSource>,
    pub clipboard: Arc<ClipboardBridge>,
    pub translator: Arc<dyn Translator>,
    pub surface: Arc<dyn PopupSurface>,
    pub sound: Arc<dyn SoundPlayer>,
    pub pointer: Arc<dyn PointerTracker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Hidden,
    Showing,
    Visible,
    Hiding,
}

struct AutoHideTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Cloneable sender for requests coming from outside the controller.
#[derive(Clone)]
pub struct ControllerHandle {
    events: EventSender,
}

impl ControllerHandle {
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    pub fn set_languages(&self, languages: LanguagePair) {
        let _ = self.events.send(ControllerEvent::SetLanguages(languages));
    }

    pub fn set_hotkey_binding(&self, binding: HotkeyBinding) {
        let _ = self.events.send(ControllerEvent::SetHotkeyBinding(binding));
    }

    /// Push the user-editable parts of reloaded settings to the controller.
    pub fn apply_settings(&self, settings: &AppSettings) {
        self.set_hotkey_binding(settings.hotkey);
        self.set_languages(settings.languages());
    }

    pub fn copy_translation(&self) {
        let _ = self.events.send(ControllerEvent::CopyTranslation);
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(ControllerEvent::Shutdown);
    }
}

pub struct ActivationController {
    services: Services,
    settings: ActivationSettings,
    events: EventSender,
    hotkey: HotkeyMonitor,
    /// Binding the monitor currently holds, if registration succeeded.
    binding: Option<HotkeyBinding>,

    state: ControllerState,
    method: ActivationMethod,
    /// Whether the previous cursor sample was inside the hot corner.
    in_corner: bool,
    /// Set while a reveal or conceal sequence is in flight.
    busy: bool,
    /// Bumped on every show/hide; tags spawned work.
    attempt: u64,
    auto_hide: Option<AutoHideTimer>,
    next_generation: u64,

    /// Method owning the popup before a hotkey re-ran the reveal over a
    /// visible gesture popup.
    revealing_over: Option<ActivationMethod>,
    popup_frame: Option<Rect>,
    content: Option<PopupContent>,
    languages: LanguagePair,
    sound_enabled: bool,
    last_screen: Option<Rect>,
}

impl ActivationController {
    pub fn new(
        services: Services,
        settings: &AppSettings,
        hotkey: HotkeyMonitor,
    ) -> (Self, UnboundedReceiver<ControllerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            services,
            settings: settings.activation.clone(),
            events,
            hotkey,
            binding: None,
            state: ControllerState::Hidden,
            method: ActivationMethod::None,
            in_corner: false,
            busy: false,
            attempt: 0,
            auto_hide: None,
            next_generation: 0,
            revealing_over: None,
            popup_frame: None,
            content: None,
            languages: settings.languages(),
            sound_enabled: settings.preferences.sound_enabled,
            last_screen: None,
        };
        controller.apply_hotkey_binding(settings.hotkey);
        (controller, rx)
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            events: self.events.clone(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn method(&self) -> ActivationMethod {
        self.method
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn content(&self) -> Option<&PopupContent> {
        self.content.as_ref()
    }

    pub fn visibility(&self) -> PopupVisibility {
        match self.state {
            ControllerState::Hidden => PopupVisibility::Hidden,
            ControllerState::Showing => PopupVisibility::Animating(AnimationDirection::Reveal),
            ControllerState::Visible => PopupVisibility::Visible,
            ControllerState::Hiding => PopupVisibility::Animating(AnimationDirection::Conceal),
        }
    }

    /// Process events until `Shutdown`.
    pub async fn run(mut self, mut rx: UnboundedReceiver<ControllerEvent>) {
        info!("activation controller started");
        while let Some(event) = rx.recv().await {
            if matches!(event, ControllerEvent::Shutdown) {
                break;
            }
            self.handle_event(event);
        }
        self.cancel_auto_hide();
        self.hotkey.unbind();
        info!("activation controller stopped");
    }

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::CursorSample { cursor, screen } => self.on_cursor(cursor, screen),
            ControllerEvent::HotkeyPressed => self.on_hotkey(),
            ControllerEvent::RevealFinished { attempt, outcome } => self.on_reveal_finished(attempt, outcome),
            ControllerEvent::ConcealFinished { attempt } => self.on_conceal_finished(attempt),
            ControllerEvent::AutoHideElapsed { generation } => self.on_auto_hide(generation),
            ControllerEvent::TranslationArrived { attempt, languages, result } => {
                self.on_translation(attempt, languages, result)
            }
            ControllerEvent::SetHotkeyBinding(binding) => self.apply_hotkey_binding(binding),
            ControllerEvent::SetLanguages(languages) => self.on_languages(languages),
            ControllerEvent::CopyTranslation => self.copy_translation(),
            ControllerEvent::Shutdown => {}
        }
    }

    // ------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------

    fn on_cursor(&mut self, cursor: Point, screen: Rect) {
        self.last_screen = Some(screen);
        let corner = HotCorner::for_screen(screen, &self.settings.hot_corner);
        let in_corner = corner.contains(cursor);
        // Only entering the corner activates; resting in it does not.
        let entered = in_corner && !self.in_corner;
        self.in_corner = in_corner;

        match self.state {
            ControllerState::Hidden if entered => {
                self.show(ActivationMethod::Gesture, screen);
            }
            ControllerState::Visible if self.method == ActivationMethod::Gesture => {
                let over_popup = self.popup_frame.is_some_and(|frame| frame.contains(cursor));
                if !in_corner && !over_popup {
                    debug!(x = cursor.x, y = cursor.y, "cursor left hot corner and popup");
                    self.hide();
                }
            }
            _ => {}
        }
    }

    fn on_hotkey(&mut self) {
        match (self.state, self.method) {
            (ControllerState::Visible, ActivationMethod::Hotkey) => self.hide(),
            (ControllerState::Hidden, _) | (ControllerState::Visible, _) => {
                let Some(screen) = self.services.pointer.main_screen().or(self.last_screen) else {
                    warn!("hotkey pressed but no screen geometry available");
                    return;
                };
                self.show(ActivationMethod::Hotkey, screen);
            }
            _ => debug!(state = ?self.state, "hotkey ignored while animating"),
        }
    }

    fn on_auto_hide(&mut self, generation: u64) {
        let current = self.auto_hide.as_ref().map(|timer| timer.generation);
        if current != Some(generation) {
            debug!(generation, "stale auto-hide timer ignored");
            return;
        }
        self.auto_hide = None;

        if self.state == ControllerState::Visible && self.method == ActivationMethod::Hotkey {
            debug!("auto-hide elapsed");
            self.hide();
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn show(&mut self, method: ActivationMethod, screen: Rect) {
        if self.busy {
            debug!(?method, "show ignored, activation in progress");
            return;
        }

        self.cancel_auto_hide();
        self.busy = true;
        self.attempt += 1;
        let already_visible = self.state == ControllerState::Visible;
        self.revealing_over = already_visible.then_some(self.method);
        self.state = ControllerState::Showing;
        self.method = method;
        debug!(attempt = self.attempt, ?method, "Hidden/Visible -> Showing");

        let guard = CompletionGuard::reveal(self.events.clone(), self.attempt);
        let attempt = self.attempt;
        let services = self.services.clone();
        let settings = self.settings.clone();
        let languages = self.languages.clone();
        let sound_enabled = self.sound_enabled;

        tokio::spawn(async move {
            let outcome = reveal_sequence(
                &services,
                &settings,
                languages,
                screen,
                sound_enabled,
                already_visible,
            )
            .await;
            guard.finish(ControllerEvent::RevealFinished { attempt, outcome });
        });
    }

    fn hide(&mut self) {
        if self.busy {
            debug!("hide ignored, activation in progress");
            return;
        }

        self.cancel_auto_hide();
        self.busy = true;
        self.attempt += 1;
        self.state = ControllerState::Hiding;
        debug!(attempt = self.attempt, "Visible -> Hiding");

        let guard = CompletionGuard::conceal(self.events.clone(), self.attempt);
        let attempt = self.attempt;
        let surface = self.services.surface.clone();

        tokio::spawn(async move {
            surface.conceal().await;
            guard.finish(ControllerEvent::ConcealFinished { attempt });
        });
    }

    fn on_reveal_finished(&mut self, attempt: u64, outcome: RevealOutcome) {
        if attempt != self.attempt || self.state != ControllerState::Showing {
            debug!(attempt, current = self.attempt, "stale reveal completion ignored");
            return;
        }
        self.busy = false;
        let revealing_over = self.revealing_over.take();

        match outcome {
            RevealOutcome::Presented { content, frame } => {
                let stale_pair = content.languages != self.languages;
                self.state = ControllerState::Visible;
                self.popup_frame = Some(frame);
                self.content = Some(content);
                debug!(attempt, method = ?self.method, "Showing -> Visible");
                if self.method == ActivationMethod::Hotkey {
                    self.schedule_auto_hide();
                }
                if stale_pair {
                    // The pair changed while the reveal was in flight.
                    self.retranslate();
                }
            }
            RevealOutcome::NoText => {
                if revealing_over.is_some() {
                    // Nothing selected any more: take the visible popup down.
                    self.state = ControllerState::Visible;
                    self.hide();
                } else {
                    self.reset_hidden();
                    debug!(attempt, "nothing to translate, Showing -> Hidden");
                }
            }
            RevealOutcome::Abandoned => match revealing_over {
                Some(previous) => {
                    self.state = ControllerState::Visible;
                    self.method = previous;
                    debug!(attempt, "re-reveal abandoned, popup stays visible");
                }
                None => {
                    self.reset_hidden();
                    debug!(attempt, "activation abandoned, Showing -> Hidden");
                }
            },
        }
    }

    fn on_conceal_finished(&mut self, attempt: u64) {
        if attempt != self.attempt || self.state != ControllerState::Hiding {
            debug!(attempt, current = self.attempt, "stale conceal completion ignored");
            return;
        }
        self.busy = false;
        self.reset_hidden();
        debug!(attempt, "Hiding -> Hidden");
    }

    fn reset_hidden(&mut self) {
        self.state = ControllerState::Hidden;
        self.method = ActivationMethod::None;
        self.popup_frame = None;
        self.content = None;
    }

    fn schedule_auto_hide(&mut self) {
        self.cancel_auto_hide();
        self.next_generation += 1;
        let generation = self.next_generation;
        let delay = self.settings.auto_hide();
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ControllerEvent::AutoHideElapsed { generation });
        });
        self.auto_hide = Some(AutoHideTimer { generation, handle });
    }

    fn cancel_auto_hide(&mut self) {
        if let Some(timer) = self.auto_hide.take() {
            timer.handle.abort();
            debug!(generation = timer.generation, "auto-hide cancelled");
        }
    }

    // ------------------------------------------------------------------
    // User requests
    // ------------------------------------------------------------------

    fn apply_hotkey_binding(&mut self, binding: HotkeyBinding) {
        if self.binding == Some(binding) {
            return;
        }
        match self.hotkey.rebind(binding, self.events.clone()) {
            Ok(()) => self.binding = Some(binding),
            Err(e) => {
                self.binding = None;
                warn!(error = %e, "failed to register hotkey");
            }
        }
    }

    fn on_languages(&mut self, languages: LanguagePair) {
        if languages == self.languages {
            return;
        }
        info!(pair = %languages.label(), "language pair changed");
        self.languages = languages;

        // A reveal in flight picks the new pair up once it is presented.
        if self.state == ControllerState::Visible {
            self.retranslate();
        }
    }

    /// Re-request the displayed text in the current pair, in the background.
    fn retranslate(&mut self) {
        let Some(content) = self.content.as_mut() else {
            return;
        };
        let text = content.source_text.clone();
        let languages = self.languages.clone();

        content.languages = languages.clone();
        content.translation = TranslationView::Pending;
        self.services.surface.refresh(content);

        let attempt = self.attempt;
        let translator = self.services.translator.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = translator.translate(&text, &languages.source, &languages.target).await;
            let _ = events.send(ControllerEvent::TranslationArrived { attempt, languages, result });
        });
    }

    fn on_translation(
        &mut self,
        attempt: u64,
        languages: LanguagePair,
        result: AppResult<Translation>,
    ) {
        let current = attempt == self.attempt
            && self.state == ControllerState::Visible
            && self.method != ActivationMethod::None
            && languages == self.languages;
        if !current {
            debug!(attempt, current = self.attempt, "late translation discarded");
            return;
        }
        let Some(content) = self.content.as_mut() else {
            return;
        };

        content.translation = translation_view(result);
        self.services.surface.refresh(content);
    }

    fn copy_translation(&self) {
        let Some(text) = self.content.as_ref().and_then(|c| c.translated_text()) else {
            debug!("nothing to copy");
            return;
        };
        match self.services.clipboard.write(text) {
            Ok(()) => debug!("translation copied to clipboard"),
            Err(e) => warn!(error = %e, "failed to copy translation"),
        }
    }
}

fn translation_view(result: AppResult<Translation>) -> TranslationView {
    match result {
        Ok(translation) => TranslationView::Translated(translation.text),
        Err(e) if e.is_network_failure() => {
            TranslationView::Failed(TRANSLATION_FAILED_PLACEHOLDER.to_string())
        }
        Err(e) => {
            warn!(error = %e, "translation failed outside the network path");
            TranslationView::Failed(TRANSLATION_FAILED_PLACEHOLDER.to_string())
        }
    }
}

/// Settle, capture, chime, translate, then animate in.
async fn reveal_sequence(
    services: &Services,
    settings: &ActivationSettings,
    languages: LanguagePair,
    screen: Rect,
    sound_enabled: bool,
    already_visible: bool,
) -> RevealOutcome {
    tokio::time::sleep(settings.selection_settle()).await;

    let text = match capture::acquire(services.selection.clone(), &services.clipboard).await {
        Acquisition::Text(text) => text,
        Acquisition::NoText => return RevealOutcome::NoText,
        Acquisition::Abandoned => return RevealOutcome::Abandoned,
    };

    if sound_enabled {
        services.sound.play(CAPTURE_SOUND);
    }

    let result = services
        .translator
        .translate(&text, &languages.source, &languages.target)
        .await;

    let content = PopupContent {
        source_text: text,
        languages,
        translation: translation_view(result),
    };
    let frame = geometry::popup_frame(screen, settings.popup_width, settings.popup_height);

    if already_visible {
        services.surface.refresh(&content);
    } else {
        services
            .surface
            .reveal(&content, geometry::reveal_origin(screen), frame)
            .await;
    }

    RevealOutcome::Presented { content, frame }
}
