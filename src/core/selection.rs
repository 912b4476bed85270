//! Selected-text probe over the platform accessibility API.

use tracing::debug;

use crate::core::text;
use crate::shared::types::{AxError, SelectionResult};

/// Accessibility introspection of other running applications.
pub trait AccessibilityApi: Send + Sync {
    /// Platform handle of a UI element.
    type Element;

    /// Process id of the frontmost application, if any.
    fn frontmost_pid(&self) -> Option<u32>;

    fn focused_element(&self, pid: u32) -> Result<Self::Element, AxError>;

    fn selected_text(&self, element: &Self::Element) -> Result<String, AxError>;
}

/// Object-safe view of a probe, as consumed by the controller.
pub trait SelectionSource: Send + Sync {
    fn probe(&self) -> SelectionResult;
}

pub struct SelectionProbe<A> {
    api: A,
    own_pid: u32,
}

impl<A: AccessibilityApi> SelectionProbe<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            own_pid: std::process::id(),
        }
    }

    /// Override the pid treated as "ourselves".
    pub fn with_own_pid(api: A, own_pid: u32) -> Self {
        Self { api, own_pid }
    }

    pub fn probe(&self) -> SelectionResult {
        let Some(pid) = self.api.frontmost_pid() else {
            debug!("no frontmost application");
            return SelectionResult::NoSelection;
        };

        // Never introspect our own popup as the foreground app.
        if pid == self.own_pid {
            debug!("frontmost application is this process, skipping probe");
            return SelectionResult::NoSelection;
        }

        let element = match self.api.focused_element(pid) {
            Ok(element) => element,
            Err(code) => return classify(code),
        };

        match self.api.selected_text(&element) {
            Ok(raw) => match text::normalize_non_empty(&raw) {
                Some(text) => SelectionResult::Success(text),
                None => SelectionResult::NoSelection,
            },
            Err(code) => classify(code),
        }
    }
}

impl<A: AccessibilityApi> SelectionSource for SelectionProbe<A> {
    fn probe(&self) -> SelectionResult {
        SelectionProbe::probe(self)
    }
}

fn classify(code: AxError) -> SelectionResult {
    if code == AxError::NO_VALUE {
        SelectionResult::NoSelection
    } else {
        SelectionResult::Error(code)
    }
}
