//! macOS backends: Accessibility API, NSPasteboard, CGEvent synthesis and a
//! global key-down tap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cocoa::base::{id, nil};
use cocoa::foundation::NSString;
use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, EventField,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use objc::{class, msg_send, sel, sel_impl};
use tracing::{debug, info, warn};

use crate::core::activation::hotkey::{KeyEvent, KeyEventTap, KeyHandler, Modifiers, TapHandle};
use crate::core::clipboard::{KeyStroke, KeystrokeSink, Pasteboard};
use crate::core::selection::AccessibilityApi;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::AxError;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXUIElementCreateApplication(pid: i32) -> CFTypeRef;
    fn AXUIElementCopyAttributeValue(element: CFTypeRef, attribute: CFStringRef, value: *mut CFTypeRef) -> i32;
}

/// Check if the app has accessibility permissions
pub fn check_accessibility_permissions() -> bool {
    unsafe { AXIsProcessTrusted() }
}

// ============================================================================
// Accessibility
// ============================================================================

pub struct Accessibility;

impl Accessibility {
    /// Copy `attribute` of `element`; the returned value is owned.
    fn copy_attribute(element: &CFType, attribute: &str) -> Result<CFType, AxError> {
        let attribute = CFString::new(attribute);
        let mut value: CFTypeRef = std::ptr::null();
        let code = unsafe {
            AXUIElementCopyAttributeValue(
                element.as_CFTypeRef(),
                attribute.as_concrete_TypeRef(),
                &mut value,
            )
        };

        if code != 0 {
            return Err(AxError(code));
        }
        if value.is_null() {
            return Err(AxError::NO_VALUE);
        }
        Ok(unsafe { CFType::wrap_under_create_rule(value) })
    }
}

impl AccessibilityApi for Accessibility {
    type Element = CFType;

    fn frontmost_pid(&self) -> Option<u32> {
        unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let front_app: id = msg_send![workspace, frontmostApplication];
            if front_app == nil {
                return None;
            }
            let pid: i32 = msg_send![front_app, processIdentifier];
            u32::try_from(pid).ok()
        }
    }

    fn focused_element(&self, pid: u32) -> Result<CFType, AxError> {
        let pid = i32::try_from(pid).map_err(|_| AxError::FAILURE)?;
        let app = unsafe { AXUIElementCreateApplication(pid) };
        if app.is_null() {
            return Err(AxError::FAILURE);
        }
        let app = unsafe { CFType::wrap_under_create_rule(app) };
        Self::copy_attribute(&app, "AXFocusedUIElement")
    }

    fn selected_text(&self, element: &CFType) -> Result<String, AxError> {
        let value = Self::copy_attribute(element, "AXSelectedText")?;
        value
            .downcast::<CFString>()
            .map(|text| text.to_string())
            .ok_or(AxError::NO_VALUE)
    }
}

// ============================================================================
// Pasteboard
// ============================================================================

pub struct SystemPasteboard;

impl SystemPasteboard {
    unsafe fn general() -> AppResult<id> {
        let pb: id = msg_send![class!(NSPasteboard), generalPasteboard];
        if pb == nil {
            return Err(AppError::Clipboard("Failed to get NSPasteboard".to_string()));
        }
        Ok(pb)
    }
}

impl Pasteboard for SystemPasteboard {
    fn clear(&self) -> AppResult<()> {
        unsafe {
            let pb = Self::general()?;
            let _: i64 = msg_send![pb, clearContents];
        }
        Ok(())
    }

    fn write_text(&self, text: &str) -> AppResult<()> {
        unsafe {
            let pb = Self::general()?;
            let ns_string = NSString::alloc(nil).init_str(text);
            if ns_string == nil {
                return Err(AppError::Clipboard("Failed to create NSString".to_string()));
            }

            let array: id = msg_send![class!(NSArray), arrayWithObject: ns_string];
            let success: bool = msg_send![pb, writeObjects: array];
            let _: () = msg_send![ns_string, release];

            if !success {
                return Err(AppError::Clipboard("Failed to write to clipboard".to_string()));
            }
        }
        debug!(bytes = text.len(), "wrote text to pasteboard");
        Ok(())
    }

    fn read_text(&self) -> AppResult<Option<String>> {
        unsafe {
            let pb = Self::general()?;
            let string: id = msg_send![pb, stringForType: cocoa::appkit::NSPasteboardTypeString];
            if string == nil {
                return Ok(None);
            }
            let utf8 = NSString::UTF8String(string);
            if utf8.is_null() {
                return Ok(None);
            }
            Ok(Some(std::ffi::CStr::from_ptr(utf8).to_string_lossy().into_owned()))
        }
    }
}

// ============================================================================
// Input synthesis
// ============================================================================

fn to_cg_flags(modifiers: Modifiers) -> CGEventFlags {
    let mut flags = CGEventFlags::CGEventFlagNull;
    if modifiers.command {
        flags |= CGEventFlags::CGEventFlagCommand;
    }
    if modifiers.shift {
        flags |= CGEventFlags::CGEventFlagShift;
    }
    if modifiers.option {
        flags |= CGEventFlags::CGEventFlagAlternate;
    }
    if modifiers.control {
        flags |= CGEventFlags::CGEventFlagControl;
    }
    flags
}

fn from_cg_flags(flags: CGEventFlags) -> Modifiers {
    Modifiers {
        command: flags.contains(CGEventFlags::CGEventFlagCommand),
        shift: flags.contains(CGEventFlags::CGEventFlagShift),
        option: flags.contains(CGEventFlags::CGEventFlagAlternate),
        control: flags.contains(CGEventFlags::CGEventFlagControl),
    }
}

/// Posts keyboard events at the HID level.
pub struct KeySynth;

impl KeystrokeSink for KeySynth {
    fn post(&self, stroke: KeyStroke) -> AppResult<()> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| AppError::System("Failed to create CGEventSource".to_string()))?;

        let event = CGEvent::new_keyboard_event(source, stroke.key_code, stroke.key_down)
            .map_err(|_| AppError::System("Failed to create keyboard event".to_string()))?;
        event.set_flags(to_cg_flags(stroke.flags));
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

// ============================================================================
// Global key tap
// ============================================================================

struct RunLoopRef(CFRunLoop);

// Only used to stop the loop from another thread, which CFRunLoopStop allows.
unsafe impl Send for RunLoopRef {}

/// Listen-only session tap on a dedicated run-loop thread.
pub struct GlobalKeyTap;

/// Upper bound on how long the tap thread takes to notice a removal that
/// raced with the loop starting.
const RUN_LOOP_SLICE: Duration = Duration::from_millis(250);

struct KeyTapHandle {
    run_loop: RunLoopRef,
    stopped: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TapHandle for KeyTapHandle {
    fn remove(mut self: Box<Self>) {
        self.stopped.store(true, Ordering::SeqCst);
        self.run_loop.0.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("key tap thread panicked");
            }
        }
    }
}

impl KeyEventTap for GlobalKeyTap {
    fn install(&self, handler: KeyHandler) -> AppResult<Box<dyn TapHandle>> {
        let (ready_tx, ready_rx) = mpsc::channel::<AppResult<RunLoopRef>>();
        let stopped = Arc::new(AtomicBool::new(false));
        let stop_flag = stopped.clone();

        let thread = thread::Builder::new()
            .name("hotkey-tap".to_string())
            .spawn(move || {
                let tap = CGEventTap::new(
                    CGEventTapLocation::Session,
                    CGEventTapPlacement::HeadInsertEventTap,
                    CGEventTapOptions::ListenOnly,
                    vec![CGEventType::KeyDown],
                    move |_proxy, _event_type, event| {
                        let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                        let is_repeat = event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
                        handler(KeyEvent {
                            key_code,
                            modifiers: from_cg_flags(event.get_flags()),
                            is_repeat,
                        });
                        None
                    },
                );

                let tap = match tap {
                    Ok(tap) => tap,
                    Err(()) => {
                        let _ = ready_tx.send(Err(AppError::System(
                            "Failed to create CGEventTap; check Input Monitoring permission".to_string(),
                        )));
                        return;
                    }
                };

                let source = match tap.mach_port.create_runloop_source(0) {
                    Ok(source) => source,
                    Err(()) => {
                        let _ = ready_tx.send(Err(AppError::System(
                            "Failed to create event tap run loop source".to_string(),
                        )));
                        return;
                    }
                };

                let run_loop = CFRunLoop::get_current();
                unsafe {
                    run_loop.add_source(&source, kCFRunLoopCommonModes);
                }
                tap.enable();

                if ready_tx.send(Ok(RunLoopRef(run_loop))).is_err() {
                    return;
                }
                while !stop_flag.load(Ordering::SeqCst) {
                    unsafe {
                        CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, RUN_LOOP_SLICE, false);
                    }
                }
                debug!("key tap run loop exited");
            })
            .map_err(|e| AppError::System(format!("Failed to spawn key tap thread: {}", e)))?;

        let run_loop = ready_rx
            .recv()
            .map_err(|_| AppError::System("Key tap thread exited during setup".to_string()))??;

        info!("global key tap installed");
        Ok(Box::new(KeyTapHandle {
            run_loop,
            stopped,
            thread: Some(thread),
        }))
    }
}
