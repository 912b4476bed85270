use tracing::debug;

use crate::core::activation::SoundPlayer;

/// Plays named system sounds (`NSSound soundNamed:`).
pub struct SystemSound;

impl SoundPlayer for SystemSound {
    fn play(&self, name: &str) {
        if !platform::play(name) {
            debug!(sound = name, "sound not available");
        }
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use cocoa::base::{id, nil};
    use cocoa::foundation::NSString;
    use objc::{class, msg_send, sel, sel_impl};

    pub fn play(name: &str) -> bool {
        unsafe {
            let ns_name = NSString::alloc(nil).init_str(name);
            let sound: id = msg_send![class!(NSSound), soundNamed: ns_name];
            let _: () = msg_send![ns_name, release];
            if sound == nil {
                return false;
            }
            let started: bool = msg_send![sound, play];
            started
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub fn play(_name: &str) -> bool {
        false
    }
}
