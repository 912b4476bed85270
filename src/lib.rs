pub mod core;
pub mod shared;
pub mod system;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::activation::hotkey::HotkeyMonitor;
use crate::core::activation::poller::{spawn_cursor_poller, PointerTracker};
use crate::core::activation::{ActivationController, ControllerHandle, Services};
use crate::core::clipboard::ClipboardBridge;
use crate::core::features::translator::TranslationClient;
use crate::core::selection::SelectionProbe;
use crate::shared::error::AppResult;
use crate::shared::logging;
use crate::shared::settings::AppSettings;
use crate::system::automation::{self, Accessibility, GlobalKeyTap, KeySynth, SystemPasteboard};
use crate::system::cursor::SystemPointer;
use crate::system::sound::SystemSound;
use crate::system::window::HeadlessSurface;

pub fn run() {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return;
        }
    };
    runtime.block_on(async_main());
}

async fn async_main() {
    let (settings, load_error) = match AppSettings::load_or_init().await {
        Ok(settings) => (settings, None),
        Err(e) => (AppSettings::default(), Some(e)),
    };

    logging::init(settings.debug_logging);
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load settings, using defaults");
    }

    if let Err(e) = start(settings).await {
        error!(error = %e, "translation popup stopped");
    }
}

async fn start(settings: AppSettings) -> AppResult<()> {
    if !automation::check_accessibility_permissions() {
        warn!("Accessibility permissions not granted. Enable in System Settings > Privacy & Security > Accessibility.");
    }

    let clipboard = ClipboardBridge::new(Arc::new(SystemPasteboard), Arc::new(KeySynth), &settings.activation);
    let pointer: Arc<dyn PointerTracker> = Arc::new(SystemPointer);

    let services = Services {
        selection: Arc::new(SelectionProbe::new(Accessibility)),
        clipboard: Arc::new(clipboard),
        translator: Arc::new(TranslationClient::new(&settings.translation)?),
        surface: Arc::new(HeadlessSurface::new(&settings.activation)),
        sound: Arc::new(SystemSound),
        pointer: pointer.clone(),
    };

    let hotkey = HotkeyMonitor::new(Arc::new(GlobalKeyTap));
    let (controller, rx) = ActivationController::new(services, &settings, hotkey);
    let handle = controller.handle();
    let poller = spawn_cursor_poller(pointer, settings.activation.poll_interval(), handle.sender());

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            interrupt.shutdown();
        }
    });

    let reload = spawn_settings_reload(handle.clone());

    info!(
        endpoint = %settings.translation.endpoint,
        pair = %settings.languages().label(),
        "translation popup running"
    );
    controller.run(rx).await;
    poller.abort();
    reload.abort();
    Ok(())
}

/// Re-read the settings file on SIGHUP and push hotkey and language changes to
/// the running controller.
#[cfg(unix)]
fn spawn_settings_reload(handle: ControllerHandle) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(hangups) => hangups,
            Err(e) => {
                warn!(error = %e, "settings reload unavailable");
                return;
            }
        };

        while hangups.recv().await.is_some() {
            match AppSettings::load().await {
                Ok(settings) => {
                    info!(pair = %settings.languages().label(), "settings reloaded");
                    handle.apply_settings(&settings);
                }
                Err(e) => warn!(error = %e, "settings reload failed, keeping current settings"),
            }
        }
    })
}

#[cfg(not(unix))]
fn spawn_settings_reload(_handle: ControllerHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {})
}
