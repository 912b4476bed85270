use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::shared::events::{ControllerEvent, EventSender};
use crate::shared::types::{Point, Rect};

/// Global cursor and main-screen geometry, y-up.
pub trait PointerTracker: Send + Sync {
    fn cursor(&self) -> Option<Point>;
    fn main_screen(&self) -> Option<Rect>;
}

/// Sample the cursor every `interval` and forward it to the controller.
/// Stops once the controller's receiver is gone.
pub fn spawn_cursor_poller(
    pointer: Arc<dyn PointerTracker>,
    interval: Duration,
    events: EventSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let (Some(cursor), Some(screen)) = (pointer.cursor(), pointer.main_screen()) else {
                continue;
            };

            if events.send(ControllerEvent::CursorSample { cursor, screen }).is_err() {
                debug!("cursor poller stopping, controller gone");
                break;
            }
        }
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    pub(crate) struct FakePointer {
        pub cursor: Mutex<Option<Point>>,
        pub screen: Rect,
    }

    impl FakePointer {
        pub fn at(x: f64, y: f64) -> Arc<Self> {
            Arc::new(Self {
                cursor: Mutex::new(Some(Point::new(x, y))),
                screen: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            })
        }
    }

    impl PointerTracker for FakePointer {
        fn cursor(&self) -> Option<Point> {
            *self.cursor.lock().unwrap()
        }

        fn main_screen(&self) -> Option<Rect> {
            Some(self.screen)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_on_each_tick() {
        let pointer = FakePointer::at(960.0, 1065.0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = spawn_cursor_poller(pointer, Duration::from_millis(100), tx);

        tokio::time::sleep(Duration::from_millis(350)).await;
        let mut samples = 0;
        while let Ok(ev) = rx.try_recv() {
            assert!(matches!(ev, ControllerEvent::CursorSample { .. }));
            samples += 1;
        }
        // Immediate first tick plus 100, 200 and 300 ms.
        assert_eq!(samples, 4);
        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_ticks_without_cursor() {
        let pointer = FakePointer::at(0.0, 0.0);
        *pointer.cursor.lock().unwrap() = None;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = spawn_cursor_poller(pointer, Duration::from_millis(100), tx);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err());
        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let poller = spawn_cursor_poller(FakePointer::at(1.0, 1.0), Duration::from_millis(100), tx);
        assert!(poller.await.is_ok());
    }
}
