use std::fmt::Debug;
use std::sync::Mutex;

use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscription};
use log::{debug, info, trace};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// An event representing changes to the screen presentation.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ScreenEvent {
    /// Invoked when the fullscreen presentation of the screen is changed
    #[display("Screen fullscreen state changed to {}", _0)]
    FullscreenChanged(bool),
}

/// A platform entry point for changing the fullscreen presentation.
///
/// Platforms expose the fullscreen capability under different entry points.
/// Each entry point is represented as a handle and probed for availability, the first
/// available handle within the configured priority order is used by the service.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait FullscreenHandle: Debug + Send + Sync {
    /// The name of the platform entry point.
    fn name(&self) -> &str;

    /// Check if this entry point is available on the current platform.
    fn is_available(&self) -> bool;

    /// Request the fullscreen presentation through this entry point.
    fn enter(&self);

    /// Exit the fullscreen presentation through this entry point.
    fn exit(&self);
}

/// A trait for managing the application screen.
///
/// The `ScreenService` trait defines the methods for handling information and actions
/// related to the application screen, such as toggling fullscreen mode and checking if
/// the screen is currently in fullscreen.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait ScreenService: Debug + Send + Sync {
    /// Check if the application is in fullscreen mode.
    fn is_fullscreen(&self) -> bool;

    /// Toggle fullscreen mode.
    fn toggle_fullscreen(&self);

    /// Set the fullscreen state of the application.
    ///
    /// # Arguments
    ///
    /// * `active_fullscreen` - `true` to activate fullscreen mode, `false` to deactivate it.
    fn fullscreen(&self, active_fullscreen: bool);

    /// Notify the service about an externally triggered fullscreen change.
    ///
    /// This is the entry point of the global fullscreen-change observer, allowing
    /// changes which didn't go through this service, such as the user pressing Escape,
    /// to be reflected within the tracked state.
    fn notify_fullscreen_changed(&self, active_fullscreen: bool);

    /// Subscribe to the screen events of the service.
    fn subscribe(&self) -> Subscription<ScreenEvent>;
}

/// The default screen service which changes the fullscreen presentation through the
/// first available platform entry point.
#[derive(Debug)]
pub struct DefaultScreenService {
    handle: Option<Box<dyn FullscreenHandle>>,
    fullscreen: Mutex<bool>,
    callbacks: MultiThreadedCallback<ScreenEvent>,
}

impl DefaultScreenService {
    /// Create a new screen service for the given entry points.
    ///
    /// The handles are probed once, in the given priority order.
    pub fn new(handles: Vec<Box<dyn FullscreenHandle>>) -> Self {
        let handle = handles.into_iter().find(|e| {
            trace!("Probing fullscreen entry point {}", e.name());
            e.is_available()
        });

        match handle.as_ref() {
            Some(e) => info!("Using fullscreen entry point {}", e.name()),
            None => debug!("No fullscreen entry point is available"),
        }

        Self {
            handle,
            fullscreen: Mutex::new(false),
            callbacks: MultiThreadedCallback::new(),
        }
    }

    fn update_fullscreen(&self, active_fullscreen: bool) -> bool {
        let mut fullscreen = self.fullscreen.lock().expect("mutex has been poisoned");
        if *fullscreen == active_fullscreen {
            return false;
        }

        *fullscreen = active_fullscreen;
        true
    }
}

impl ScreenService for DefaultScreenService {
    fn is_fullscreen(&self) -> bool {
        *self.fullscreen.lock().expect("mutex has been poisoned")
    }

    fn toggle_fullscreen(&self) {
        let active_fullscreen = !self.is_fullscreen();
        self.fullscreen(active_fullscreen)
    }

    fn fullscreen(&self, active_fullscreen: bool) {
        trace!("Updating screen fullscreen to {}", active_fullscreen);
        match self.handle.as_ref() {
            Some(handle) => {
                if active_fullscreen {
                    handle.enter();
                } else {
                    handle.exit();
                }
            }
            None => debug!("No fullscreen entry point available, presentation is unchanged"),
        }

        // tracked optimistically, the next fullscreen-change notification corrects any mismatch
        if self.update_fullscreen(active_fullscreen) {
            self.callbacks
                .invoke(ScreenEvent::FullscreenChanged(active_fullscreen));
        }
    }

    fn notify_fullscreen_changed(&self, active_fullscreen: bool) {
        trace!(
            "Received fullscreen change notification, fullscreen is {}",
            active_fullscreen
        );
        if self.update_fullscreen(active_fullscreen) {
            self.callbacks
                .invoke(ScreenEvent::FullscreenChanged(active_fullscreen));
        }
    }

    fn subscribe(&self) -> Subscription<ScreenEvent> {
        self.callbacks.subscribe()
    }
}
