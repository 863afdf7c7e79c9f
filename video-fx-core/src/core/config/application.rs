use std::sync::Arc;

use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscription};
use log::{debug, error, trace, warn};
use tokio::sync::Mutex;

use crate::core::config::{PlaybackSettings, PlayerSettings};
use crate::core::storage::{Storage, StorageError};

const FILENAME: &str = "settings.json";

/// An event representing changes to the application config.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ApplicationConfigEvent {
    /// Invoked when the playback settings have been changed
    #[display("Playback settings changed to {}", _0)]
    PlaybackSettingsChanged(PlaybackSettings),
}

/// The configuration of the video player application.
///
/// The settings are stored as a json file within the storage directory and saved back
/// whenever they're updated.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    inner: Arc<InnerApplicationConfig>,
}

impl ApplicationConfig {
    pub fn builder() -> ApplicationConfigBuilder {
        ApplicationConfigBuilder::default()
    }

    /// Get the current settings of the application.
    pub async fn settings(&self) -> PlayerSettings {
        let settings = self.inner.settings.lock().await;
        settings.clone()
    }

    /// Get the current playback settings of the application.
    pub async fn playback(&self) -> PlaybackSettings {
        let settings = self.inner.settings.lock().await;
        settings.playback.clone()
    }

    /// Update the playback settings of the application.
    pub async fn update_playback(&self, playback: PlaybackSettings) {
        {
            let mut settings = self.inner.settings.lock().await;
            if settings.playback == playback {
                trace!("Playback settings are unchanged, nothing to do");
                return;
            }

            settings.playback = playback.clone();
            self.inner.save_async(&settings).await;
        }

        debug!("Playback settings have been updated to {}", playback);
        self.inner
            .callbacks
            .invoke(ApplicationConfigEvent::PlaybackSettingsChanged(playback));
    }

    /// Subscribe to the config events of the application.
    pub fn subscribe(&self) -> Subscription<ApplicationConfigEvent> {
        self.inner.callbacks.subscribe()
    }
}

/// A builder for `ApplicationConfig` instances.
#[derive(Debug, Default)]
pub struct ApplicationConfigBuilder {
    storage_directory: Option<String>,
}

impl ApplicationConfigBuilder {
    /// Sets the storage directory in which the settings are stored.
    ///
    /// # Panics
    ///
    /// Panics if the `storage_directory` is not set when `build()` is called.
    pub fn storage_directory(mut self, storage_directory: &str) -> Self {
        self.storage_directory = Some(storage_directory.to_string());
        self
    }

    /// Builds a new `ApplicationConfig` with the settings loaded from the storage.
    pub fn build(self) -> ApplicationConfig {
        let storage = Storage::from(
            self.storage_directory
                .expect("expected the storage directory to have been set")
                .as_str(),
        );
        let settings = InnerApplicationConfig::load_settings(&storage);

        ApplicationConfig {
            inner: Arc::new(InnerApplicationConfig {
                storage,
                settings: Mutex::new(settings),
                callbacks: MultiThreadedCallback::new(),
            }),
        }
    }
}

#[derive(Debug)]
struct InnerApplicationConfig {
    storage: Storage,
    settings: Mutex<PlayerSettings>,
    callbacks: MultiThreadedCallback<ApplicationConfigEvent>,
}

impl InnerApplicationConfig {
    fn load_settings(storage: &Storage) -> PlayerSettings {
        match storage.options().serializer(FILENAME).read() {
            Ok(e) => e,
            Err(e) => match e {
                StorageError::NotFound(file) => {
                    debug!("Creating new settings file {}", file);
                    PlayerSettings::default()
                }
                _ => {
                    warn!("Failed to load settings, using defaults, {}", e);
                    PlayerSettings::default()
                }
            },
        }
    }

    async fn save_async(&self, settings: &PlayerSettings) {
        match self
            .storage
            .options()
            .serializer(FILENAME)
            .write_async(settings)
            .await
        {
            Ok(_) => debug!("Settings have been saved"),
            Err(e) => error!("Failed to save settings, {}", e),
        }
    }
}
