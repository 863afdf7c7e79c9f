use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscriber, Subscription};
use fx_handle::Handle;
use log::{debug, error, trace};
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use video_fx_core::core::config::ApplicationConfig;
use video_fx_core::core::players::{
    PlayRequest, PlaybackRate, Player, PlayerEvent, PlayerState, VolumeBand,
};
use video_fx_core::core::screen::{ScreenEvent, ScreenService};

use crate::embedded::{MediaElement, MediaElementEvent};

pub const EMBEDDED_PLAYER_ID: &str = "embedded";
const EMBEDDED_PLAYER_NAME: &str = "Embedded";
const EMBEDDED_PLAYER_DESCRIPTION: &str =
    "Embedded player which drives the media element of the platform";

/// The playback state of the embedded player.
///
/// The state mirrors the underlying media element and is rebuilt for each new play
/// request that is bound to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Indicates if the playback is currently playing.
    pub is_playing: bool,
    /// The last known playback time in milliseconds.
    pub time: u64,
    /// The duration of the media in milliseconds, once the metadata has been loaded.
    pub duration: Option<u64>,
    /// The active playback rate.
    pub playback_rate: PlaybackRate,
    /// The active volume level within `[0, 1]`.
    pub volume: f32,
    /// Indicates if the playback is presented in fullscreen.
    pub fullscreen: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            time: 0,
            duration: None,
            playback_rate: PlaybackRate::default(),
            volume: 1.0,
            fullscreen: false,
        }
    }
}

/// The embedded video player.
///
/// It binds play requests to the media element of the platform, mirrors the element
/// events into the player state and persists no state of its own beyond the active
/// playback session.
#[derive(Debug, Display)]
#[display("Embedded video player")]
pub struct EmbeddedPlayer {
    inner: Arc<InnerEmbeddedPlayer>,
}

impl EmbeddedPlayer {
    pub fn builder() -> EmbeddedPlayerBuilder {
        EmbeddedPlayerBuilder::default()
    }

    /// The current playback state of the player.
    pub async fn playback_state(&self) -> PlaybackState {
        let playback_state = self.inner.playback_state.lock().await;
        playback_state.clone()
    }

    /// The volume affordance band of the current volume level.
    pub async fn volume_band(&self) -> VolumeBand {
        VolumeBand::from(self.volume().await)
    }

    /// Toggle the fullscreen presentation of the playback.
    pub fn toggle_fullscreen(&self) {
        self.inner.screen_service.toggle_fullscreen()
    }
}

impl Callback<PlayerEvent> for EmbeddedPlayer {
    fn subscribe(&self) -> Subscription<PlayerEvent> {
        self.inner.callbacks.subscribe()
    }

    fn subscribe_with(&self, subscriber: Subscriber<PlayerEvent>) {
        self.inner.callbacks.subscribe_with(subscriber)
    }
}

#[async_trait]
impl Player for EmbeddedPlayer {
    fn id(&self) -> &str {
        EMBEDDED_PLAYER_ID
    }

    fn name(&self) -> &str {
        EMBEDDED_PLAYER_NAME
    }

    fn description(&self) -> &str {
        EMBEDDED_PLAYER_DESCRIPTION
    }

    async fn state(&self) -> PlayerState {
        let state = self.inner.state.lock().await;
        state.clone()
    }

    async fn request(&self) -> Option<PlayRequest> {
        let request = self.inner.request.lock().await;
        request.clone()
    }

    async fn play(&self, request: PlayRequest) {
        self.inner.clone().play(request).await
    }

    async fn pause(&self) {
        self.inner.pause().await
    }

    async fn resume(&self) {
        let session = self.inner.session().await;
        self.inner.request_playback(session).await
    }

    async fn toggle_playback(&self) {
        self.inner.toggle_playback().await
    }

    async fn seek(&self, time: u64) {
        self.inner.seek(time).await
    }

    async fn stop(&self) {
        self.inner.stop().await
    }

    async fn volume(&self) -> f32 {
        let playback_state = self.inner.playback_state.lock().await;
        playback_state.volume
    }

    async fn set_volume(&self, volume: f32) {
        self.inner.set_volume(volume).await
    }

    async fn playback_rate(&self) -> PlaybackRate {
        let playback_state = self.inner.playback_state.lock().await;
        playback_state.playback_rate
    }

    async fn set_playback_rate(&self, rate: PlaybackRate) {
        self.inner.set_playback_rate(rate).await
    }
}

impl Drop for EmbeddedPlayer {
    fn drop(&mut self) {
        self.inner.cancellation_token.cancel()
    }
}

/// Builder for creating new [EmbeddedPlayer] instances.
#[derive(Debug, Default)]
pub struct EmbeddedPlayerBuilder {
    element: Option<Box<dyn MediaElement>>,
    screen_service: Option<Arc<Box<dyn ScreenService>>>,
    config: Option<ApplicationConfig>,
}

impl EmbeddedPlayerBuilder {
    /// Sets the media element which is driven by the player.
    pub fn element(mut self, element: Box<dyn MediaElement>) -> Self {
        self.element = Some(element);
        self
    }

    /// Sets the screen service for the fullscreen presentation of the player.
    pub fn screen_service(mut self, screen_service: Arc<Box<dyn ScreenService>>) -> Self {
        self.screen_service = Some(screen_service);
        self
    }

    /// Sets the application config of which the playback settings are applied at the
    /// start of each playback.
    pub fn config(mut self, config: ApplicationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `EmbeddedPlayer` instance.
    ///
    /// # Panics
    ///
    /// Panics when the `element` or `screen_service` has not been set.
    pub fn build(self) -> EmbeddedPlayer {
        let element = self.element.expect("expected the element to have been set");
        let screen_service = self
            .screen_service
            .expect("expected the screen service to have been set");

        let element_events = element.subscribe();
        let screen_events = screen_service.subscribe();
        let instance = EmbeddedPlayer {
            inner: Arc::new(InnerEmbeddedPlayer {
                element,
                screen_service,
                config: self.config,
                request: Default::default(),
                session: Default::default(),
                state: Default::default(),
                playback_state: Default::default(),
                callbacks: MultiThreadedCallback::new(),
                cancellation_token: Default::default(),
            }),
        };

        let inner = instance.inner.clone();
        tokio::spawn(async move {
            inner.start(element_events, screen_events).await;
        });

        instance
    }
}

#[derive(Debug)]
struct InnerEmbeddedPlayer {
    element: Box<dyn MediaElement>,
    screen_service: Arc<Box<dyn ScreenService>>,
    config: Option<ApplicationConfig>,
    request: Mutex<Option<PlayRequest>>,
    session: Mutex<Handle>,
    state: Mutex<PlayerState>,
    playback_state: Mutex<PlaybackState>,
    callbacks: MultiThreadedCallback<PlayerEvent>,
    cancellation_token: CancellationToken,
}

impl InnerEmbeddedPlayer {
    /// Start the main loop of the player which mirrors the element and screen events.
    async fn start(
        &self,
        mut element_events: Subscription<MediaElementEvent>,
        mut screen_events: Subscription<ScreenEvent>,
    ) {
        loop {
            select! {
                _ = self.cancellation_token.cancelled() => break,
                Some(event) = element_events.recv() => self.handle_element_event((*event).clone()).await,
                Some(event) = screen_events.recv() => self.handle_screen_event((*event).clone()).await,
            }
        }

        debug!("Embedded player main loop ended");
    }

    async fn handle_element_event(&self, event: MediaElementEvent) {
        trace!("Processing media element event {:?}", event);
        match event {
            MediaElementEvent::Play => {
                self.update_playing(true).await;
                self.update_state(PlayerState::Playing).await;
            }
            MediaElementEvent::Pause => {
                self.update_playing(false).await;
                self.update_state(PlayerState::Paused).await;
            }
            MediaElementEvent::TimeUpdated(time) => {
                {
                    let mut playback_state = self.playback_state.lock().await;
                    playback_state.time = time;
                }
                self.callbacks.invoke(PlayerEvent::TimeChanged(time));
            }
            MediaElementEvent::MetadataLoaded(duration) => {
                {
                    let mut playback_state = self.playback_state.lock().await;
                    playback_state.duration = Some(duration);
                }
                self.callbacks.invoke(PlayerEvent::DurationChanged(duration));
            }
            MediaElementEvent::Ended => {
                self.update_playing(false).await;
                self.update_state(PlayerState::Completed).await;
            }
        }
    }

    async fn handle_screen_event(&self, event: ScreenEvent) {
        let ScreenEvent::FullscreenChanged(fullscreen) = event;
        {
            let mut playback_state = self.playback_state.lock().await;
            playback_state.fullscreen = fullscreen;
        }
        self.callbacks
            .invoke(PlayerEvent::FullscreenChanged(fullscreen));
    }

    async fn play(self: Arc<Self>, request: PlayRequest) {
        debug!("Starting embedded playback of {}", request);
        let session = self.new_session().await;
        let playback_settings = match self.config.as_ref() {
            Some(e) => e.playback().await,
            None => Default::default(),
        };

        {
            let mut playback_state = self.playback_state.lock().await;
            *playback_state = PlaybackState {
                is_playing: false,
                time: request.auto_resume_timestamp().unwrap_or(0),
                duration: None,
                playback_rate: playback_settings.playback_rate,
                volume: self.element.volume().await,
                fullscreen: self.screen_service.is_fullscreen(),
            };
        }

        self.update_state(PlayerState::Loading).await;
        self.element.load(request.url()).await;
        // the element rate is not carried over from the previous playback session
        self.element
            .set_playback_rate(playback_settings.playback_rate.multiplier())
            .await;
        if let Some(time) = request.auto_resume_timestamp() {
            trace!("Resuming playback of {} at {}", request, time);
            self.element.seek(time).await;
        }
        if playback_settings.fullscreen {
            self.screen_service.fullscreen(true);
        }
        {
            let mut mutex = self.request.lock().await;
            let _ = mutex.insert(request);
        }

        let inner = self.clone();
        tokio::spawn(async move {
            inner.request_playback(session).await;
        });
    }

    /// Request the element to start its playback.
    ///
    /// A completion which arrives after the session has been superseded by a new play
    /// request is ignored.
    async fn request_playback(&self, session: Handle) {
        match self.element.play().await {
            Ok(_) => {
                if self.is_current_session(&session).await {
                    self.update_playing(true).await;
                    self.update_state(PlayerState::Playing).await;
                } else {
                    trace!("Ignoring stale play completion of session {}", session);
                }
            }
            Err(e) => error!("Failed to start the playback, {}", e),
        }
    }

    async fn toggle_playback(&self) {
        // decide based on the actual paused flag of the element, the mirrored state
        // might be stale at this point
        if self.element.paused().await {
            let session = self.session().await;
            self.request_playback(session).await;
        } else {
            self.pause().await;
        }
    }

    async fn pause(&self) {
        self.element.pause().await;
        self.update_playing(false).await;
        self.update_state(PlayerState::Paused).await;
    }

    async fn seek(&self, time: u64) {
        trace!("Seeking embedded playback to {}", time);
        self.element.seek(time).await;

        // updated optimistically, ahead of the next time update of the element
        {
            let mut playback_state = self.playback_state.lock().await;
            playback_state.time = time;
        }
        self.callbacks.invoke(PlayerEvent::TimeChanged(time));
    }

    async fn stop(&self) {
        debug!("Stopping the embedded playback");
        self.element.pause().await;
        self.update_playing(false).await;
        self.update_state(PlayerState::Stopped).await;
    }

    async fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        trace!("Updating embedded playback volume to {}", volume);
        self.element.set_volume(volume).await;

        {
            let mut playback_state = self.playback_state.lock().await;
            playback_state.volume = volume;
        }
        self.callbacks.invoke(PlayerEvent::VolumeChanged(volume));
    }

    async fn set_playback_rate(&self, rate: PlaybackRate) {
        trace!("Updating embedded playback rate to {}", rate);
        self.element.set_playback_rate(rate.multiplier()).await;

        {
            let mut playback_state = self.playback_state.lock().await;
            playback_state.playback_rate = rate;
        }
        self.callbacks.invoke(PlayerEvent::RateChanged(rate));
    }

    async fn new_session(&self) -> Handle {
        let mut session = self.session.lock().await;
        *session = Handle::new();
        session.clone()
    }

    async fn session(&self) -> Handle {
        let session = self.session.lock().await;
        session.clone()
    }

    async fn is_current_session(&self, session: &Handle) -> bool {
        let current = self.session.lock().await;
        *current == *session
    }

    async fn update_playing(&self, is_playing: bool) {
        let mut playback_state = self.playback_state.lock().await;
        playback_state.is_playing = is_playing;
    }

    async fn update_state(&self, new_state: PlayerState) {
        {
            let mut state = self.state.lock().await;
            if *state == new_state {
                return;
            }
            *state = new_state.clone();
        }

        debug!("Embedded player state changed to {}", new_state);
        self.callbacks
            .invoke(PlayerEvent::StateChanged(new_state));
    }
}
