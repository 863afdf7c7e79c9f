use std::sync::Arc;

use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscriber, Subscription};
use log::{debug, info, trace, warn};
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::event::{
    Event, EventCallback, EventHandler, EventPublisher, PlayerStartedEvent, HIGHEST_ORDER,
};
use crate::core::media::resume::AutoResumeService;
use crate::core::players::{
    PlayRequest, Player, PlayerManager, PlayerManagerEvent, PlayerState,
};
use crate::core::playlist::{Playlist, PlaylistItem};

/// An event representing changes to the playlist manager.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PlaylistManagerEvent {
    /// Event indicating that the playlist has been changed.
    #[display("Playlist has been changed")]
    PlaylistChanged,
    /// Event indicating that the active selection within the playlist has been changed.
    #[display("Playlist selection changed to {:?}", _0)]
    SelectionChanged(Option<usize>),
    /// Event indicating a change in the playlist state.
    #[display("Playlist state changed to {}", _0)]
    StateChanged(PlaylistState),
}

/// An enumeration representing the state of a playlist.
#[derive(Debug, Display, Copy, Clone, PartialOrd, PartialEq)]
pub enum PlaylistState {
    /// No item has been selected yet and the placeholder should be shown.
    Idle,
    Playing,
    Stopped,
}

/// The manager responsible for the playlist items, the active selection and the
/// advancement of the selection when a playback completes.
///
/// When the active player reaches the natural end of an item, the manager selects the
/// next item within the playlist, or wraps back around to the first item when the end of
/// the playlist has been reached.
#[derive(Debug, Clone)]
pub struct PlaylistManager {
    inner: Arc<InnerPlaylistManager>,
}

impl PlaylistManager {
    /// Create a new playlist manager instance.
    pub fn new(
        player_manager: Arc<Box<dyn PlayerManager>>,
        event_publisher: EventPublisher,
        auto_resume: Arc<Box<dyn AutoResumeService>>,
    ) -> Self {
        let manager = Self {
            inner: Arc::new(InnerPlaylistManager {
                playlist: Default::default(),
                selection: Default::default(),
                player_manager,
                auto_resume,
                state: Mutex::new(PlaylistState::Idle),
                callbacks: MultiThreadedCallback::new(),
                event_publisher,
                cancellation_token: Default::default(),
            }),
        };

        let inner_main = manager.inner.clone();
        let callback = manager
            .inner
            .event_publisher
            .subscribe(HIGHEST_ORDER + 10)
            .expect("expected to be able to subscribe");
        let player_event_receiver = manager.inner.player_manager.subscribe();
        tokio::spawn(async move {
            inner_main.start(callback, player_event_receiver).await;
        });

        manager
    }

    /// Get the current playlist.
    pub async fn playlist(&self) -> Playlist {
        let playlist = self.inner.playlist.lock().await;
        playlist.clone()
    }

    /// Replace the playlist with the given items.
    ///
    /// The new playlist starts without an active selection, the first playback only
    /// starts once an item has been selected.
    pub async fn load(&self, playlist: Playlist) {
        self.inner.load(playlist).await
    }

    /// Get the index of the currently selected item, if any.
    pub async fn selected_index(&self) -> Option<usize> {
        self.inner.selected_index().await
    }

    /// Select the item at the given index and start its playback.
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the item within the playlist.
    pub async fn select(&self, index: usize) {
        self.inner.select(index).await
    }

    /// Retrieve the state of the current playlist.
    pub async fn state(&self) -> PlaylistState {
        self.inner.state().await
    }

    /// Stop the playback of the playlist.
    pub async fn stop(&self) {
        self.inner.stop().await
    }
}

impl Callback<PlaylistManagerEvent> for PlaylistManager {
    fn subscribe(&self) -> Subscription<PlaylistManagerEvent> {
        self.inner.callbacks.subscribe()
    }

    fn subscribe_with(&self, subscriber: Subscriber<PlaylistManagerEvent>) {
        self.inner.callbacks.subscribe_with(subscriber)
    }
}

#[derive(Debug)]
struct InnerPlaylistManager {
    playlist: Mutex<Playlist>,
    selection: Mutex<Option<usize>>,
    player_manager: Arc<Box<dyn PlayerManager>>,
    auto_resume: Arc<Box<dyn AutoResumeService>>,
    state: Mutex<PlaylistState>,
    callbacks: MultiThreadedCallback<PlaylistManagerEvent>,
    event_publisher: EventPublisher,
    cancellation_token: CancellationToken,
}

impl InnerPlaylistManager {
    /// Start the main loop of the playlist manager.
    async fn start(
        &self,
        mut event_receiver: EventCallback,
        mut player_event_receiver: Subscription<PlayerManagerEvent>,
    ) {
        loop {
            select! {
                _ = self.cancellation_token.cancelled() => break,
                Some(handler) = event_receiver.recv() => self.handle_event(handler).await,
                Some(event) = player_event_receiver.recv() => self.handle_player_event((*event).clone()).await,
            }
        }

        debug!("Playlist manager main loop ended");
    }

    async fn handle_event(&self, mut handler: EventHandler) {
        if let Some(Event::ClosePlayer) = handler.event_ref() {
            self.close_player().await;
        }
        handler.next();
    }

    async fn handle_player_event(&self, event: PlayerManagerEvent) {
        trace!("Processing player manager event {:?}", event);
        if let PlayerManagerEvent::PlayerStateChanged(PlayerState::Completed) = event {
            self.play_next().await;
        }
    }

    async fn load(&self, playlist: Playlist) {
        trace!("Replacing playlist with {:?}", playlist);
        {
            let mut mutex = self.playlist.lock().await;
            *mutex = playlist
        }
        {
            let mut selection = self.selection.lock().await;
            *selection = None;
        }

        self.update_state(PlaylistState::Idle).await;
        self.callbacks.invoke(PlaylistManagerEvent::PlaylistChanged);
        self.callbacks
            .invoke(PlaylistManagerEvent::SelectionChanged(None));
    }

    async fn selected_index(&self) -> Option<usize> {
        let selection = self.selection.lock().await;
        selection.clone()
    }

    async fn select(&self, index: usize) {
        let item = {
            let playlist = self.playlist.lock().await;
            playlist.get(index).cloned()
        };

        if let Some(item) = item {
            {
                let mut selection = self.selection.lock().await;
                let _ = selection.insert(index);
            }

            self.play_item(index, item).await;
        } else {
            warn!("Unable to select playlist item {}, index out of bounds", index);
        }
    }

    async fn play_item(&self, index: usize, item: PlaylistItem) {
        debug!("Starting playback of playlist item {}", item);
        let resume_timestamp = self
            .auto_resume
            .resume_timestamp(item.url.as_str(), item.title.as_str())
            .await;

        let mut builder = PlayRequest::builder()
            .url(item.url.as_str())
            .title(item.title.as_str());
        if let Some(e) = item.caption.as_ref() {
            builder = builder.caption(e.as_str());
        }
        if let Some(e) = item.thumb.as_ref() {
            builder = builder.thumb(e.as_str());
        }
        if let Some(e) = resume_timestamp {
            trace!("Resuming playlist item {} at {}", item, e);
            builder = builder.auto_resume_timestamp(e);
        }
        let request = builder.build();

        if let Some(player) = self.player_manager.active_player().await {
            self.event_publisher
                .publish(Event::PlayerStarted(PlayerStartedEvent {
                    url: item.url.clone(),
                    title: item.title.clone(),
                    thumbnail: item.thumb.clone(),
                }));
            player.play(request).await;
        } else {
            warn!(
                "Unable to start playlist item {}, no active player available",
                item
            );
        }

        self.update_state(PlaylistState::Playing).await;
        self.callbacks
            .invoke(PlaylistManagerEvent::SelectionChanged(Some(index)));
    }

    /// Advance the selection to the next item, wrapping back around to the first item
    /// when the end of the playlist has been reached.
    async fn play_next(&self) {
        let next_index = {
            let playlist = self.playlist.lock().await;
            if playlist.is_empty() {
                debug!("Unable to advance the playlist, no items available");
                return;
            }

            let selection = self.selection.lock().await;
            match selection.as_ref() {
                Some(index) if index + 1 < playlist.len() => index + 1,
                _ => 0,
            }
        };

        info!("Advancing playlist to item {}", next_index);
        self.select(next_index).await
    }

    async fn close_player(&self) {
        debug!("Closing the active playlist playback");
        if let Some(player) = self.player_manager.active_player().await {
            player.stop().await;
        }

        {
            let mut selection = self.selection.lock().await;
            *selection = None;
        }
        self.update_state(PlaylistState::Stopped).await;
        self.callbacks
            .invoke(PlaylistManagerEvent::SelectionChanged(None));
    }

    async fn state(&self) -> PlaylistState {
        *self.state.lock().await
    }

    async fn update_state(&self, new_state: PlaylistState) {
        trace!("Updating playlist state to {}", new_state);
        {
            let mut guard = self.state.lock().await;
            if *guard == new_state {
                return;
            }
            *guard = new_state;
        }

        debug!("Updated playlist state to {}", new_state);
        self.callbacks
            .invoke(PlaylistManagerEvent::StateChanged(new_state));
    }

    async fn stop(&self) {
        trace!("Stopping the current playlist");
        self.event_publisher.publish(Event::ClosePlayer);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::core::event::DEFAULT_ORDER;
    use crate::core::media::resume::MockAutoResumeService;
    use crate::core::players::MockPlayerManager;
    use crate::testing::MockPlayer;
    use crate::{assert_timeout_eq, init_logger, recv_timeout};

    use fx_callback::MultiThreadedCallback;
    use std::time::Duration;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn new_playlist(titles: Vec<&str>) -> Playlist {
        titles
            .into_iter()
            .map(|title| {
                PlaylistItem::builder()
                    .url(format!("http://localhost/{}.mp4", title))
                    .title(title)
                    .build()
            })
            .collect()
    }

    /// Create a new manager against a player which relays every received play request.
    fn new_manager(
        resume_timestamp: Option<u64>,
    ) -> (
        PlaylistManager,
        EventPublisher,
        MultiThreadedCallback<PlayerManagerEvent>,
        UnboundedReceiver<PlayRequest>,
    ) {
        let (tx, rx) = unbounded_channel();
        let event_publisher = EventPublisher::default();
        let callbacks = MultiThreadedCallback::new();
        let player_manager_subscription = callbacks.subscribe();
        let mut player = MockPlayer::new();
        player.expect_play().returning(move |request| {
            tx.send(request).unwrap();
        });
        player.expect_stop().return_const(());
        let player = Arc::new(Box::new(player) as Box<dyn Player>);
        let mut player_manager = Box::new(MockPlayerManager::new());
        player_manager
            .expect_subscribe()
            .times(1)
            .return_once(move || player_manager_subscription);
        player_manager
            .expect_active_player()
            .returning(move || Some(player.clone()));
        let mut auto_resume = Box::new(MockAutoResumeService::new());
        auto_resume
            .expect_resume_timestamp()
            .returning(move |_, _| resume_timestamp);
        let manager = PlaylistManager::new(
            Arc::new(player_manager as Box<dyn PlayerManager>),
            event_publisher.clone(),
            Arc::new(auto_resume as Box<dyn AutoResumeService>),
        );

        (manager, event_publisher, callbacks, rx)
    }

    #[tokio::test]
    async fn test_load() {
        init_logger!();
        let (manager, _event_publisher, _callbacks, _rx) = new_manager(None);
        let (tx, mut rx) = unbounded_channel();

        let mut receiver = manager.subscribe();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let PlaylistManagerEvent::PlaylistChanged = &*event {
                    tx.send((*event).clone()).unwrap();
                }
            }
        });

        manager.load(new_playlist(vec!["Lorem", "Ipsum"])).await;

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!(PlaylistManagerEvent::PlaylistChanged, result);
        assert_eq!(None, manager.selected_index().await);
        assert_eq!(PlaylistState::Idle, manager.state().await);
    }

    #[tokio::test]
    async fn test_select_with_resume_timestamp() {
        init_logger!();
        let (manager, event_publisher, _callbacks, mut rx) = new_manager(Some(42500));
        let (tx_event, mut rx_event) = unbounded_channel();

        let mut callback = event_publisher.subscribe(DEFAULT_ORDER).unwrap();
        tokio::spawn(async move {
            while let Some(mut handler) = callback.recv().await {
                if let Some(Event::PlayerStarted(e)) = handler.event_ref() {
                    tx_event.send(e.clone()).unwrap();
                }
                handler.next();
            }
        });

        manager.load(new_playlist(vec!["Lorem", "Ipsum"])).await;
        manager.select(0).await;

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("http://localhost/Lorem.mp4", result.url());
        assert_eq!("Lorem", result.title());
        assert_eq!(Some(42500), result.auto_resume_timestamp());

        let result = recv_timeout!(&mut rx_event, Duration::from_millis(200));
        assert_eq!("Lorem", result.title.as_str());
        assert_eq!(Some(0), manager.selected_index().await);
        assert_eq!(PlaylistState::Playing, manager.state().await);
    }

    #[tokio::test]
    async fn test_select_without_resume_timestamp() {
        init_logger!();
        let (manager, _event_publisher, _callbacks, mut rx) = new_manager(None);

        manager.load(new_playlist(vec!["Lorem"])).await;
        manager.select(0).await;

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!(None, result.auto_resume_timestamp());
    }

    #[tokio::test]
    async fn test_select_out_of_bounds() {
        init_logger!();
        let (manager, _event_publisher, _callbacks, _rx) = new_manager(None);

        manager.load(new_playlist(vec!["Lorem"])).await;
        manager.select(5).await;

        assert_eq!(None, manager.selected_index().await);
    }

    #[tokio::test]
    async fn test_completed_advances_and_wraps() {
        init_logger!();
        let (manager, _event_publisher, callbacks, mut rx) = new_manager(None);

        manager
            .load(new_playlist(vec!["VideoA", "VideoB", "VideoC"]))
            .await;
        manager.select(1).await;
        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("VideoB", result.title());

        // VideoB finishes, VideoC should be selected next
        callbacks.invoke(PlayerManagerEvent::PlayerStateChanged(
            PlayerState::Completed,
        ));
        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("VideoC", result.title());
        assert_timeout_eq!(
            Duration::from_millis(200),
            Some(2),
            manager.selected_index().await
        );

        // VideoC is the last item, the selection should wrap back around to VideoA
        callbacks.invoke(PlayerManagerEvent::PlayerStateChanged(
            PlayerState::Completed,
        ));
        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("VideoA", result.title());
        assert_timeout_eq!(
            Duration::from_millis(200),
            Some(0),
            manager.selected_index().await
        );
    }

    #[tokio::test]
    async fn test_completed_without_selection_starts_first_item() {
        init_logger!();
        let (manager, _event_publisher, callbacks, mut rx) = new_manager(None);

        manager.load(new_playlist(vec!["Lorem", "Ipsum"])).await;
        callbacks.invoke(PlayerManagerEvent::PlayerStateChanged(
            PlayerState::Completed,
        ));

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("Lorem", result.title());
    }

    #[tokio::test]
    async fn test_completed_with_empty_playlist() {
        init_logger!();
        let (manager, _event_publisher, callbacks, _rx) = new_manager(None);

        callbacks.invoke(PlayerManagerEvent::PlayerStateChanged(
            PlayerState::Completed,
        ));

        assert_timeout_eq!(
            Duration::from_millis(200),
            None::<usize>,
            manager.selected_index().await
        );
    }

    #[tokio::test]
    async fn test_stop() {
        init_logger!();
        let (manager, _event_publisher, _callbacks, mut rx) = new_manager(None);

        manager.load(new_playlist(vec!["Lorem"])).await;
        manager.select(0).await;
        let _ = recv_timeout!(&mut rx, Duration::from_millis(200));

        manager.stop().await;

        assert_timeout_eq!(
            Duration::from_millis(200),
            None::<usize>,
            manager.selected_index().await
        );
        assert_timeout_eq!(
            Duration::from_millis(200),
            PlaylistState::Stopped,
            manager.state().await
        );
    }
}
