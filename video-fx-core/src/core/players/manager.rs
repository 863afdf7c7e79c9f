use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscription};
use log::{debug, info, trace, warn};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::event::{Event, EventPublisher, PlayerStoppedEvent};
use crate::core::players::{Player, PlayerError, PlayerEvent, PlayerState};
use crate::core::players;

/// An event representing changes within the player manager.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PlayerManagerEvent {
    /// Invoked when the active player has been changed
    #[display("Active player changed to {}", _0.new_player_id)]
    ActivePlayerChanged(PlayerChangedEvent),
    /// Invoked when the registered players have been changed
    #[display("Registered players have been changed")]
    PlayersChanged,
    /// Invoked when the duration of the active player playback is changed
    #[display("Active player duration changed to {}", _0)]
    PlayerDurationChanged(u64),
    /// Invoked when the time of the active player playback is changed
    #[display("Active player time changed to {}", _0)]
    PlayerTimeChanged(u64),
    /// Invoked when the state of the active player is changed
    #[display("Active player state changed to {}", _0)]
    PlayerStateChanged(PlayerState),
}

/// Represents a change of the active player within the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerChangedEvent {
    /// The previous player's unique identifier, if any.
    pub old_player_id: Option<String>,
    /// The new active player's unique identifier.
    pub new_player_id: String,
    /// The name of the new active player.
    pub new_player_name: String,
}

/// The manager responsible for the registered players and the events of the active player.
///
/// The manager re-broadcasts the events of the active player as [PlayerManagerEvent]s,
/// allowing consumers to follow the active playback without subscribing to each player
/// individually.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PlayerManager: Debug + Send + Sync {
    /// Get the currently active player, if any.
    async fn active_player(&self) -> Option<Arc<Box<dyn Player>>>;

    /// Set the player with the given id as the active player.
    async fn set_active_player(&self, player_id: &str);

    /// Get the ids of the registered players.
    async fn players(&self) -> Vec<String>;

    /// Register a new player with the manager.
    async fn register(&self, player: Box<dyn Player>) -> players::Result<()>;

    /// Subscribe to the events of the player manager.
    fn subscribe(&self) -> Subscription<PlayerManagerEvent>;
}

/// The default implementation of the [PlayerManager].
#[derive(Debug)]
pub struct DefaultPlayerManager {
    inner: Arc<InnerPlayerManager>,
}

impl DefaultPlayerManager {
    /// Create a new player manager which publishes playback stop information to the given
    /// event publisher.
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self {
            inner: Arc::new(InnerPlayerManager {
                players: Default::default(),
                active: Default::default(),
                last_known_time: Default::default(),
                last_known_duration: Default::default(),
                callbacks: MultiThreadedCallback::new(),
                event_publisher,
                cancellation_token: Default::default(),
            }),
        }
    }
}

#[async_trait]
impl PlayerManager for DefaultPlayerManager {
    async fn active_player(&self) -> Option<Arc<Box<dyn Player>>> {
        let active = self.inner.active.lock().await;
        active.as_ref().map(|e| e.player.clone())
    }

    async fn set_active_player(&self, player_id: &str) {
        self.inner.clone().set_active_player(player_id).await
    }

    async fn players(&self) -> Vec<String> {
        let players = self.inner.players.lock().await;
        players.iter().map(|e| e.id().to_string()).collect()
    }

    async fn register(&self, player: Box<dyn Player>) -> players::Result<()> {
        self.inner.register(player).await
    }

    fn subscribe(&self) -> Subscription<PlayerManagerEvent> {
        self.inner.callbacks.subscribe()
    }
}

impl Drop for DefaultPlayerManager {
    fn drop(&mut self) {
        self.inner.cancellation_token.cancel()
    }
}

/// The currently active player and the cancellation of its event forwarding listener.
#[derive(Debug)]
struct ActivePlayer {
    player: Arc<Box<dyn Player>>,
    listener_token: CancellationToken,
}

#[derive(Debug)]
struct InnerPlayerManager {
    players: Mutex<Vec<Arc<Box<dyn Player>>>>,
    active: Mutex<Option<ActivePlayer>>,
    last_known_time: Mutex<Option<u64>>,
    last_known_duration: Mutex<Option<u64>>,
    callbacks: MultiThreadedCallback<PlayerManagerEvent>,
    event_publisher: EventPublisher,
    cancellation_token: CancellationToken,
}

impl InnerPlayerManager {
    async fn register(&self, player: Box<dyn Player>) -> players::Result<()> {
        let mut players = self.players.lock().await;

        if players.iter().any(|e| e.id() == player.id()) {
            return Err(PlayerError::DuplicatePlayer(player.id().to_string()));
        }

        debug!("Registering new player {}", player);
        players.push(Arc::new(player));
        drop(players);

        self.callbacks.invoke(PlayerManagerEvent::PlayersChanged);
        Ok(())
    }

    async fn set_active_player(self: Arc<Self>, player_id: &str) {
        let player: Option<Arc<Box<dyn Player>>>;

        {
            let players = self.players.lock().await;
            player = players.iter().find(|e| e.id() == player_id).cloned();
        }

        if let Some(player) = player {
            let mut active = self.active.lock().await;
            let old_player_id = active.as_ref().map(|e| e.player.id().to_string());

            if old_player_id.as_deref() == Some(player_id) {
                trace!("Player {} is already the active player", player_id);
                return;
            }

            // tear down the event forwarding of the previous player
            if let Some(previous) = active.take() {
                previous.listener_token.cancel();
            }

            {
                let mut time = self.last_known_time.lock().await;
                *time = None;
            }
            {
                let mut duration = self.last_known_duration.lock().await;
                *duration = None;
            }

            let listener_token = self.cancellation_token.child_token();
            let event_receiver = player.subscribe();
            let forward_player = player.clone();
            let _ = active.insert(ActivePlayer {
                player,
                listener_token: listener_token.clone(),
            });
            drop(active);

            info!("Active player has been changed to {}", player_id);
            self.callbacks
                .invoke(PlayerManagerEvent::ActivePlayerChanged(
                    PlayerChangedEvent {
                        old_player_id,
                        new_player_id: forward_player.id().to_string(),
                        new_player_name: forward_player.name().to_string(),
                    },
                ));

            let inner = self.clone();
            tokio::spawn(async move {
                inner
                    .forward_player_events(forward_player, event_receiver, listener_token)
                    .await;
            });
        } else {
            warn!("Unable to activate player {}, player not found", player_id);
        }
    }

    async fn forward_player_events(
        self: Arc<Self>,
        player: Arc<Box<dyn Player>>,
        mut event_receiver: Subscription<PlayerEvent>,
        listener_token: CancellationToken,
    ) {
        loop {
            select! {
                _ = listener_token.cancelled() => break,
                event = event_receiver.recv() => {
                    if let Some(event) = event {
                        self.handle_player_event(&player, (*event).clone()).await;
                    } else {
                        break;
                    }
                }
            }
        }

        debug!("Player {} event forwarding has ended", player.id());
    }

    async fn handle_player_event(&self, player: &Arc<Box<dyn Player>>, event: PlayerEvent) {
        trace!("Forwarding player event {:?}", event);
        match event {
            PlayerEvent::DurationChanged(e) => {
                {
                    let mut duration = self.last_known_duration.lock().await;
                    *duration = Some(e);
                }
                self.callbacks
                    .invoke(PlayerManagerEvent::PlayerDurationChanged(e));
            }
            PlayerEvent::TimeChanged(e) => {
                {
                    let mut time = self.last_known_time.lock().await;
                    *time = Some(e);
                }
                self.callbacks
                    .invoke(PlayerManagerEvent::PlayerTimeChanged(e));
            }
            PlayerEvent::StateChanged(state) => {
                if state == PlayerState::Stopped {
                    self.publish_player_stopped(player).await;
                }
                self.callbacks
                    .invoke(PlayerManagerEvent::PlayerStateChanged(state));
            }
            _ => trace!("Player event {:?} is not forwarded by the manager", event),
        }
    }

    /// Publish the last known playback information of the given player.
    async fn publish_player_stopped(&self, player: &Arc<Box<dyn Player>>) {
        if let Some(request) = player.request().await {
            let time = self.last_known_time.lock().await.clone();
            let duration = self.last_known_duration.lock().await.clone();

            self.event_publisher
                .publish(Event::PlayerStopped(PlayerStoppedEvent {
                    url: request.url().to_string(),
                    title: Some(request.title().to_string()),
                    time,
                    duration,
                }));
        } else {
            debug!("Player {} stopped without a known play request", player.id());
        }
    }
}
