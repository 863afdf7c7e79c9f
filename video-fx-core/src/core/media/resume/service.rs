use crate::core::event::{
    Event, EventCallback, EventHandler, EventPublisher, PlayerStoppedEvent, HIGHEST_ORDER,
};
use crate::core::media;
use crate::core::media::resume::VideoResume;
use crate::core::media::MediaError;
use crate::core::players::{PlayerManager, PlayerManagerEvent, PlayerState};
use crate::core::storage::{Storage, StorageError};

use async_trait::async_trait;
use fx_callback::Subscription;
use log::{debug, error, info, trace, warn};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::select;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const FILENAME: &str = "auto-resume.json";

/// The auto-resume service which handles the resume timestamp of video playbacks.
///
/// It continuously stores the last known playback position of the active player and
/// resets the position back to zero when a playback reaches the natural end of its media.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AutoResumeService: Debug + Send + Sync {
    /// Retrieve the resume timestamp for the given video url and/or title.
    ///
    /// It retrieves the timestamp when found, else [None].
    async fn resume_timestamp(&self, url: &str, title: &str) -> Option<u64>;
}

/// The default auto-resume service which stores the playback positions as a json file
/// within the storage directory.
#[derive(Debug)]
pub struct DefaultAutoResumeService {
    inner: Arc<InnerAutoResumeService>,
}

impl DefaultAutoResumeService {
    pub fn builder() -> DefaultAutoResumeServiceBuilder {
        DefaultAutoResumeServiceBuilder::default()
    }
}

#[async_trait]
impl AutoResumeService for DefaultAutoResumeService {
    async fn resume_timestamp(&self, url: &str, title: &str) -> Option<u64> {
        self.inner.resume_timestamp(url, title).await
    }
}

/// A builder for `DefaultAutoResumeService` instances.
#[derive(Default)]
pub struct DefaultAutoResumeServiceBuilder {
    storage_directory: Option<String>,
    event_publisher: Option<EventPublisher>,
    player_manager: Option<Arc<Box<dyn PlayerManager>>>,
}

impl DefaultAutoResumeServiceBuilder {
    /// Sets the storage directory in which the auto-resume data is stored.
    ///
    /// # Panics
    ///
    /// Panics if the `storage_directory` is not set when `build()` is called.
    pub fn storage_directory(mut self, storage_directory: &str) -> Self {
        self.storage_directory = Some(storage_directory.to_string());
        self
    }

    /// Sets the event publisher used to detect started and stopped playbacks.
    pub fn event_publisher(mut self, event_publisher: EventPublisher) -> Self {
        self.event_publisher = Some(event_publisher);
        self
    }

    /// Sets the player manager of which the playback time events are followed.
    pub fn player_manager(mut self, player_manager: Arc<Box<dyn PlayerManager>>) -> Self {
        self.player_manager = Some(player_manager);
        self
    }

    /// Builds a new `DefaultAutoResumeService`.
    ///
    /// # Panics
    ///
    /// Panics if the `storage_directory` is not set.
    pub fn build(self) -> DefaultAutoResumeService {
        let instance = DefaultAutoResumeService {
            inner: Arc::new(InnerAutoResumeService {
                storage: Mutex::new(Storage::from(
                    self.storage_directory
                        .expect("expected the storage directory to have been set")
                        .as_str(),
                )),
                cache: Mutex::new(None),
                current_playback: Mutex::new(None),
                cancellation_token: Default::default(),
            }),
        };

        match (self.event_publisher, self.player_manager) {
            (Some(event_publisher), Some(player_manager)) => {
                let inner = instance.inner.clone();
                let callback = event_publisher
                    .subscribe(HIGHEST_ORDER + 10)
                    .expect("expected to receive a callback");
                let player_events = player_manager.subscribe();
                tokio::spawn(async move {
                    inner.start(callback, player_events).await;
                });
            }
            _ => {
                warn!("No event publisher and/or player manager configured for DefaultAutoResumeService, unable to automatically store playback positions");
            }
        }

        instance
    }
}

/// The last known playback information of the active player.
#[derive(Debug, Clone)]
struct CurrentPlayback {
    url: String,
    title: String,
}

#[derive(Debug)]
struct InnerAutoResumeService {
    storage: Mutex<Storage>,
    cache: Mutex<Option<VideoResume>>,
    current_playback: Mutex<Option<CurrentPlayback>>,
    cancellation_token: CancellationToken,
}

impl InnerAutoResumeService {
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

        match self.cache.lock().await.as_ref() {
            None => {}
            Some(e) => self.save_async(e).await,
        }
        debug!("Auto-resume service main loop ended");
    }

    async fn handle_event(&self, mut handler: EventHandler) {
        match handler.event_ref() {
            Some(Event::PlayerStarted(player_started)) => {
                trace!("Tracking new playback {:?}", player_started);
                let mut current_playback = self.current_playback.lock().await;
                *current_playback = Some(CurrentPlayback {
                    url: player_started.url.clone(),
                    title: player_started.title.clone(),
                });
            }
            Some(Event::PlayerStopped(player_stopped)) => {
                self.player_stopped(player_stopped).await;
            }
            _ => {}
        }
        handler.next();
    }

    async fn handle_player_event(&self, event: PlayerManagerEvent) {
        match event {
            PlayerManagerEvent::PlayerTimeChanged(time) => {
                let current = self.current_playback.lock().await.clone();

                if let Some(current) = current {
                    self.update_position(current.url.as_str(), current.title.as_str(), time)
                        .await;
                } else {
                    trace!("Skipping time update, no playback is being tracked");
                }
            }
            PlayerManagerEvent::PlayerStateChanged(PlayerState::Completed) => {
                let current = self.current_playback.lock().await.clone();

                if let Some(current) = current {
                    debug!(
                        "Resetting the playback position of {} to zero",
                        current.title
                    );
                    self.update_position(current.url.as_str(), current.title.as_str(), 0)
                        .await;
                }
            }
            _ => {}
        }
    }

    async fn player_stopped(&self, event: &PlayerStoppedEvent) {
        trace!("Received player stopped event {:?}", event);
        if let Some(time) = event.time() {
            let title = match event.title.clone() {
                Some(e) => e,
                None => {
                    let current = self.current_playback.lock().await;
                    current
                        .as_ref()
                        .map(|e| e.title.clone())
                        .unwrap_or_default()
                }
            };

            self.update_position(event.url(), title.as_str(), *time)
                .await;
        } else {
            debug!("Unable to store the playback position, missing time data");
        }
    }

    async fn update_position(&self, url: &str, title: &str, time: u64) {
        match self.load_resume_cache().await {
            Ok(_) => {
                let mut mutex = self.cache.lock().await;
                if let Some(cache) = mutex.as_mut() {
                    trace!("Updating playback position of {} to {}", url, time);
                    cache.insert(url, title, time);
                    self.save_async(cache).await;
                }
            }
            Err(e) => error!("Failed to store the playback position, {}", e),
        }
    }

    async fn load_resume_cache(&self) -> media::Result<()> {
        let mut cache = self.cache.lock().await;

        if cache.is_none() {
            trace!("Loading auto-resume cache");
            return match self.load_resume_from_storage().await {
                Ok(e) => {
                    let _ = cache.insert(e);
                    Ok(())
                }
                Err(e) => Err(e),
            };
        }

        trace!("Auto-resume cache already loaded, nothing to do");
        Ok(())
    }

    async fn load_resume_from_storage(&self) -> media::Result<VideoResume> {
        let mutex = self.storage.lock().await;
        match mutex.options().serializer(FILENAME).read() {
            Ok(e) => Ok(e),
            Err(e) => match e {
                StorageError::NotFound(file) => {
                    debug!("Creating new auto-resume file {}", file);
                    Ok(VideoResume::default())
                }
                StorageError::ReadingFailed(_, error) => {
                    error!("Failed to load auto-resume, {}", error);
                    Err(MediaError::AutoResumeLoadingFailed(error))
                }
                _ => {
                    warn!("Unexpected error returned from storage, {}", e);
                    Ok(VideoResume::default())
                }
            },
        }
    }

    async fn save_async(&self, resume: &VideoResume) {
        let mutex = self.storage.lock().await;
        match mutex
            .options()
            .serializer(FILENAME)
            .write_async(resume)
            .await
        {
            Ok(_) => trace!("Auto-resume data has been saved"),
            Err(e) => error!("Failed to save auto-resume, {}", e),
        }
    }

    async fn resume_timestamp(&self, url: &str, title: &str) -> Option<u64> {
        match self.load_resume_cache().await {
            Ok(_) => {
                debug!(
                    "Retrieving auto-resume info for url: {}, title: {}",
                    url, title
                );
                let mutex = self.cache.lock().await;
                let cache = mutex.as_ref()?;

                // always search first on the source url as it uniquely identifies the video,
                // the title might collide between different items
                if let Some(e) = cache.find_url(url) {
                    info!("Found resume timestamp {} for {}", e.last_known_timestamp(), url);
                    return Some(*e.last_known_timestamp());
                }

                if let Some(e) = cache.find_title(title) {
                    info!(
                        "Found resume timestamp {} for {}",
                        e.last_known_timestamp(),
                        title
                    );
                    return Some(*e.last_known_timestamp());
                }

                None
            }
            Err(e) => {
                error!("Failed to retrieve auto-resume info, {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::core::event::PlayerStartedEvent;
    use crate::core::players::MockPlayerManager;
    use crate::testing::{read_temp_dir_file_as_string, write_temp_dir_file};
    use crate::{assert_timeout_eq, init_logger};

    use fx_callback::{Callback, MultiThreadedCallback};
    use std::time::Duration;
    use tempfile::tempdir;

    fn new_service_with_events(
        temp_path: &str,
    ) -> (
        DefaultAutoResumeService,
        EventPublisher,
        MultiThreadedCallback<PlayerManagerEvent>,
    ) {
        let event_publisher = EventPublisher::default();
        let callbacks = MultiThreadedCallback::new();
        let player_manager_subscription = callbacks.subscribe();
        let mut player_manager = Box::new(MockPlayerManager::new());
        player_manager
            .expect_subscribe()
            .times(1)
            .return_once(move || player_manager_subscription);
        let service = DefaultAutoResumeService::builder()
            .storage_directory(temp_path)
            .event_publisher(event_publisher.clone())
            .player_manager(Arc::new(player_manager as Box<dyn PlayerManager>))
            .build();

        (service, event_publisher, callbacks)
    }

    #[tokio::test]
    async fn test_resume_timestamp_url() {
        init_logger!();
        let url = "http://localhost/lorem.mp4";
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let service = DefaultAutoResumeService::builder()
            .storage_directory(temp_path)
            .build();
        write_temp_dir_file(
            &temp_dir,
            FILENAME,
            "{\"video_positions\":[{\"url\":\"http://localhost/lorem.mp4\",\"title\":\"Lorem\",\"last_known_time\":19826}]}",
        );

        let result = service.resume_timestamp(url, "Lorem").await;

        assert_eq!(Some(19826), result);
    }

    #[tokio::test]
    async fn test_resume_timestamp_title_fallback() {
        init_logger!();
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let service = DefaultAutoResumeService::builder()
            .storage_directory(temp_path)
            .build();
        write_temp_dir_file(
            &temp_dir,
            FILENAME,
            "{\"video_positions\":[{\"url\":\"http://localhost/lorem.mp4\",\"title\":\"Lorem\",\"last_known_time\":19826}]}",
        );

        let result = service
            .resume_timestamp("http://localhost/other-quality.mp4", "Lorem")
            .await;

        assert_eq!(Some(19826), result);
    }

    #[tokio::test]
    async fn test_resume_timestamp_not_found() {
        init_logger!();
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let service = DefaultAutoResumeService::builder()
            .storage_directory(temp_path)
            .build();

        let result = service
            .resume_timestamp("http://localhost/unknown.mp4", "Unknown")
            .await;

        assert_eq!(None, result);
    }

    #[tokio::test]
    async fn test_resume_timestamp_invalid_data() {
        init_logger!();
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let service = DefaultAutoResumeService::builder()
            .storage_directory(temp_path)
            .build();
        write_temp_dir_file(&temp_dir, FILENAME, "lorem ipsum dolor");

        let result = service
            .resume_timestamp("http://localhost/lorem.mp4", "Lorem")
            .await;

        assert_eq!(None, result);
    }

    #[tokio::test]
    async fn test_player_time_changed_stores_position() {
        init_logger!();
        let url = "http://localhost/lorem.mp4";
        let title = "Lorem";
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let (service, event_publisher, callbacks) = new_service_with_events(temp_path);

        event_publisher.publish(Event::PlayerStarted(PlayerStartedEvent {
            url: url.to_string(),
            title: title.to_string(),
            thumbnail: None,
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        callbacks.invoke(PlayerManagerEvent::PlayerTimeChanged(30000));

        assert_timeout_eq!(
            Duration::from_millis(500),
            Some(30000),
            service.resume_timestamp(url, title).await
        );
    }

    #[tokio::test]
    async fn test_player_completed_resets_position() {
        init_logger!();
        let url = "http://localhost/lorem.mp4";
        let title = "Lorem";
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let (service, event_publisher, callbacks) = new_service_with_events(temp_path);

        event_publisher.publish(Event::PlayerStarted(PlayerStartedEvent {
            url: url.to_string(),
            title: title.to_string(),
            thumbnail: None,
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        callbacks.invoke(PlayerManagerEvent::PlayerTimeChanged(125000));
        assert_timeout_eq!(
            Duration::from_millis(500),
            Some(125000),
            service.resume_timestamp(url, title).await
        );

        callbacks.invoke(PlayerManagerEvent::PlayerStateChanged(
            PlayerState::Completed,
        ));

        assert_timeout_eq!(
            Duration::from_millis(500),
            Some(0),
            service.resume_timestamp(url, title).await
        );
        let expected_result =
            "{\"video_positions\":[{\"url\":\"http://localhost/lorem.mp4\",\"title\":\"Lorem\",\"last_known_time\":0}]}";
        let result = read_temp_dir_file_as_string(&temp_dir, FILENAME);
        assert_eq!(expected_result, result.as_str());
    }

    #[tokio::test]
    async fn test_player_stopped_stores_position() {
        init_logger!();
        let url = "http://localhost/ipsum.mp4";
        let temp_dir = tempdir().expect("expected a temp dir to be created");
        let temp_path = temp_dir.path().to_str().unwrap();
        let (service, event_publisher, _callbacks) = new_service_with_events(temp_path);

        event_publisher.publish(Event::PlayerStopped(PlayerStoppedEvent {
            url: url.to_string(),
            title: Some("Ipsum".to_string()),
            time: Some(40000),
            duration: Some(350000),
        }));

        assert_timeout_eq!(
            Duration::from_millis(500),
            Some(40000),
            service.resume_timestamp(url, "Ipsum").await
        );
    }
}
