use crate::core::event::{Error, Event, Result};

use fx_handle::Handle;
use log::{debug, error, info, trace, warn};
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Mutex};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

/// The highest order for events, this priority will be first invoked
pub const HIGHEST_ORDER: Order = i32::MIN;
/// The default order for events
pub const DEFAULT_ORDER: Order = 0;
/// The lowest order for events, this priority will be last invoked
pub const LOWEST_ORDER: Order = i32::MAX;

/// The event callback unique identifier.
type EventCallbackHandle = Handle;
/// The event for registering a new event callback.
type RegistrationEvent = (UnboundedSender<EventHandler>, Order);

/// The event callback receiver for events published to the event chain.
pub type EventCallback = UnboundedReceiver<EventHandler>;

/// The event ordering priority type that determines the order in which the event consumers/listeners will be invoked.
pub type Order = i32;

/// A single link within the event chain of a published event.
///
/// The handler gives a subscriber access to the published event and the decision to either
/// continue or stop the remainder of the chain.
#[derive(Debug)]
pub struct EventHandler {
    event: Option<Event>,
    response: Option<oneshot::Sender<Option<Event>>>,
}

impl EventHandler {
    fn new(event: Event) -> (Self, oneshot::Receiver<Option<Event>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                event: Some(event),
                response: Some(tx),
            },
            rx,
        )
    }

    /// Get the reference to the event that was published.
    pub fn event_ref(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    /// Get the event that was published, consuming the event from the handler.
    pub fn take(&mut self) -> Option<Event> {
        self.event.take()
    }

    /// Continue with the next callback in the event chain.
    pub fn next(&mut self) {
        let event = self.event.take();
        self.next_with(event);
    }

    /// Stop the event chain by consuming the event.
    /// This will make the event publisher stop processing the event chain.
    pub fn stop(&mut self) {
        let _ = self.event.take();
        self.next_with(None);
    }

    fn next_with(&mut self, event: Option<Event>) {
        if let Some(response) = self.response.take() {
            let _ = response.send(event);
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.next();
    }
}

/// The event publisher allows for the publishing and listening to application wide events.
/// It decouples components by letting each component subscribe to the chain without needing
/// to know who the original publisher of an event is.
///
/// # Examples
///
/// ## Publish a new event
///
/// ```no_run
/// use video_fx_core::core::event::{Event, EventPublisher};
/// let publisher = EventPublisher::default();
///
/// publisher.publish(Event::ClosePlayer);
/// ```
///
/// ## Register consumer/listener
///
/// ```no_run
/// use video_fx_core::core::event::{Event, EventPublisher, HIGHEST_ORDER};
/// let publisher = EventPublisher::default();
///
/// let callback = publisher.subscribe(HIGHEST_ORDER);
/// ```
#[derive(Debug, Clone)]
pub struct EventPublisher {
    inner: Arc<InnerEventPublisher>,
}

impl EventPublisher {
    /// Create a new event publisher instance.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        let inner = Arc::new(InnerEventPublisher {
            sender,
            callbacks: Default::default(),
            cancellation_token: Default::default(),
        });

        let inner_main = inner.clone();
        tokio::spawn(async move {
            inner_main.start(receiver).await;
        });

        Self { inner }
    }

    /// Create a new event subscription with the `EventPublisher`.
    /// The receiver of the subscription will receive all events published to the `EventPublisher`.
    ///
    /// # Arguments
    ///
    /// * `order` - The ordering priority for receiving events. Lower values indicate higher priority.
    ///
    /// # Returns
    ///
    /// It returns the event receiver when the publisher has not yet been closed, else [Error::Closed].
    pub fn subscribe(&self, order: Order) -> Result<EventCallback> {
        if self.inner.cancellation_token.is_cancelled() {
            return Err(Error::Closed);
        }

        let (sender, receiver) = unbounded_channel();
        let _ = self
            .inner
            .sender
            .send(EventPublisherCommand::Registration((sender, order)));

        Ok(receiver)
    }

    /// Publish a new application event.
    ///
    /// This method asynchronously invokes the registered event callbacks with the provided event.
    ///
    /// # Arguments
    ///
    /// * `event` - The event to publish.
    pub fn publish(&self, event: Event) {
        let _ = self.inner.sender.send(EventPublisherCommand::Event(event));
    }

    /// Close the event publisher from publishing any new events.
    /// This will terminate the event loop.
    pub fn close(&self) {
        self.inner.cancellation_token.cancel()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

enum EventPublisherCommand {
    Registration(RegistrationEvent),
    Event(Event),
}

#[derive(Debug)]
struct InnerEventPublisher {
    sender: UnboundedSender<EventPublisherCommand>,
    callbacks: Mutex<Vec<EventCallbackHolder>>,
    cancellation_token: CancellationToken,
}

impl InnerEventPublisher {
    /// Start the main internal loop of the event publisher.
    /// This loop will handle every published event until it is cancelled.
    async fn start(&self, mut receiver: UnboundedReceiver<EventPublisherCommand>) {
        loop {
            select! {
                _ = self.cancellation_token.cancelled() => break,
                Some(command) = receiver.recv() => self.handle_command_event(command).await,
            }
        }

        debug!("Event publisher main loop ended");
    }

    async fn handle_command_event(&self, command: EventPublisherCommand) {
        match command {
            EventPublisherCommand::Registration((sender, order)) => {
                self.handle_callback_registration(sender, order).await
            }
            EventPublisherCommand::Event(event) => self.handle_event(event).await,
        }
    }

    async fn handle_event(&self, event: Event) {
        let invocations = self.callbacks.lock().await;
        let mut invocations_to_remove = vec![];
        info!("Publishing event {}", event);
        let mut event = event;

        debug!(
            "Invoking a total of {} callbacks for the event publisher",
            invocations.len()
        );
        trace!("Invoking callbacks {:?}", invocations);
        for invocation in invocations.iter() {
            let event_info = event.to_string();
            let (event_handler, receiver) = EventHandler::new(event);
            if let Err(mut e) = invocation.sender.send(event_handler) {
                event = e.0.take().expect("expected the event to still be present");
                invocations_to_remove.push(invocation.handle);
                continue;
            }

            select! {
                _ = time::sleep(Duration::from_secs(60)) => {
                    error!("Event publisher callback invocation timed out for {:?}", event_info);
                    break;
                }
                result = receiver => {
                    match result {
                        Ok(result) => {
                            match result {
                                None => {
                                    debug!("Event publisher chain has been interrupted");
                                    break;
                                }
                                Some(result) => event = result,
                            }
                        },
                        Err(_) => {
                            warn!("Event publisher callback invocation failed, response channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_callback_registration(
        &self,
        sender: UnboundedSender<EventHandler>,
        order: Order,
    ) {
        trace!("Registering a new callback to the EventPublisher");
        let mut callbacks = self.callbacks.lock().await;
        callbacks.push(EventCallbackHolder {
            handle: Default::default(),
            order,
            sender,
        });
        callbacks.sort();
        debug!(
            "Added event callback, new total callbacks {}",
            callbacks.len()
        );
    }
}

/// The holder is responsible for storing the ordering information of callbacks.
/// It will order the callbacks based on the [Order] value.
struct EventCallbackHolder {
    handle: EventCallbackHandle,
    order: Order,
    sender: UnboundedSender<EventHandler>,
}

impl PartialEq for EventCallbackHolder {
    fn eq(&self, other: &Self) -> bool {
        self.order.eq(&other.order)
    }
}

impl Eq for EventCallbackHolder {}

impl PartialOrd for EventCallbackHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.order.partial_cmp(&other.order)
    }
}

impl Ord for EventCallbackHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .expect("expected an Ordering to be returned")
    }
}

impl Debug for EventCallbackHolder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbackHolder")
            .field("order", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use crate::core::event::{PlayerStartedEvent, PlayerStoppedEvent};
    use crate::{assert_timeout, init_logger, recv_timeout};

    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_event_publisher_register() {
        init_logger!();
        let publisher = EventPublisher::default();

        let _callback = publisher
            .subscribe(DEFAULT_ORDER)
            .expect("expected to receive a callback receiver");

        let callbacks = &publisher.inner.callbacks;
        assert_timeout!(
            Duration::from_millis(200),
            callbacks.lock().await.len() == 1,
            "expected the callback to have been registered"
        );
    }

    #[tokio::test]
    async fn test_event_publisher_register_closed() {
        init_logger!();
        let publisher = EventPublisher::default();

        publisher.close();

        let result = publisher.subscribe(DEFAULT_ORDER);
        if let Err(result) = result {
            assert_eq!(
                Error::Closed,
                result,
                "expected the publisher to have been closed"
            );
        } else {
            assert!(false, "expected Err, but got {:?} instead", result);
        }
    }

    #[tokio::test]
    async fn test_event_publisher_publish() {
        init_logger!();
        let (tx, mut rx) = unbounded_channel();
        let event = Event::PlayerStopped(PlayerStoppedEvent {
            url: "http://localhost/video.mkv".to_string(),
            title: None,
            time: Some(140000),
            duration: Some(2000000),
        });
        let publisher = EventPublisher::default();

        let mut callback = publisher
            .subscribe(DEFAULT_ORDER)
            .expect("expected to receive a callback receiver");
        tokio::spawn(async move {
            loop {
                if let Some(mut handler) = callback.recv().await {
                    if let Some(event) = handler.take() {
                        tx.send(event).unwrap();
                    }
                    handler.next();
                } else {
                    break;
                }
            }
        });

        publisher.publish(event.clone());

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!(event, result);
    }

    #[tokio::test]
    async fn test_event_publisher_chain_ordering() {
        init_logger!();
        let (tx, mut rx) = unbounded_channel();
        let publisher = EventPublisher::default();

        let mut highest = publisher
            .subscribe(HIGHEST_ORDER)
            .expect("expected to receive a callback receiver");
        let tx_highest = tx.clone();
        tokio::spawn(async move {
            while let Some(mut handler) = highest.recv().await {
                tx_highest.send("highest").unwrap();
                handler.next();
            }
        });
        let mut lowest = publisher
            .subscribe(LOWEST_ORDER)
            .expect("expected to receive a callback receiver");
        tokio::spawn(async move {
            while let Some(mut handler) = lowest.recv().await {
                tx.send("lowest").unwrap();
                handler.next();
            }
        });

        publisher.publish(Event::ClosePlayer);

        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("highest", result);
        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        assert_eq!("lowest", result);
    }

    #[tokio::test]
    async fn test_event_publisher_chain_interrupted() {
        init_logger!();
        let (tx, mut rx) = unbounded_channel();
        let publisher = EventPublisher::default();

        let mut consumer = publisher
            .subscribe(HIGHEST_ORDER)
            .expect("expected to receive a callback receiver");
        tokio::spawn(async move {
            while let Some(mut handler) = consumer.recv().await {
                if let Some(Event::ClosePlayer) = handler.event_ref() {
                    handler.stop();
                } else {
                    handler.next();
                }
            }
        });
        let mut remainder = publisher
            .subscribe(LOWEST_ORDER)
            .expect("expected to receive a callback receiver");
        tokio::spawn(async move {
            while let Some(mut handler) = remainder.recv().await {
                if let Some(event) = handler.event_ref() {
                    tx.send(event.clone()).unwrap();
                }
                handler.next();
            }
        });

        publisher.publish(Event::ClosePlayer);
        publisher.publish(Event::PlayerStarted(PlayerStartedEvent {
            url: "http://localhost/video.mp4".to_string(),
            title: "FooBar".to_string(),
            thumbnail: None,
        }));

        // the ClosePlayer event should have been consumed by the first subscriber
        let result = recv_timeout!(&mut rx, Duration::from_millis(200));
        if let Event::PlayerStarted(_) = result {
        } else {
            assert!(
                false,
                "expected Event::PlayerStarted, but got {} instead",
                result
            )
        }
    }
}
