//! Event Bus implementation.
//!
//! Synchronous handlers run on the publishing thread; async consumers take a
//! broadcast receiver. The poll loop owns an `Arc<EventBus>` and publishes
//! every display change through it.
//!
//! The bus also remembers the latest value of every panel element, so a
//! panel opened mid-session can draw itself from [`EventBus::panel`] before
//! the next update arrives.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::mem::{discriminant, Discriminant};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, DashboardEvent, EventCategory};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Box<dyn Fn(AppEvent) + Send + Sync>;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for broadcast receivers. A receiver that falls
    /// further behind skips the oldest events.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Latest value of each panel element, in first-published order
#[derive(Default)]
struct PanelState {
    slots: Vec<(Discriminant<DashboardEvent>, DashboardEvent)>,
}

impl PanelState {
    fn update(&mut self, event: &DashboardEvent) {
        // Frames are transient; only the renderer cares about them.
        if matches!(event, DashboardEvent::FrameShown { .. }) {
            return;
        }

        let key = discriminant(event);
        match self.slots.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = event.clone(),
            None => self.slots.push((key, event.clone())),
        }
    }
}

/// Central event bus for application-wide event distribution
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>,
    panel: RwLock<PanelState>,
    config: EventBusConfig,
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(HashMap::new()),
            panel: RwLock::new(PanelState::default()),
            config,
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of broadcast receivers that got the event. Having
    /// no subscriber at all is not an error; a panel that is not open simply
    /// misses updates.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("event: {}", event.description());

        if let AppEvent::Dashboard(update) = &event {
            self.panel.write().update(update);
        }

        {
            let handlers = self.handlers.read();
            for (filter, handler) in handlers.values() {
                if filter.matches(&event) {
                    handler(event.clone());
                }
            }
        }

        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events with a synchronous handler
    ///
    /// The handler runs on the publishing thread, which is the poll loop
    /// thread, so it must return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Get a receiver for async consumers
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Current panel: the latest update of each element
    pub fn panel(&self) -> Vec<DashboardEvent> {
        self.panel
            .read()
            .slots
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}
