use super::subscription::{ListenerId, Subscription, Topic};
use crate::messaging::Message;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;
use tracing::debug;

/// Ordered fan-out of job events to subscribed listener contexts
///
/// Each listener gets its own unbounded channel, so events for a job reach
/// every subscriber in the order they were published. Delivery to a
/// listener whose receiver has been dropped is a no-op; the listener is
/// pruned on the spot.
#[derive(Debug, Default)]
pub struct EventPublisher {
    listeners: BTreeMap<ListenerId, Listener>,
    next_id: u64,
}

#[derive(Debug)]
struct Listener {
    name: String,
    sender: mpsc::UnboundedSender<Message>,
    topics: BTreeSet<Topic>,
}

impl Listener {
    fn wants(&self, message: &Message) -> bool {
        let job_type = message.message_type().job_type;
        let addressed = message.target().map_or(true, |target| target == self.name);
        addressed && self.topics.iter().any(|topic| topic.matches(job_type))
    }
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener context; it receives nothing until it subscribes
    pub fn connect(&mut self, name: impl Into<String>) -> (ListenerId, mpsc::UnboundedReceiver<Message>) {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::unbounded_channel();
        let name = name.into();
        debug!(listener = %id, name = %name, "Listener connected");

        self.listeners.insert(
            id,
            Listener {
                name,
                sender,
                topics: BTreeSet::new(),
            },
        );
        (id, receiver)
    }

    /// Returns false for an unknown or already disconnected listener
    pub fn subscribe(&mut self, listener: ListenerId, topic: Topic) -> bool {
        match self.listeners.get_mut(&listener) {
            Some(entry) => {
                entry.topics.insert(topic);
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe(&mut self, listener: ListenerId, topic: Topic) -> bool {
        self.listeners
            .get_mut(&listener)
            .is_some_and(|entry| entry.topics.remove(&topic))
    }

    /// Drop the listener and all of its subscriptions
    pub fn disconnect(&mut self, listener: ListenerId) -> bool {
        let removed = self.listeners.remove(&listener).is_some();
        if removed {
            debug!(listener = %listener, "Listener disconnected");
        }
        removed
    }

    /// Deliver to every interested listener; returns how many received it
    pub fn publish(&mut self, message: &Message) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, listener) in &self.listeners {
            if !listener.wants(message) {
                continue;
            }
            if listener.sender.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*id);
            }
        }

        for id in closed {
            debug!(listener = %id, "Pruning listener with a closed receiver");
            self.listeners.remove(&id);
        }

        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.listeners
            .iter()
            .flat_map(|(id, listener)| {
                listener.topics.iter().map(move |topic| Subscription {
                    listener: *id,
                    topic: *topic,
                })
            })
            .collect()
    }
}
