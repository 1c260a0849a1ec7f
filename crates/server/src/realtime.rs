//! Realtime fan-out of book events.
//!
//! Every book is a room. A WebSocket connection joins the room of the book it
//! watches and receives the serialized events through a bounded outbox. A
//! connection whose outbox is full or closed is dropped from the room; other
//! subscribers are unaffected.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use engine::BookEvent;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Frames buffered per connection before it is considered too slow.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

type Outbox = mpsc::Sender<Arc<str>>;

#[derive(Debug)]
pub struct Hub {
    rooms: RwLock<HashMap<Uuid, HashMap<u64, Outbox>>>,
    next_connection: AtomicU64,
    outbox_capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::with_outbox_capacity(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outbox_capacity(outbox_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Register a new connection in `room`.
    pub fn join(self: &Arc<Self>, room: Uuid) -> Subscription {
        let connection_id = self.next_connection.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.outbox_capacity);
        self.rooms
            .write()
            .entry(room)
            .or_default()
            .insert(connection_id, sender);
        tracing::debug!(room = %room, connection_id, "connection joined room");
        Subscription {
            hub: Arc::clone(self),
            room,
            connection_id,
            receiver,
        }
    }

    /// Unregister a connection. Empty rooms are removed.
    pub fn leave(&self, room: Uuid, connection_id: u64) {
        let mut rooms = self.rooms.write();
        if let Some(connections) = rooms.get_mut(&room) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                rooms.remove(&room);
            }
        }
    }

    /// Push an event to every connection in `room`, returning how many accepted it.
    pub fn broadcast(&self, room: Uuid, event: &BookEvent) -> usize {
        let frame: Arc<str> = match event.to_json() {
            Ok(json) => Arc::from(json),
            Err(err) => {
                tracing::error!(room = %room, "failed to serialize event: {err}");
                return 0;
            }
        };

        let targets: Vec<(u64, Outbox)> = match self.rooms.read().get(&room) {
            Some(connections) => connections
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dropped = Vec::new();
        for (connection_id, sender) in targets {
            match sender.try_send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(_) => dropped.push(connection_id),
            }
        }
        for connection_id in dropped {
            tracing::warn!(room = %room, connection_id, "dropping slow or closed connection");
            self.leave(room, connection_id);
        }
        delivered
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn subscriber_count(&self, room: Uuid) -> usize {
        self.rooms.read().get(&room).map_or(0, HashMap::len)
    }
}

/// A connection's membership in a room. Dropping it leaves the room.
#[derive(Debug)]
pub struct Subscription {
    hub: Arc<Hub>,
    room: Uuid,
    connection_id: u64,
    receiver: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    pub fn room(&self) -> Uuid {
        self.room
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Next frame, or `None` once the hub dropped this connection.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.leave(self.room, self.connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: Uuid) -> BookEvent {
        BookEvent::BookCreated { id }
    }

    #[tokio::test]
    async fn broadcast_reaches_only_the_room() {
        let hub = Arc::new(Hub::new());
        let room = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut first = hub.join(room);
        let mut second = hub.join(room);
        let mut outsider = hub.join(other);

        assert_eq!(hub.broadcast(room, &event(room)), 2);

        let frame = first.recv().await.unwrap();
        assert!(frame.contains("book.created"));
        assert_eq!(second.recv().await.unwrap(), frame);
        assert!(outsider.receiver.try_recv().is_err());
    }

    #[test]
    fn dropping_subscription_leaves_and_removes_empty_room() {
        let hub = Arc::new(Hub::new());
        let room = Uuid::new_v4();
        let first = hub.join(room);
        let second = hub.join(room);
        assert_eq!(hub.room_count(), 1);
        assert_eq!(hub.subscriber_count(room), 2);

        drop(first);
        assert_eq!(hub.subscriber_count(room), 1);
        drop(second);
        assert_eq!(hub.subscriber_count(room), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn full_outbox_drops_only_that_connection() {
        let hub = Arc::new(Hub::with_outbox_capacity(1));
        let room = Uuid::new_v4();
        let _slow = hub.join(room);
        let mut fast = hub.join(room);

        assert_eq!(hub.broadcast(room, &event(room)), 2);
        assert!(fast.receiver.try_recv().is_ok());

        // The slow connection never drained its single slot.
        assert_eq!(hub.broadcast(room, &event(room)), 1);
        assert_eq!(hub.subscriber_count(room), 1);
        assert!(fast.receiver.try_recv().is_ok());
    }

    #[test]
    fn broadcast_to_empty_room_is_noop() {
        let hub = Hub::new();
        assert_eq!(hub.broadcast(Uuid::new_v4(), &event(Uuid::new_v4())), 0);
        assert_eq!(hub.room_count(), 0);
    }
}
