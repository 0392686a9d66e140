//! # Message Bus
//!
//! Engine-wide event messaging over a bounded double buffer.
//!
//! Messages posted during a frame land in the *pending* buffer; polling
//! drains the *current* buffer and swaps the pending one in once it runs
//! dry. Payloads are small plain-old-data structs copied by value - a
//! message is a notification, never an owner of resources.
//!
//! The ECS core only ever *posts* to the bus (entity destruction).
//! Polling and dispatch belong to the caller:
//!
//! ```rust,ignore
//! while let Some(message) = world.message_bus_mut().poll() {
//!     world.forward_message(&message);
//! }
//! ```

use bytemuck::{Pod, Zeroable};

/// Maximum payload size of a single message, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 128;

/// Identifier distinguishing message types on the bus.
pub type MessageId = u32;

/// Well-known message identifiers.
pub mod id {
    use super::MessageId;

    /// Scene lifecycle traffic posted by the entity manager.
    pub const SCENE: MessageId = 0;

    /// First identifier available to application-defined messages.
    ///
    /// Extend the ID space from here:
    ///
    /// ```rust,ignore
    /// const ALIEN_EVENT: MessageId = id::USER;
    /// const BADGER_EVENT: MessageId = id::USER + 1;
    /// ```
    pub const USER: MessageId = 64;
}

/// Scene lifecycle event payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct SceneEvent {
    /// Raw index of the affected entity slot.
    ///
    /// A raw index, not a handle - reconstruct a live handle with the
    /// entity manager's `get_entity` if needed; the slot may already
    /// have been recycled by the time the message is read.
    pub entity_id: u32,
    /// Which lifecycle event occurred.
    pub event: u32,
}

impl SceneEvent {
    /// An entity was destroyed and its index returned to the free list.
    pub const ENTITY_DESTROYED: u32 = 0;
}

/// A single message: an identifier plus an opaque payload.
///
/// Messages are plain values (the payload is an inline byte array), so
/// a polled message stays usable while the bus is borrowed for further
/// posting.
#[derive(Clone, Copy, Debug)]
pub struct Message {
    id: MessageId,
    len: usize,
    data: [u8; MAX_MESSAGE_SIZE],
}

impl Message {
    /// Returns the message type identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Decodes the payload as `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T`'s size does not match the posted payload - reading
    /// a message as the wrong type is a logic error.
    #[must_use]
    pub fn data<T: Pod>(&self) -> T {
        assert!(
            std::mem::size_of::<T>() == self.len,
            "message payload read as the wrong type"
        );
        bytemuck::pod_read_unaligned(&self.data[..self.len])
    }
}

/// System-wide message bus for custom event messaging.
///
/// Bounded: each buffer holds at most the configured capacity and an
/// overflowing post is dropped with a warning - the bus is advisory, a
/// lost notification must never take the frame down.
pub struct MessageBus {
    current: Vec<Message>,
    pending: Vec<Message>,
    cursor: usize,
    capacity: usize,
    enabled: bool,
}

impl MessageBus {
    /// Creates a bus whose buffers hold `capacity` messages each.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "message bus capacity must be greater than zero");
        Self {
            current: Vec::with_capacity(capacity),
            pending: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
            enabled: true,
        }
    }

    /// Places a message on the pending buffer.
    ///
    /// Payload types should be small plain-old-data structs - trivially
    /// copyable data and raw indices, never owning handles.
    ///
    /// # Panics
    ///
    /// Panics if `T` exceeds [`MAX_MESSAGE_SIZE`].
    pub fn post<T: Pod>(&mut self, id: MessageId, payload: T) {
        if !self.enabled {
            return;
        }
        assert!(
            std::mem::size_of::<T>() <= MAX_MESSAGE_SIZE,
            "message payload limit is 128 bytes"
        );
        if self.pending.len() == self.capacity {
            tracing::warn!(id, "message bus full - dropping message");
            return;
        }

        let bytes = bytemuck::bytes_of(&payload);
        let mut data = [0u8; MAX_MESSAGE_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);
        self.pending.push(Message {
            id,
            len: bytes.len(),
            data,
        });
    }

    /// Reads the next message off the bus.
    ///
    /// Drains the current buffer; once exhausted the pending buffer is
    /// swapped in, so messages posted while polling are themselves
    /// delivered before the bus reads empty.
    pub fn poll(&mut self) -> Option<Message> {
        if self.cursor == self.current.len() {
            self.current.clear();
            std::mem::swap(&mut self.current, &mut self.pending);
            self.cursor = 0;
            if self.current.is_empty() {
                return None;
            }
        }
        let message = self.current[self.cursor];
        self.cursor += 1;
        Some(message)
    }

    /// Checks if there are no messages left on the bus.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor == self.current.len() && self.pending.is_empty()
    }

    /// Number of messages currently sitting on the bus.
    ///
    /// Useful for stat logging and debugging.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        (self.current.len() - self.cursor) + self.pending.len()
    }

    /// Disables the bus; subsequent posts are discarded.
    ///
    /// Used on shutdown so teardown-order destruction noise does not
    /// land on a bus nobody polls anymore.
    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Ping {
        value: u64,
    }

    const PING: MessageId = id::USER;

    #[test]
    fn test_post_poll_roundtrip() {
        let mut bus = MessageBus::new(8);
        assert!(bus.is_empty());

        bus.post(PING, Ping { value: 42 });
        assert!(!bus.is_empty());
        assert_eq!(bus.pending_count(), 1);

        let message = bus.poll().unwrap();
        assert_eq!(message.id(), PING);
        assert_eq!(message.data::<Ping>(), Ping { value: 42 });

        assert!(bus.poll().is_none());
        assert!(bus.is_empty());
    }

    #[test]
    fn test_messages_delivered_in_post_order() {
        let mut bus = MessageBus::new(8);
        for value in 0..5u64 {
            bus.post(PING, Ping { value });
        }
        for value in 0..5u64 {
            assert_eq!(bus.poll().unwrap().data::<Ping>(), Ping { value });
        }
        assert!(bus.poll().is_none());
    }

    #[test]
    fn test_posts_during_polling_are_delivered() {
        let mut bus = MessageBus::new(8);
        bus.post(PING, Ping { value: 1 });

        let first = bus.poll().unwrap();
        assert_eq!(first.data::<Ping>(), Ping { value: 1 });

        // a handler reacting to the first message posts another
        bus.post(PING, Ping { value: 2 });
        assert!(!bus.is_empty());
        assert_eq!(bus.poll().unwrap().data::<Ping>(), Ping { value: 2 });
        assert!(bus.poll().is_none());
    }

    #[test]
    fn test_overflow_drops_message() {
        let mut bus = MessageBus::new(2);
        bus.post(PING, Ping { value: 1 });
        bus.post(PING, Ping { value: 2 });
        bus.post(PING, Ping { value: 3 }); // dropped

        assert_eq!(bus.pending_count(), 2);
        assert_eq!(bus.poll().unwrap().data::<Ping>(), Ping { value: 1 });
        assert_eq!(bus.poll().unwrap().data::<Ping>(), Ping { value: 2 });
        assert!(bus.poll().is_none());
    }

    #[test]
    fn test_disabled_bus_discards_posts() {
        let mut bus = MessageBus::new(8);
        bus.disable();
        bus.post(PING, Ping { value: 9 });
        assert!(bus.is_empty());
    }

    #[test]
    #[should_panic(expected = "wrong type")]
    fn test_wrong_payload_type_is_fatal() {
        let mut bus = MessageBus::new(8);
        bus.post(PING, Ping { value: 3 });
        let message = bus.poll().unwrap();
        let _ = message.data::<u8>();
    }
}
