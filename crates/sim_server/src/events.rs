use crate::types::{EventCursor, ServerEvent};
use sim_core::Tick;
use std::collections::VecDeque;

/// Bounded event log read through cursors. When full, the oldest event is
/// dropped; readers that fell behind resume at the oldest one still kept.
pub struct EventBuffer<E> {
    events: VecDeque<ServerEvent<E>>,
    capacity: usize,
    next_sequence: u64,
}

impl<E: Clone> EventBuffer<E> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    pub fn push(&mut self, tick: Tick, event: E) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(ServerEvent {
            sequence: self.next_sequence,
            tick,
            event,
        });
        self.next_sequence += 1;
    }

    /// Events at or after `cursor`, and the cursor to continue from.
    pub fn get_from_cursor(&self, cursor: EventCursor) -> (Vec<ServerEvent<E>>, EventCursor) {
        let start = cursor.0.max(self.oldest_sequence());
        let skip = (start - self.oldest_sequence()) as usize;
        let events = self.events.iter().skip(skip).cloned().collect();
        (events, EventCursor(self.next_sequence))
    }

    /// Sequence number the next pushed event will get.
    pub fn current_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn oldest_sequence(&self) -> u64 {
        self.next_sequence - self.events.len() as u64
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
