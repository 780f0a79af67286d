//! FIFO of pending requests.

use std::collections::VecDeque;

use pericope_wire::Request;

/// One pending request and the number of times it has been submitted.
#[derive(Debug)]
pub struct QueueEntry {
    request: Request,
    attempts: u8,
}

impl QueueEntry {
    fn new(request: Request) -> Self {
        Self {
            request,
            attempts: 0,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Count one more submission and return the new total.
    pub(crate) fn record_attempt(&mut self) -> u8 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }
}

/// Ordered collection of pending requests.
///
/// Entries are never reordered or looked up by token. Only the head is ever
/// submitted, and an entry leaves the queue only from the head.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    entries: VecDeque<QueueEntry>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, request: Request) {
        self.entries.push_back(QueueEntry::new(request));
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub(crate) fn head_mut(&mut self) -> Option<&mut QueueEntry> {
        self.entries.front_mut()
    }

    pub(crate) fn pop_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
