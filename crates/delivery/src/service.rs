//! The send cycle.

use pericope_wire::{CorrelationToken, Passage, Request, Testament};
use tracing::{debug, info, trace, warn};

use crate::{
    DeliveryConfig, FailureReason, OutboundQueue, ReadinessGate, TokenAllocator, Transport,
    metrics::DeliveryMetrics,
};

/// How the in-flight head was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Failed,
}

/// Owns the outbound queue and keeps at most one request in flight.
///
/// Every entry point runs to completion before returning: an enqueue, the
/// gate opening or a transport outcome each re-enter the cycle, which then
/// submits the head if it can. Outcomes arrive through
/// [`on_delivered`](Self::on_delivered) and [`on_failed`](Self::on_failed).
#[derive(Debug)]
pub struct DeliveryService<T> {
    transport: T,
    tokens: TokenAllocator,
    gate: ReadinessGate,
    queue: OutboundQueue,
    /// A submission was accepted and its outcome is pending.
    in_flight: bool,
    max_attempts: u8,
    metrics: DeliveryMetrics,
}

impl<T: Transport> DeliveryService<T> {
    pub fn new(config: &DeliveryConfig, transport: T) -> Self {
        Self {
            transport,
            tokens: TokenAllocator::new(config.token_strategy),
            gate: ReadinessGate::new(),
            queue: OutboundQueue::new(),
            in_flight: false,
            max_attempts: config.attempt_cap(),
            metrics: DeliveryMetrics::default(),
        }
    }

    /// Request the books of `testament`.
    pub fn request_books(&mut self, testament: Testament) -> CorrelationToken {
        let token = self.tokens.allocate();
        self.enqueue(Request::Books { token, testament })
    }

    /// Request the verse ranges of `chapter` in `book`.
    pub fn request_verse_ranges(&mut self, book: &str, chapter: u8) -> CorrelationToken {
        let token = self.tokens.allocate();
        self.enqueue(Request::VerseRanges {
            token,
            book: book.to_owned(),
            chapter,
        })
    }

    /// Request the text of a passage.
    pub fn request_viewer_content(
        &mut self,
        book: &str,
        chapter: u8,
        range: &str,
    ) -> CorrelationToken {
        let token = self.tokens.allocate();
        self.enqueue(Request::Viewer {
            token,
            passage: Passage::new(book, chapter, range),
        })
    }

    /// Request the favorites list.
    pub fn request_favorites(&mut self) -> CorrelationToken {
        let token = self.tokens.allocate();
        self.enqueue(Request::Favorites { token })
    }

    /// Add or remove a passage from the favorites.
    pub fn toggle_favorite(&mut self, book: &str, chapter: u8, range: &str) -> CorrelationToken {
        let token = self.tokens.allocate();
        self.enqueue(Request::ToggleFavorite {
            token,
            passage: Passage::new(book, chapter, range),
        })
    }

    /// Ask the companion to stop responding to `token`.
    ///
    /// Queued like any other request. Pending entries for the same token are
    /// left in place.
    pub fn cancel(&mut self, token: CorrelationToken) {
        self.enqueue(Request::Cancel { token });
    }

    /// Append a request and drive the cycle.
    pub fn enqueue(&mut self, request: Request) -> CorrelationToken {
        let token = request.token();
        let kind = request.kind();
        self.queue.push(request);
        self.metrics.inc_enqueued(self.queue.len());
        debug!(%token, %kind, depth = self.queue.len(), "Enqueued request");

        self.drive();
        token
    }

    /// The peer announced itself. Opens the gate and starts draining.
    ///
    /// Idempotent: later calls only re-enter the cycle.
    pub fn open(&mut self) {
        if self.gate.open() {
            info!(pending = self.queue.len(), "Peer ready, opening delivery gate");
        }
        self.drive();
    }

    /// Same as [`open`](Self::open).
    pub fn on_ready(&mut self) {
        self.open();
    }

    /// The transport delivered the in-flight request.
    pub fn on_delivered(&mut self) {
        if !self.take_in_flight("delivered") {
            return;
        }
        self.resolve(Outcome::Delivered);
        self.drive();
    }

    /// The transport failed to deliver the in-flight request.
    pub fn on_failed(&mut self, reason: FailureReason) {
        if !self.take_in_flight("failed") {
            return;
        }
        if let Some(head) = self.queue.head() {
            debug!(
                token = %head.request().token(),
                attempts = head.attempts(),
                %reason,
                "Delivery failed"
            );
        }
        self.resolve(Outcome::Failed);
        self.drive();
    }

    /// The transport dropped an inbound payload. Informational only.
    pub fn on_inbound_dropped(&self, reason: FailureReason) {
        debug!(%reason, "Inbound payload dropped by transport");
    }

    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    /// A submission is awaiting its outcome.
    pub fn is_sending(&self) -> bool {
        self.in_flight
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Attempts made on the current head, if any.
    pub fn head_attempts(&self) -> Option<u8> {
        self.queue.head().map(|entry| entry.attempts())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Clear the in-flight flag for an outcome. A stray outcome while idle is
    /// ignored.
    fn take_in_flight(&mut self, outcome: &'static str) -> bool {
        if !std::mem::replace(&mut self.in_flight, false) {
            warn!(outcome, "Ignoring transport outcome with nothing in flight");
            return false;
        }
        true
    }

    /// Apply an outcome to the head entry.
    fn resolve(&mut self, outcome: Outcome) {
        let Some(head) = self.queue.head() else {
            return;
        };
        let attempts = head.attempts();
        let exhausted = attempts >= self.max_attempts;

        match outcome {
            Outcome::Delivered => {
                if let Some(entry) = self.queue.pop_head() {
                    debug!(token = %entry.request().token(), attempts, "Request delivered");
                }
                self.metrics.inc_delivered(self.queue.len());
            }
            Outcome::Failed => {
                self.metrics.inc_failed_attempts();
                if exhausted {
                    if let Some(entry) = self.queue.pop_head() {
                        warn!(
                            token = %entry.request().token(),
                            kind = %entry.request().kind(),
                            attempts,
                            "Dropping request after exhausting attempts"
                        );
                    }
                    self.metrics.inc_dropped(self.queue.len());
                }
            }
        }
    }

    /// Submit the head while the gate is open and nothing is in flight.
    ///
    /// A refused submission is resolved as a failure immediately and the loop
    /// tries again with whatever is now at the head.
    fn drive(&mut self) {
        loop {
            if !self.gate.is_open() || self.in_flight {
                return;
            }
            let Some(head) = self.queue.head_mut() else {
                return;
            };

            let attempts = head.record_attempt();
            let token = head.request().token();
            let record = head.request().encode();
            if attempts > 1 {
                debug!(%token, attempts, "Resending request");
            } else {
                trace!(%token, "Sending request");
            }

            self.metrics.inc_submissions();
            match self.transport.submit(record) {
                Ok(()) => {
                    self.in_flight = true;
                    return;
                }
                Err(error) => {
                    warn!(%token, attempts, %error, "Transport refused submission");
                    self.metrics.inc_refused();
                    self.resolve(Outcome::Failed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pericope_wire::{WireKey, WireRecord};

    use super::*;
    use crate::SubmitError;

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Vec<WireRecord>,
        refuse: usize,
    }

    impl Transport for Recorder {
        fn submit(&mut self, record: WireRecord) -> Result<(), SubmitError> {
            if self.refuse > 0 {
                self.refuse -= 1;
                return Err(SubmitError::NoBuffer);
            }
            self.sent.push(record);
            Ok(())
        }
    }

    fn service() -> DeliveryService<Recorder> {
        DeliveryService::new(&DeliveryConfig::default(), Recorder::default())
    }

    #[test]
    fn test_holds_until_open() {
        let mut service = service();
        service.request_favorites();
        assert!(service.transport().sent.is_empty());
        assert!(!service.is_sending());

        service.open();
        assert_eq!(service.transport().sent.len(), 1);
        assert!(service.is_sending());
        assert_eq!(service.head_attempts(), Some(1));
    }

    #[test]
    fn test_refusals_exhaust_attempts_in_one_call() {
        let mut service = service();
        service.transport_mut().refuse = 3;
        service.open();
        service.request_favorites();

        assert_eq!(service.queue_len(), 0);
        assert!(service.transport().sent.is_empty());
        assert!(!service.is_sending());
    }

    #[test]
    fn test_refusal_then_next_request() {
        let mut service = service();
        service.request_favorites();
        let second = service.request_books(Testament::New);
        service.transport_mut().refuse = 3;
        service.open();

        // First request burned its three attempts, second went out.
        assert_eq!(service.transport().sent.len(), 1);
        let sent = &service.transport().sent[0];
        assert_eq!(
            sent.get(WireKey::Token).and_then(|value| value.as_uint()),
            Some(second.get())
        );
    }

    #[test]
    fn test_stray_outcome_is_ignored() {
        let mut service = service();
        service.request_favorites();
        service.on_delivered();
        service.on_failed(FailureReason::Timeout);
        assert_eq!(service.queue_len(), 1);
        assert_eq!(service.head_attempts(), Some(0));
    }

    #[test]
    fn test_cancel_reuses_token() {
        let mut service = service();
        let token = service.request_verse_ranges("Genesis", 1);
        service.cancel(token);
        let tokens: Vec<_> = service
            .queue()
            .iter()
            .map(|entry| entry.request().token())
            .collect();
        assert_eq!(tokens, vec![token, token]);
    }
}
