use std::sync::Arc;

use parking_lot::Mutex;
use pericope_delivery::{
    DeliveryConfig, DeliveryHandle, DeliveryService, DispatchOutcome, Dispatcher, FailureReason,
    InboundHandler, MAX_ATTEMPTS, SubmitError, Transport, is_current,
};
use pericope_wire::{
    CorrelationToken, MessageType, PartialFields, Response, Testament, WireKey, WireRecord,
};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Records every accepted submission. Outcomes are reported by the test.
#[derive(Debug, Default)]
struct MockTransport {
    submitted: Vec<WireRecord>,
    refusals: usize,
}

impl MockTransport {
    fn tokens(&self) -> Vec<u32> {
        self.submitted
            .iter()
            .filter_map(|record| record.get(WireKey::Token).and_then(|value| value.as_uint()))
            .collect()
    }
}

impl Transport for MockTransport {
    fn submit(&mut self, record: WireRecord) -> Result<(), SubmitError> {
        if self.refusals > 0 {
            self.refusals -= 1;
            return Err(SubmitError::NoBuffer);
        }
        self.submitted.push(record);
        Ok(())
    }
}

fn service() -> DeliveryService<MockTransport> {
    init_tracing();
    DeliveryService::new(&DeliveryConfig::default(), MockTransport::default())
}

#[test]
fn gate_holds_until_open() {
    let mut service = service();
    service.request_books(Testament::Old);

    assert_eq!(service.queue_len(), 1);
    assert!(service.transport().submitted.is_empty());

    service.open();
    assert_eq!(service.transport().submitted.len(), 1);
}

#[test]
fn three_failures_drop_the_request() {
    let mut service = service();
    service.open();
    let first = service.request_favorites();

    for attempt in 1..=MAX_ATTEMPTS {
        assert_eq!(service.head_attempts(), Some(attempt));
        service.on_failed(FailureReason::Timeout);
    }

    assert_eq!(service.queue_len(), 0);
    assert_eq!(service.transport().tokens(), vec![first.get(); 3]);

    let second = service.request_books(Testament::New);
    assert_eq!(service.transport().submitted.len(), 4);
    assert_eq!(service.transport().tokens().last(), Some(&second.get()));
}

#[test]
fn failure_then_success() {
    let mut service = service();
    service.open();
    service.request_verse_ranges("Genesis", 1);

    service.on_failed(FailureReason::Busy);
    assert_eq!(service.head_attempts(), Some(2));
    service.on_delivered();

    assert_eq!(service.queue_len(), 0);
    assert_eq!(service.transport().submitted.len(), 2);
    assert!(!service.is_sending());
}

#[test]
fn fifo_one_in_flight() {
    let mut service = service();
    let t1 = service.request_books(Testament::Old);
    let t2 = service.request_books(Testament::New);

    service.open();
    assert_eq!(service.transport().tokens(), vec![t1.get()]);

    service.on_delivered();
    assert_eq!(service.transport().tokens(), vec![t1.get(), t2.get()]);
}

#[derive(Debug, Default)]
struct LastIssued {
    expected: Option<CorrelationToken>,
    accepted: Vec<PartialFields>,
}

impl InboundHandler for LastIssued {
    fn on_payload(&mut self, fields: &PartialFields) {
        if !is_current(fields.token, self.expected) {
            return;
        }
        self.accepted.push(fields.clone());
    }
}

#[test]
fn stale_token_is_ignored() {
    let handler = Arc::new(Mutex::new(LastIssued {
        expected: Some(CorrelationToken::new(1)),
        ..Default::default()
    }));
    let mut dispatcher = Dispatcher::new(|| {}).with_books_handler(Arc::clone(&handler));

    let stale = Response::BookEntry {
        token: CorrelationToken::new(2),
        index: 0,
        name: "Genesis".into(),
        chapters: 50,
    };
    assert_eq!(
        dispatcher.dispatch(&stale.encode()),
        DispatchOutcome::Routed(MessageType::Book)
    );
    assert!(handler.lock().accepted.is_empty());
}

#[test]
fn unknown_category_is_dropped() {
    let handler = Arc::new(Mutex::new(LastIssued::default()));
    let mut dispatcher = Dispatcher::new(|| {})
        .with_books_handler(Arc::clone(&handler))
        .with_verses_handler(Arc::clone(&handler));

    let record = WireRecord::new()
        .with(WireKey::MessageType, 99u32)
        .with(WireKey::Token, 1u32);
    assert_eq!(
        dispatcher.dispatch(&record),
        DispatchOutcome::UnknownDiscriminant(99)
    );
    assert!(handler.lock().accepted.is_empty());
}

#[test]
fn open_twice_is_open_once() {
    let mut service = service();
    service.request_favorites();
    service.open();
    service.open();
    assert_eq!(service.transport().submitted.len(), 1);
    assert_eq!(service.head_attempts(), Some(1));
}

#[test]
fn ready_signal_opens_the_gate() {
    init_tracing();
    let handle = DeliveryHandle::new(DeliveryService::new(
        &DeliveryConfig::default(),
        MockTransport::default(),
    ));
    let mut dispatcher = Dispatcher::for_handle(&handle);

    handle.with(|service| service.request_favorites());
    assert!(!handle.is_sending());

    dispatcher.dispatch(&Response::PeerReady.encode());
    assert!(handle.is_open());
    assert!(handle.is_sending());
    assert_eq!(handle.with(|service| service.transport().submitted.len()), 1);
}

#[test]
fn refusals_mix_with_async_failures() {
    let mut service = service();
    service.transport_mut().refusals = 1;
    service.open();
    service.request_favorites();

    // Refused once, then accepted on the second attempt.
    assert_eq!(service.head_attempts(), Some(2));
    assert!(service.is_sending());

    // One attempt left: resubmitted as the third.
    service.on_failed(FailureReason::Timeout);
    assert_eq!(service.head_attempts(), Some(3));
    assert_eq!(service.queue_len(), 1);
    assert_eq!(service.transport().submitted.len(), 2);
    assert!(service.is_sending());

    service.on_failed(FailureReason::Timeout);
    assert_eq!(service.queue_len(), 0);
    assert_eq!(service.transport().submitted.len(), 2);
    assert!(!service.is_sending());
}

#[derive(Debug, Clone)]
enum Op {
    Enqueue,
    Open,
    Delivered,
    Failed,
    Refuse,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Enqueue),
        1 => Just(Op::Open),
        2 => Just(Op::Delivered),
        3 => Just(Op::Failed),
        1 => Just(Op::Refuse),
    ]
}

proptest! {
    #[test]
    fn send_cycle_invariants(ops in proptest::collection::vec(op(), 0..64)) {
        let mut service =
            DeliveryService::new(&DeliveryConfig::default(), MockTransport::default());
        let mut issued = Vec::new();

        for op in ops {
            let submitted_before = service.transport().submitted.len();
            let in_flight_before = service.is_sending();
            match op {
                Op::Enqueue => issued.push(service.request_favorites().get()),
                Op::Open => service.open(),
                Op::Delivered => service.on_delivered(),
                Op::Failed => service.on_failed(FailureReason::Timeout),
                Op::Refuse => service.transport_mut().refusals += 1,
            }

            if !service.is_open() {
                prop_assert!(service.transport().submitted.is_empty());
            }
            // At most one new acceptance per event, none while one was pending.
            let accepted = service.transport().submitted.len() - submitted_before;
            prop_assert!(accepted <= 1);
            if in_flight_before && matches!(op, Op::Enqueue | Op::Open | Op::Refuse) {
                prop_assert_eq!(accepted, 0);
            }
            for entry in service.queue().iter() {
                prop_assert!(entry.attempts() <= MAX_ATTEMPTS);
            }
        }

        // Submissions never go back to an earlier request.
        let tokens = service.transport().tokens();
        prop_assert!(tokens.windows(2).all(|pair| pair[0] <= pair[1]));
        // Every submitted token was issued, in issue order.
        let remaining: Vec<_> = service
            .queue()
            .iter()
            .map(|entry| entry.request().token().get())
            .collect();
        prop_assert!(issued.ends_with(&remaining));
    }
}
