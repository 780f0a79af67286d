//! In-process link between the client and the companion.
//!
//! ```text
//!  client                         link task                  companion task
//!  DeliveryService ──frame──▶ latency, maybe fail ──record──▶ Companion::handle
//!        ▲                          │                              │
//!        └────── outcome ───────────┘                   ResponseLink (retries)
//!  Dispatcher ◀──────────────────── frame ─────────────────────────┤
//!  on_inbound_dropped ◀──────────── lost attempt ──────────────────┘
//! ```
//!
//! Outbound frames pass through a capacity-one channel so only one can be
//! pending at a time. Outcomes are reported back through their own channel,
//! never from inside [`Transport::submit`]. Responses are sent one at a time,
//! each with up to [`MAX_RESPONSE_ATTEMPTS`] tries.

use std::{sync::Arc, time::Duration};

use asynchronous_codec::{Decoder, Encoder};
use bytes::{Bytes, BytesMut};
use eyre::{Result, bail};
use pericope_browser::SharedOutbox;
use pericope_companion::{Companion, VerseSource};
use pericope_delivery::{
    DeliveryHandle, DeliveryService, Dispatcher, FailureReason, SubmitError, Transport,
};
use pericope_wire::{CorrelationToken, DictionaryCodec, Request, WireError, WireRecord, decode};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinSet,
    time::sleep,
};
use tracing::{debug, trace, warn};

use crate::config::{AppConfig, LinkConfig};

/// Idle periods to wait for the companion before giving up.
const MAX_IDLE_ROUNDS: usize = 40;

/// Tries the companion makes at sending one response before giving up on it.
const MAX_RESPONSE_ATTEMPTS: u8 = 3;

/// What became of one outbound transmission.
#[derive(Debug)]
enum Outcome {
    Delivered,
    Failed(FailureReason),
}

/// Client side of the link.
#[derive(Debug)]
pub(crate) struct LinkTransport {
    codec: DictionaryCodec,
    frames: mpsc::Sender<Bytes>,
}

impl Transport for LinkTransport {
    fn submit(&mut self, record: WireRecord) -> Result<(), SubmitError> {
        let mut frame = BytesMut::new();
        self.codec.encode(record, &mut frame)?;
        self.frames
            .try_send(frame.freeze())
            .map_err(|error| match error {
                TrySendError::Full(_) => SubmitError::Busy,
                TrySendError::Closed(_) => SubmitError::Closed,
            })
    }
}

/// A running client, link and companion.
pub(crate) struct Session {
    handle: DeliveryHandle<LinkTransport>,
    outcomes: mpsc::UnboundedReceiver<Outcome>,
    inbound: mpsc::UnboundedReceiver<Bytes>,
    dropped: mpsc::UnboundedReceiver<FailureReason>,
    /// Inbound payloads lost or rejected so far.
    inbound_dropped: usize,
    codec: DictionaryCodec,
    idle: Duration,
    tasks: JoinSet<()>,
}

impl Session {
    /// Spawn the link and companion tasks and build the client side.
    pub(crate) fn start<S>(config: &AppConfig, companion: Companion<S>) -> Self
    where
        S: VerseSource + Send + 'static,
    {
        let (frames_tx, frames_rx) = mpsc::channel(1);
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (dropped_tx, dropped_rx) = mpsc::unbounded_channel();

        let mut tasks = JoinSet::new();
        tasks.spawn(carry_outbound(
            frames_rx,
            outcomes_tx,
            requests_tx,
            config.link.clone(),
            DictionaryCodec::new(config.delivery.outbound_buffer_size),
        ));
        let responses = ResponseLink {
            frames: inbound_tx,
            dropped: dropped_tx,
            // Offset so the two directions do not roll the same sequence.
            rng: link_rng(config.link.seed.map(|seed| seed.wrapping_add(1))),
            failure_rate: config.link.clamped_inbound_failure_rate(),
            retry_delay: config.link.retry_delay(),
        };
        tasks.spawn(serve(
            companion,
            requests_rx,
            responses,
            config.link.latency(),
            DictionaryCodec::new(config.delivery.inbound_buffer_size),
        ));

        let transport = LinkTransport {
            codec: DictionaryCodec::new(config.delivery.outbound_buffer_size),
            frames: frames_tx,
        };
        let handle = DeliveryHandle::new(DeliveryService::new(&config.delivery, transport));

        Self {
            handle,
            outcomes: outcomes_rx,
            inbound: inbound_rx,
            dropped: dropped_rx,
            inbound_dropped: 0,
            codec: DictionaryCodec::new(config.delivery.inbound_buffer_size),
            idle: config.link.idle_timeout(),
            tasks,
        }
    }

    pub(crate) fn outbox(&self) -> SharedOutbox {
        Arc::new(self.handle.clone())
    }

    /// Dispatcher with the ready signal wired to this session's gate.
    pub(crate) fn dispatcher(&self) -> Dispatcher {
        Dispatcher::for_handle(&self.handle)
    }

    /// Process link events until nothing is left to send and the link has
    /// been quiet for the idle period.
    pub(crate) async fn run_until_idle(&mut self, dispatcher: &mut Dispatcher) -> Result<()> {
        let mut idle_rounds = 0;
        loop {
            tokio::select! {
                outcome = self.outcomes.recv() => {
                    idle_rounds = 0;
                    match outcome {
                        Some(Outcome::Delivered) => self.handle.on_delivered(),
                        Some(Outcome::Failed(reason)) => self.handle.on_failed(reason),
                        None => bail!("link closed"),
                    }
                }
                frame = self.inbound.recv() => {
                    idle_rounds = 0;
                    match frame {
                        Some(frame) => self.receive(frame, dispatcher),
                        None => bail!("companion closed"),
                    }
                }
                reason = self.dropped.recv() => {
                    idle_rounds = 0;
                    match reason {
                        Some(reason) => self.drop_inbound(reason),
                        None => bail!("companion closed"),
                    }
                }
                _ = sleep(self.idle) => {
                    if self.handle.is_open() && self.handle.queue_len() == 0 && !self.handle.is_sending() {
                        return Ok(());
                    }
                    idle_rounds += 1;
                    if idle_rounds >= MAX_IDLE_ROUNDS {
                        bail!("timed out waiting for the companion");
                    }
                }
            }
        }
    }

    /// Inbound payloads lost on the link or rejected on arrival.
    pub(crate) fn inbound_dropped(&self) -> usize {
        self.inbound_dropped
    }

    /// Stop the link and companion tasks.
    pub(crate) async fn shutdown(mut self) {
        self.tasks.shutdown().await;
    }

    fn receive(&mut self, frame: Bytes, dispatcher: &mut Dispatcher) {
        let mut src = BytesMut::from(frame.as_ref());
        match self.codec.decode(&mut src) {
            Ok(Some(record)) => {
                let outcome = dispatcher.dispatch(&record);
                trace!(?outcome, "Dispatched inbound payload");
            }
            Ok(None) => self.drop_inbound(FailureReason::Rejected),
            Err(WireError::TooLarge { .. }) => self.drop_inbound(FailureReason::BufferOverflow),
            Err(error) => {
                debug!(%error, "Malformed inbound frame");
                self.drop_inbound(FailureReason::Rejected);
            }
        }
    }

    fn drop_inbound(&mut self, reason: FailureReason) {
        self.inbound_dropped += 1;
        self.handle.on_inbound_dropped(reason);
    }
}

fn link_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Companion side of the link back to the client.
struct ResponseLink {
    frames: mpsc::UnboundedSender<Bytes>,
    /// Tells the client an attempt was lost.
    dropped: mpsc::UnboundedSender<FailureReason>,
    rng: StdRng,
    failure_rate: f64,
    retry_delay: Duration,
}

impl ResponseLink {
    /// Send `frame`, retrying lost attempts after the retry delay. A frame
    /// still lost after [`MAX_RESPONSE_ATTEMPTS`] tries is given up on.
    ///
    /// Returns `false` once the client side is gone.
    async fn send(&mut self, frame: Bytes, token: Option<CorrelationToken>) -> bool {
        for attempt in 1..=MAX_RESPONSE_ATTEMPTS {
            if !self.rng.random_bool(self.failure_rate) {
                return self.frames.send(frame).is_ok();
            }
            debug!(?token, attempt, "Response lost on the link");
            if self.dropped.send(FailureReason::Timeout).is_err() {
                return false;
            }
            if attempt < MAX_RESPONSE_ATTEMPTS {
                sleep(self.retry_delay).await;
            }
        }
        warn!(?token, attempts = MAX_RESPONSE_ATTEMPTS, "Giving up on response");
        true
    }
}

/// Carry outbound frames to the companion, failing some of them.
async fn carry_outbound(
    mut frames: mpsc::Receiver<Bytes>,
    outcomes: mpsc::UnboundedSender<Outcome>,
    requests: mpsc::UnboundedSender<WireRecord>,
    config: LinkConfig,
    mut codec: DictionaryCodec,
) {
    let mut rng = link_rng(config.seed);
    let failure_rate = config.clamped_failure_rate();

    while let Some(frame) = frames.recv().await {
        sleep(config.latency()).await;

        let outcome = if rng.random_bool(failure_rate) {
            Outcome::Failed(FailureReason::Timeout)
        } else {
            match codec.decode(&mut BytesMut::from(frame.as_ref())) {
                Ok(Some(record)) => {
                    if requests.send(record).is_err() {
                        return;
                    }
                    Outcome::Delivered
                }
                Ok(None) => Outcome::Failed(FailureReason::Rejected),
                Err(error) => {
                    warn!(%error, "Companion rejected frame");
                    Outcome::Failed(FailureReason::Rejected)
                }
            }
        };
        trace!(?outcome, "Transmission finished");

        if outcomes.send(outcome).is_err() {
            return;
        }
    }
}

/// Run the companion: answer requests and stream responses back one at a
/// time, letting new requests such as a cancel cut in between responses.
async fn serve<S: VerseSource>(
    mut companion: Companion<S>,
    mut requests: mpsc::UnboundedReceiver<WireRecord>,
    mut responses: ResponseLink,
    latency: Duration,
    mut codec: DictionaryCodec,
) {
    companion.announce_ready();

    loop {
        tokio::select! {
            biased;

            request = requests.recv() => {
                let Some(record) = request else {
                    return;
                };
                match Request::try_from(&decode(&record)) {
                    Ok(request) => companion.handle(request),
                    Err(error) => warn!(%error, "Ignoring malformed request"),
                }
            }
            _ = sleep(latency), if companion.pending() > 0 => {
                let Some(response) = companion.next_response() else {
                    continue;
                };
                let mut frame = BytesMut::new();
                if let Err(error) = codec.encode(response.encode(), &mut frame) {
                    warn!(%error, "Dropping response that does not fit the link");
                    continue;
                }
                if !responses.send(frame.freeze(), response.token()).await {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pericope_browser::Viewer;
    use pericope_companion::{FavoriteStore, StaticVerseSource};
    use pericope_wire::Passage;

    use super::*;

    fn session(failure_rate: f64, inbound_failure_rate: f64) -> Session {
        let config = AppConfig {
            link: LinkConfig {
                failure_rate,
                inbound_failure_rate,
                latency_ms: 1,
                retry_delay_ms: 2,
                seed: Some(7),
            },
            ..Default::default()
        };
        let companion = Companion::new(StaticVerseSource::sample(), FavoriteStore::new());
        Session::start(&config, companion)
    }

    #[tokio::test]
    async fn test_read_passage_over_link() {
        let mut session = session(0.0, 0.0);
        let viewer = Arc::new(Mutex::new(Viewer::new(
            session.outbox(),
            Passage::new("John", 11, "35-36"),
        )));
        let mut dispatcher = session.dispatcher().with_viewer_handler(Arc::clone(&viewer));

        viewer.lock().load();
        session.run_until_idle(&mut dispatcher).await.unwrap();

        assert_eq!(
            viewer.lock().text(),
            "35) Jesus wept. 36) Then said the Jews, Behold how he loved him! "
        );
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_dead_link_drops_request() {
        let mut session = session(1.0, 0.0);
        let viewer = Arc::new(Mutex::new(Viewer::new(
            session.outbox(),
            Passage::new("John", 11, "35-36"),
        )));
        let mut dispatcher = session.dispatcher().with_viewer_handler(Arc::clone(&viewer));

        viewer.lock().load();
        session.run_until_idle(&mut dispatcher).await.unwrap();

        assert!(viewer.lock().is_loading());
        assert_eq!(session.handle.queue_len(), 0);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_lost_responses_leave_viewer_loading() {
        let mut session = session(0.0, 1.0);
        let viewer = Arc::new(Mutex::new(Viewer::new(
            session.outbox(),
            Passage::new("John", 11, "35-36"),
        )));
        let mut dispatcher = session.dispatcher().with_viewer_handler(Arc::clone(&viewer));

        // The ready announcement is lost too, so open the gate directly.
        viewer.lock().load();
        session.handle.open();
        session.run_until_idle(&mut dispatcher).await.unwrap();

        assert!(viewer.lock().is_loading());
        assert_eq!(session.handle.queue_len(), 0);
        // Three tries at the ready announcement, three at the single chunk.
        assert_eq!(session.inbound_dropped(), 2 * usize::from(MAX_RESPONSE_ATTEMPTS));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_response_link_retries_then_gives_up() {
        let (frames, mut frames_rx) = mpsc::unbounded_channel();
        let (dropped, mut dropped_rx) = mpsc::unbounded_channel();
        let mut link = ResponseLink {
            frames,
            dropped,
            rng: link_rng(Some(1)),
            failure_rate: 1.0,
            retry_delay: Duration::from_millis(1),
        };

        assert!(link.send(Bytes::from_static(b"lost"), None).await);
        assert!(frames_rx.try_recv().is_err());
        let mut lost = 0;
        while dropped_rx.try_recv().is_ok() {
            lost += 1;
        }
        assert_eq!(lost, MAX_RESPONSE_ATTEMPTS);

        link.failure_rate = 0.0;
        assert!(link.send(Bytes::from_static(b"kept"), None).await);
        assert_eq!(frames_rx.try_recv().unwrap(), Bytes::from_static(b"kept"));
    }
}
