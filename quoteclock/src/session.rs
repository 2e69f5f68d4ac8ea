//! Session - the single event loop that drives a DisplayController
//!
//! Language changes, minute ticks and load completions all arrive on one mpsc
//! channel and are handled one at a time by the session task, so no two
//! recomputations ever overlap. Views observe the result through a `watch`
//! channel of immutable `Snapshot`s.
//!
//! Cancellation Architecture:
//! The session and its ticker share a `CancellationToken`. Cancelling it (or
//! dropping every `SessionHandle`) stops the ticker and ends the loop. Resource
//! loads in flight are not aborted; when they finish they only fill the store's
//! cache and post `Loaded`, which the controller ignores for a deselected language.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::delay_until_next_boundary;
use crate::controller::DisplayController;
use crate::interface::{Clock, ClockError, Language, Snapshot};

/// Inputs to the session loop
#[derive(Debug, Clone, PartialEq)]
pub enum ClockEvent {
    SelectLanguage(Language),
    Tick(DateTime<Utc>),
    Loaded(Language),
}

/// Spawn a self-rescheduling minute ticker.
///
/// Each firing sleeps exactly until the next wall-clock minute, computed fresh
/// from the clock, then posts `Tick`. Execution latency therefore never
/// accumulates. Stops when `token` is cancelled or the receiver is gone.
pub fn spawn_minute_ticker(
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<ClockEvent>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = delay_until_next_boundary(clock.now());
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            if events.send(ClockEvent::Tick(clock.now())).is_err() {
                break;
            }
        }
        tracing::debug!("minute ticker stopped");
    })
}

struct Session {
    controller: DisplayController,
    clock: Arc<dyn Clock>,
    events_tx: mpsc::UnboundedSender<ClockEvent>,
    events_rx: mpsc::UnboundedReceiver<ClockEvent>,
    snapshots: watch::Sender<Snapshot>,
    token: CancellationToken,
}

impl Session {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                _ = self.token.cancelled() => None,
                event = self.events_rx.recv() => event,
            };
            match event {
                Some(event) => self.handle(event),
                None => break,
            }
        }
        tracing::debug!("session loop stopped");
    }

    fn handle(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::SelectLanguage(language) => {
                match self.controller.begin_language(language.clone(), self.clock.now()) {
                    Ok(needs_load) => {
                        if needs_load {
                            self.spawn_load(language);
                        }
                        self.publish();
                    }
                    Err(e) => tracing::warn!(error = %e, "language change rejected"),
                }
            }
            ClockEvent::Tick(now) => {
                if self.controller.tick(now) {
                    self.publish();
                }
            }
            ClockEvent::Loaded(language) => {
                if self.controller.finish_loading(&language, self.clock.now()) {
                    self.publish();
                }
            }
        }
    }

    fn spawn_load(&self, language: Language) {
        let store = Arc::clone(self.controller.store());
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            store.ensure_loaded(&language).await;
            // The session may be gone by now; the cache is filled either way
            let _ = events.send(ClockEvent::Loaded(language));
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

/// Handle to a running session, held by the view
pub struct SessionHandle {
    events: mpsc::UnboundedSender<ClockEvent>,
    snapshots: watch::Receiver<Snapshot>,
    languages: Vec<Language>,
    token: CancellationToken,
    session_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a session showing `initial_language`, with a minute ticker driven by `clock`.
    /// Must be called from within a tokio runtime.
    pub fn spawn(controller: DisplayController, clock: Arc<dyn Clock>, initial_language: Language) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(controller.snapshot());
        let token = CancellationToken::new();
        let languages = controller.languages().to_vec();

        // Queued before the ticker starts, so it is handled first
        let _ = events_tx.send(ClockEvent::SelectLanguage(initial_language));

        let ticker_task = spawn_minute_ticker(clock.clone(), events_tx.clone(), token.child_token());
        let session = Session {
            controller,
            clock,
            events_tx: events_tx.clone(),
            events_rx,
            snapshots: snapshots_tx,
            token: token.clone(),
        };
        let session_task = tokio::spawn(session.run());

        Self {
            events: events_tx,
            snapshots: snapshots_rx,
            languages,
            token,
            session_task: Some(session_task),
            ticker_task: Some(ticker_task),
        }
    }

    /// The languages a viewer may choose from
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Request a language change. Unsupported languages are rejected here.
    pub fn select_language(&self, language: Language) -> Result<(), ClockError> {
        if !self.languages.contains(&language) {
            return Err(ClockError::UnsupportedLanguage(language));
        }
        self.send(ClockEvent::SelectLanguage(language))
    }

    /// Deliver a tick out of band, e.g. after the host wakes from sleep
    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), ClockError> {
        self.send(ClockEvent::Tick(now))
    }

    fn send(&self, event: ClockEvent) -> Result<(), ClockError> {
        self.events.send(event).map_err(|_| ClockError::SessionClosed)
    }

    /// The latest snapshot
    pub fn current(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that wakes whenever a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the ticker and the loop, and wait for both to finish
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(ticker) = self.ticker_task.take() {
            let _ = ticker.await;
        }
        if let Some(session) = self.session_task.take() {
            let _ = session.await;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockZone, ManualClock};
    use crate::interface::Phase;
    use crate::loader::StaticLoader;
    use crate::selection::FirstSelector;
    use crate::store::QuoteStore;
    use chrono::TimeZone;
    use std::time::Duration;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 15, 10).unwrap()
    }

    fn controller() -> DisplayController {
        let loader = StaticLoader::new()
            .with_resource(
                "en/quotes.csv",
                "09:15|=|9:15|=|At 9:15 the train left.|=|Platform|=|R. Hale\n09:16|=|9:16|=|At 9:16 it rained.|=|Weather|=|S. Lowe",
            )
            .with_resource("en/messages.json", r#"{"NO_QUOTE_FOUND": "none"}"#);
        let store = Arc::new(QuoteStore::new(Arc::new(loader), Box::new(FirstSelector)));
        DisplayController::new(store, ClockZone::Utc, vec![Language::from("en"), Language::from("pt")])
    }

    #[tokio::test]
    async fn test_session_loads_initial_language() {
        let clock = Arc::new(ManualClock::new(start()));
        let handle = SessionHandle::spawn(controller(), clock, Language::from("en"));

        let mut rx = handle.subscribe();
        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.phase == Phase::Ready),
        )
        .await
        .expect("session should become ready")
        .unwrap()
        .clone();

        assert_eq!(snapshot.display.author, "R. Hale");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_session_tick_advances_quote() {
        let clock = Arc::new(ManualClock::new(start()));
        let handle = SessionHandle::spawn(controller(), clock.clone(), Language::from("en"));
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.phase == Phase::Ready))
            .await
            .unwrap()
            .unwrap();

        clock.advance(chrono::Duration::minutes(1));
        handle.tick(clock.now()).unwrap();

        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.display.author == "S. Lowe"),
        )
        .await
        .expect("tick should publish the next quote")
        .unwrap()
        .clone();
        assert_eq!(snapshot.language, Some(Language::from("en")));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_select_unsupported_language_is_rejected() {
        let clock = Arc::new(ManualClock::new(start()));
        let handle = SessionHandle::spawn(controller(), clock, Language::from("en"));
        assert!(matches!(
            handle.select_language(Language::from("fr")),
            Err(ClockError::UnsupportedLanguage(_))
        ));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_ticker_stops_on_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let ticker = spawn_minute_ticker(Arc::new(ManualClock::new(start())), tx, token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), ticker)
            .await
            .expect("ticker should stop promptly")
            .unwrap();
        assert!(rx.try_recv().is_err(), "no tick is sent after cancellation");
    }

    #[tokio::test]
    async fn test_ticker_fires_at_boundary() {
        // 59.9s into the minute: the first tick is due in 100ms
        let almost = Utc.with_ymd_and_hms(2024, 5, 1, 9, 15, 59).unwrap() + chrono::Duration::milliseconds(900);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let ticker = spawn_minute_ticker(Arc::new(ManualClock::new(almost)), tx, token.clone());

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick should arrive after ~100ms")
            .unwrap();
        assert_eq!(event, ClockEvent::Tick(almost));

        token.cancel();
        let _ = ticker.await;
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let clock = Arc::new(ManualClock::new(start()));
        let handle = SessionHandle::spawn(controller(), clock, Language::from("en"));
        let events = handle.events.clone();
        handle.shutdown().await;
        assert!(events.send(ClockEvent::Tick(start())).is_err());
    }
}
