//! The message load controller.
//!
//! A single-mailbox actor owns the selection state machine; presentation
//! code talks to it through the cloneable [`MessageViewer`] handle and
//! observes [`DisplayState`] snapshots over a watch channel.
//!
//! Every `select` call bumps a generation counter, and only the loader
//! completion carrying the current generation may touch the published
//! state. Aborting the in-flight task is an optimization; correctness
//! rests on the generation comparison alone, so a loader that cannot be
//! interrupted is still handled: its late result is discarded.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::loader::MessageLoader;
use crate::model::display::DisplayState;
use crate::model::message::{MessageEntry, ParsedMessage};

/// A loader result tagged with the generation that requested it.
struct Completion {
    generation: u64,
    outcome: Result<ParsedMessage>,
}

/// Internal phase of the selection state machine. The generation inside
/// `Loading`/`Ready` ties the phase to the request that produced it; it is
/// never exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    Loading(u64),
    Ready(u64),
}

/// Handle to the viewer actor.
///
/// Cloneable and cheap; dropping the last handle shuts the actor down and
/// abandons any in-flight load.
#[derive(Clone)]
pub struct MessageViewer {
    cmd_tx: mpsc::UnboundedSender<Option<MessageEntry>>,
    state_rx: watch::Receiver<DisplayState>,
}

impl MessageViewer {
    /// Spawn the viewer actor on the ambient tokio runtime.
    ///
    /// The initial published snapshot is the cleared state.
    pub fn spawn(loader: Arc<dyn MessageLoader>, config: ViewerConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(DisplayState::default());

        let actor = Actor {
            loader,
            publish_loading: config.load.publish_loading,
            done_tx,
            state_tx,
            generation: 0,
            phase: Phase::Empty,
            in_flight: None,
        };
        tokio::spawn(actor.run(cmd_rx, done_rx));

        Self { cmd_tx, state_rx }
    }

    /// Request that `entry` become the displayed message, or clear the
    /// display with `None`.
    ///
    /// Returns immediately; the caller never blocks on the load and never
    /// sees a load failure (failures surface as a cleared snapshot).
    pub fn select(&self, entry: Option<MessageEntry>) {
        if self.cmd_tx.send(entry).is_err() {
            warn!("Selection dropped: viewer actor is gone");
        }
    }

    /// Subscribe to published display snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state_rx.clone()
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> DisplayState {
        self.state_rx.borrow().clone()
    }
}

struct Actor {
    loader: Arc<dyn MessageLoader>,
    publish_loading: bool,
    done_tx: mpsc::UnboundedSender<Completion>,
    state_tx: watch::Sender<DisplayState>,
    generation: u64,
    phase: Phase,
    in_flight: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Option<MessageEntry>>,
        mut done_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                // Selections take priority over completions: a queued
                // selection supersedes any result waiting behind it.
                biased;

                cmd = cmd_rx.recv() => match cmd {
                    Some(Some(entry)) => self.begin_load(entry),
                    Some(None) => self.clear(),
                    // All handles dropped.
                    None => break,
                },
                Some(done) = done_rx.recv() => self.complete(done),
            }
        }
        self.cancel_in_flight();
        debug!("Viewer actor exiting");
    }

    /// Clear the selection: abandon any in-flight load and publish the
    /// cleared snapshot.
    fn clear(&mut self) {
        self.cancel_in_flight();
        self.generation += 1;
        self.phase = Phase::Empty;
        self.publish(DisplayState::default());
    }

    /// Start loading `entry`, superseding whatever was in flight.
    fn begin_load(&mut self, entry: MessageEntry) {
        self.cancel_in_flight();
        self.generation += 1;
        let generation = self.generation;
        self.phase = Phase::Loading(generation);
        debug!(entry = %entry, generation, "Load requested");

        if self.publish_loading {
            let loading = DisplayState::loading_from(&self.state_tx.borrow());
            self.publish(loading);
        }

        let loader = Arc::clone(&self.loader);
        let done_tx = self.done_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = loader.load(&entry).await;
            // The actor may already be gone during teardown.
            let _ = done_tx.send(Completion {
                generation,
                outcome,
            });
        }));
    }

    /// Apply a loader completion, unless it has been superseded.
    ///
    /// A result is authoritative only when the actor is still in the
    /// `Loading` phase of the same generation; anything else (a newer
    /// selection, a clear, an already-applied result) makes it stale.
    fn complete(&mut self, done: Completion) {
        if self.phase != Phase::Loading(done.generation) {
            trace!(
                generation = done.generation,
                current = self.generation,
                "Discarding stale load result"
            );
            return;
        }
        self.in_flight = None;

        match done.outcome {
            Ok(message) => {
                self.phase = Phase::Ready(done.generation);
                self.publish(DisplayState::compose(&message));
            }
            Err(e) => {
                // The failure stops here: presentation sees a cleared
                // snapshot, never an error.
                warn!(error = %e, "Message load failed");
                self.phase = Phase::Empty;
                self.publish(DisplayState::default());
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    fn publish(&self, state: DisplayState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use tokio::sync::oneshot;
    use tokio::time::{sleep, timeout, Duration};

    use crate::error::LoadError;
    use crate::model::content_type::ContentType;
    use crate::model::message::MimePart;

    fn sample_message(subject: &str, body: &str) -> ParsedMessage {
        ParsedMessage {
            subject: subject.to_string(),
            from: "sender@example.com".into(),
            to: "recipient@example.com".into(),
            cc: String::new(),
            bcc: String::new(),
            date: None,
            raw_headers: format!("Subject: {subject}"),
            parts: vec![MimePart {
                content_type: ContentType::new("text", "plain"),
                is_attachment: false,
                text: Some(body.to_string()),
                filename: None,
                size: body.len() as u64,
            }],
        }
    }

    /// Loader whose completions are released by the test through oneshot
    /// gates. Entries without a registered gate complete immediately.
    struct GatedLoader {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<ParsedMessage>>>>,
    }

    impl GatedLoader {
        fn new() -> Self {
            Self {
                gates: Mutex::new(HashMap::new()),
            }
        }

        /// Register a gate for `id`; the returned sender releases the load.
        fn gate(&self, id: &str) -> oneshot::Sender<Result<ParsedMessage>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(id.to_string(), rx);
            tx
        }
    }

    impl MessageLoader for GatedLoader {
        fn load<'a>(&'a self, entry: &'a MessageEntry) -> BoxFuture<'a, Result<ParsedMessage>> {
            Box::pin(async move {
                let gate = self.gates.lock().unwrap().remove(entry.id());
                match gate {
                    Some(rx) => rx.await.unwrap_or(Err(LoadError::Cancelled)),
                    None => Ok(sample_message(entry.id(), "instant body")),
                }
            })
        }
    }

    /// Await a published snapshot matching `pred`.
    async fn wait_for(
        rx: &mut watch::Receiver<DisplayState>,
        pred: impl Fn(&DisplayState) -> bool,
    ) -> DisplayState {
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if pred(&state) {
                        return state.clone();
                    }
                }
                rx.changed().await.expect("viewer actor dropped");
            }
        })
        .await
        .expect("timed out waiting for snapshot")
    }

    #[tokio::test]
    async fn test_initial_state_is_cleared() {
        let viewer = MessageViewer::spawn(Arc::new(GatedLoader::new()), ViewerConfig::default());
        assert_eq!(viewer.current(), DisplayState::default());
    }

    #[tokio::test]
    async fn test_successful_load_publishes_display_state() {
        let viewer = MessageViewer::spawn(Arc::new(GatedLoader::new()), ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("report".into()));
        let state = wait_for(&mut rx, |s| !s.is_loading && !s.subject.is_empty()).await;

        assert_eq!(state.subject, "report");
        assert_eq!(state.main_body.as_deref(), Some("instant body"));
        assert!(!state.main_body_is_html);
        assert_eq!(state.from, "sender@example.com");
    }

    #[tokio::test]
    async fn test_select_none_clears_everything() {
        let viewer = MessageViewer::spawn(Arc::new(GatedLoader::new()), ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("report".into()));
        wait_for(&mut rx, |s| !s.is_loading && !s.subject.is_empty()).await;

        viewer.select(None);
        let state = wait_for(&mut rx, |s| s.subject.is_empty() && !s.is_loading).await;
        assert_eq!(state, DisplayState::default());
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let loader = Arc::new(GatedLoader::new());
        let gate_a = loader.gate("a");
        let gate_b = loader.gate("b");
        let viewer = MessageViewer::spawn(loader, ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("a".into()));
        viewer.select(Some("b".into()));

        // A resolves only after B was requested: its result must vanish.
        // (The send may find the load already aborted; either path must
        // leave the published state untouched.)
        let _ = gate_a.send(Ok(sample_message("a", "from a")));
        sleep(Duration::from_millis(50)).await;
        let state = viewer.current();
        assert!(state.is_loading, "still waiting on B");
        assert_ne!(state.subject, "a", "stale A result must not be published");

        gate_b.send(Ok(sample_message("b", "from b"))).unwrap();
        let state = wait_for(&mut rx, |s| !s.is_loading && !s.subject.is_empty()).await;
        assert_eq!(state.subject, "b");
        assert_eq!(state.main_body.as_deref(), Some("from b"));
    }

    #[tokio::test]
    async fn test_clear_discards_inflight_load() {
        let loader = Arc::new(GatedLoader::new());
        let gate = loader.gate("slow");
        let viewer = MessageViewer::spawn(loader, ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("slow".into()));
        wait_for(&mut rx, |s| s.is_loading).await;
        viewer.select(None);
        wait_for(&mut rx, |s| !s.is_loading).await;

        // The release may race the abort; either way nothing is published.
        let _ = gate.send(Ok(sample_message("slow", "late")));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(viewer.current(), DisplayState::default());
    }

    #[tokio::test]
    async fn test_load_failure_publishes_cleared_state() {
        let loader = Arc::new(GatedLoader::new());
        let gate = loader.gate("broken");
        let viewer = MessageViewer::spawn(loader, ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("broken".into()));
        wait_for(&mut rx, |s| s.is_loading).await;

        gate.send(Err(LoadError::NotFound("broken".into()))).unwrap();
        let state = wait_for(&mut rx, |s| !s.is_loading).await;
        assert_eq!(state, DisplayState::default());
    }

    #[tokio::test]
    async fn test_loading_snapshot_retains_previous_content() {
        let loader = Arc::new(GatedLoader::new());
        let gate = loader.gate("second");
        let viewer = MessageViewer::spawn(loader, ViewerConfig::default());
        let mut rx = viewer.subscribe();

        viewer.select(Some("first".into()));
        wait_for(&mut rx, |s| !s.is_loading && s.subject == "first").await;

        viewer.select(Some("second".into()));
        let loading = wait_for(&mut rx, |s| s.is_loading).await;
        assert_eq!(loading.subject, "first", "stale content stays visible");
        assert_eq!(loading.main_body.as_deref(), Some("instant body"));

        gate.send(Ok(sample_message("second", "new body"))).unwrap();
        let state = wait_for(&mut rx, |s| !s.is_loading && s.subject == "second").await;
        assert_eq!(state.main_body.as_deref(), Some("new body"));
    }

    #[tokio::test]
    async fn test_publish_loading_can_be_disabled() {
        let loader = Arc::new(GatedLoader::new());
        let gate = loader.gate("quiet");
        let mut config = ViewerConfig::default();
        config.load.publish_loading = false;
        let viewer = MessageViewer::spawn(loader, config);

        viewer.select(Some("quiet".into()));
        sleep(Duration::from_millis(50)).await;
        assert_eq!(
            viewer.current(),
            DisplayState::default(),
            "no intermediate snapshot"
        );

        let mut rx = viewer.subscribe();
        gate.send(Ok(sample_message("quiet", "body"))).unwrap();
        let state = wait_for(&mut rx, |s| !s.is_loading && !s.subject.is_empty()).await;
        assert_eq!(state.subject, "quiet");
    }

    #[tokio::test]
    async fn test_completion_from_superseded_generation_is_ignored() {
        // Drive the state machine directly: a completion tagged with an
        // older generation must not touch the published state, however it
        // arrives.
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(DisplayState::default());
        let mut actor = Actor {
            loader: Arc::new(GatedLoader::new()),
            publish_loading: true,
            done_tx,
            state_tx,
            generation: 0,
            phase: Phase::Empty,
            in_flight: None,
        };

        actor.begin_load("a".into());
        actor.begin_load("b".into());

        actor.complete(Completion {
            generation: 1,
            outcome: Ok(sample_message("a", "stale body")),
        });
        assert!(state_rx.borrow().is_loading, "still loading b");
        assert_ne!(state_rx.borrow().subject, "a");

        actor.complete(Completion {
            generation: 2,
            outcome: Ok(sample_message("b", "fresh body")),
        });
        let state = state_rx.borrow();
        assert_eq!(state.subject, "b");
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_rapid_reselection_settles_on_latest() {
        let loader = Arc::new(GatedLoader::new());
        let viewer = MessageViewer::spawn(loader, ViewerConfig::default());
        let mut rx = viewer.subscribe();

        // All instant loads; only the last may win.
        for id in ["one", "two", "three", "four", "five"] {
            viewer.select(Some(id.into()));
        }
        let state = wait_for(&mut rx, |s| !s.is_loading && !s.subject.is_empty()).await;
        assert_eq!(state.subject, "five");
    }
}
