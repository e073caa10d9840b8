//! Session controller — ties microphone, downsampler, transport and plot
//! state into one control surface.
//!
//! [`SessionController`] owns the [`SharedState`] and responds to
//! [`ControlCommand`]s from the UI and [`TransportEvent`]s from the
//! streaming client over `tokio::sync::mpsc` channels.
//!
//! # Lifecycle
//!
//! ```text
//! ControlCommand::StartRecording
//!   ├─ refused unless the transport is Connected (never queued)
//!   └─▶ spawn_blocking(capture.open) ──ok──▶ forwarder thread, Recording
//!                                    ──err─▶ surfaced error, stays Idle
//!
//! ControlCommand::StopRecording
//!   └─▶ spawn_blocking(teardown): join capture thread (device released,
//!       chunk sender dropped) → forwarder drains out → Idle, live point
//!       cleared
//!
//! ControlCommand::SetSpeakerType (Idle only)
//!   └─▶ bump config generation, clear live point, spawn tagged fetch;
//!       a fetch result is applied only while its generation is current
//!       (last-request-wins)
//! ```
//!
//! Every start builds a fresh pipeline; nothing from a previous recording
//! is reused.  Transport loss mid-recording is a silent degrade — the
//! session keeps running and undeliverable chunks are discarded by the
//! client.

use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use tokio::sync::mpsc;

use crate::audio::{AudioChunk, CaptureSource, DownsamplerConfig, RecordingHandle};
use crate::net::{
    ConnectionState, ReferenceConfig, ReferenceError, ReferenceSource, Transport, TransportEvent,
};
use crate::types::SpeakerType;

use super::state::{SessionState, SharedState};

// ---------------------------------------------------------------------------
// ControlCommand
// ---------------------------------------------------------------------------

/// Commands sent from the control surface to the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Start a fresh recording session.
    StartRecording,
    /// Stop the current recording session; always available.
    StopRecording,
    /// Select a speaker class (ignored while recording).
    SetSpeakerType(SpeakerType),
}

// ---------------------------------------------------------------------------
// ActiveRecording
// ---------------------------------------------------------------------------

/// The two threads making up one live recording pipeline.
struct ActiveRecording {
    /// Owns the capture thread; dropping it releases the device and the
    /// chunk sender.
    handle: RecordingHandle,
    /// Drains chunks from the capture side into the transport.
    forwarder: thread::JoinHandle<()>,
}

impl ActiveRecording {
    /// Deterministic teardown: device first, then the forwarder runs dry.
    fn stop(self) {
        drop(self.handle);
        let _ = self.forwarder.join();
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// Completion of one reference-config fetch, tagged with the generation it
/// was issued under.
struct FetchOutcome {
    generation: u64,
    speaker: SpeakerType,
    result: Result<ReferenceConfig, ReferenceError>,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Drives the recording lifecycle.
///
/// Create with [`SessionController::new`], then call [`run`](Self::run)
/// inside a tokio task.
pub struct SessionController {
    state: SharedState,
    transport: Arc<dyn Transport>,
    capture: Arc<dyn CaptureSource>,
    references: Arc<dyn ReferenceSource>,
    downsampler: DownsamplerConfig,
    active: Option<ActiveRecording>,
    /// Bumped on every speaker change; stale fetches are discarded.
    generation: u64,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    fetch_rx: Option<mpsc::Receiver<FetchOutcome>>,
}

impl SessionController {
    /// Create a new controller.
    ///
    /// # Arguments
    ///
    /// * `state`      — shared application state (also read by the UI).
    /// * `transport`  — streaming client handle (shared with nobody else's
    ///   recording; one session at a time uses it).
    /// * `capture`    — microphone seam (e.g. [`crate::audio::CpalSource`]).
    /// * `references` — reference-config seam (e.g.
    ///   [`crate::net::HttpReferenceSource`]).
    /// * `downsampler` — rate-reduction factors for new pipelines.
    pub fn new(
        state: SharedState,
        transport: Arc<dyn Transport>,
        capture: Arc<dyn CaptureSource>,
        references: Arc<dyn ReferenceSource>,
        downsampler: DownsamplerConfig,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(4);
        Self {
            state,
            transport,
            capture,
            references,
            downsampler,
            active: None,
            generation: 0,
            fetch_tx,
            fetch_rx: Some(fetch_rx),
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until the command or event channel closes.
    ///
    /// Issues the initial reference fetch for the configured speaker class,
    /// then reacts to commands, transport events and fetch completions.
    /// Should be spawned as a tokio task from `main()`.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<ControlCommand>,
        mut transport_rx: mpsc::Receiver<TransportEvent>,
    ) {
        let mut fetch_rx = self.fetch_rx.take().expect("run() called twice");

        self.spawn_reference_fetch();

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(ControlCommand::StartRecording) => self.start_recording().await,
                    Some(ControlCommand::StopRecording) => self.stop_recording().await,
                    Some(ControlCommand::SetSpeakerType(speaker)) => {
                        self.set_speaker_type(speaker);
                    }
                    None => break,
                },

                event = transport_rx.recv() => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => break,
                },

                outcome = fetch_rx.recv() => {
                    if let Some(outcome) = outcome {
                        self.apply_fetch_outcome(outcome);
                    }
                }
            }
        }

        log::info!("session: control channel closed, controller shutting down");
        self.stop_recording().await;
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// Start a fresh capture pipeline.
    ///
    /// Refused (with a surfaced, non-fatal error) when the transport is not
    /// connected or the microphone cannot be opened.
    async fn start_recording(&mut self) {
        if self.active.is_some() {
            log::debug!("session: start ignored, already recording");
            return;
        }

        if self.transport.state() != ConnectionState::Connected {
            self.set_error("Not connected to the analysis backend");
            return;
        }

        // Fresh channel and pipeline per session — never reused.
        let (chunk_tx, chunk_rx) = std_mpsc::channel::<AudioChunk>();
        let capture = Arc::clone(&self.capture);
        let config = self.downsampler;

        let opened = tokio::task::spawn_blocking(move || capture.open(config, chunk_tx)).await;

        let handle = match opened {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                self.set_error(format!("Microphone unavailable: {e}"));
                return;
            }
            Err(e) => {
                self.set_error(format!("Internal error: {e}"));
                return;
            }
        };

        // The speaker class cannot change while recording, so each chunk is
        // tagged with the value selected at start.
        let speaker = self.state.lock().unwrap().speaker;
        let transport = Arc::clone(&self.transport);
        let forwarder = thread::Builder::new()
            .name("chunk-forward".into())
            .spawn(move || {
                while let Ok(chunk) = chunk_rx.recv() {
                    transport.send_chunk(chunk, speaker);
                }
            })
            .expect("failed to spawn chunk-forward thread");

        self.active = Some(ActiveRecording { handle, forwarder });
        {
            let mut st = self.state.lock().unwrap();
            st.session = SessionState::Recording;
            st.last_error = None;
        }
        log::info!("session: recording started ({speaker})");
    }

    /// Tear down the active pipeline, if any, and return to Idle.
    async fn stop_recording(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        // Joins are blocking; push them off the async worker.
        if let Err(e) = tokio::task::spawn_blocking(move || active.stop()).await {
            log::warn!("session: teardown task panicked: {e}");
        }

        {
            let mut st = self.state.lock().unwrap();
            st.session = SessionState::Idle;
            st.current_formant = None;
        }
        log::info!("session: recording stopped");
    }

    /// Select a new speaker class and re-fetch its reference configuration.
    fn set_speaker_type(&mut self, speaker: SpeakerType) {
        {
            let mut st = self.state.lock().unwrap();
            if st.session.is_recording() {
                log::debug!("session: speaker change ignored while recording");
                return;
            }
            if st.speaker == speaker {
                return;
            }
            st.speaker = speaker;
            // Estimates produced against the previous reference generation
            // are stale the moment the class changes.
            st.current_formant = None;
        }

        self.generation += 1;
        self.spawn_reference_fetch();
    }

    // -----------------------------------------------------------------------
    // Transport events
    // -----------------------------------------------------------------------

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.state.lock().unwrap().connection = ConnectionState::Connected;
            }
            TransportEvent::Disconnected => {
                // Silent degrade: recording continues; the client discards
                // undeliverable chunks until the connection comes back.
                self.state.lock().unwrap().connection = ConnectionState::Disconnected;
            }
            TransportEvent::Formant(point) => {
                let mut st = self.state.lock().unwrap();
                // Estimates arriving after a stop must not resurrect the
                // live marker.
                if st.session.is_recording() {
                    st.current_formant = Some(point);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reference configuration
    // -----------------------------------------------------------------------

    /// Fetch the reference config for the currently selected speaker class,
    /// tagged with the current generation.
    fn spawn_reference_fetch(&self) {
        let generation = self.generation;
        let speaker = self.state.lock().unwrap().speaker;
        let references = Arc::clone(&self.references);
        let fetch_tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let result = references.fetch(speaker).await;
            let _ = fetch_tx
                .send(FetchOutcome {
                    generation,
                    speaker,
                    result,
                })
                .await;
        });
    }

    /// Apply a completed fetch — last request wins, failures keep the prior
    /// configuration.
    fn apply_fetch_outcome(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            log::debug!(
                "session: discarding superseded reference config for {}",
                outcome.speaker
            );
            return;
        }

        match outcome.result {
            Ok(config) => {
                let count = config.vowel_references.len();
                {
                    let mut st = self.state.lock().unwrap();
                    st.references = config.vowel_references;
                    st.plot_config = config.plot_config;
                }
                log::info!(
                    "session: applied reference config for {} ({count} vowels)",
                    outcome.speaker
                );
            }
            Err(e) => {
                // Prior configuration stays in effect; no plot disruption.
                log::warn!(
                    "session: reference fetch for {} failed: {e}",
                    outcome.speaker
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("session: {message}");
        self.state.lock().unwrap().last_error = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::audio::MockCaptureSource;
    use crate::net::{MockTransport, ReferenceConfig};
    use crate::session::state::new_shared_state;
    use crate::types::{FormantPoint, PlotConfig, VowelReference};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Per-class reference payloads matching the backend dataset shapes.
    fn reference_config_for(speaker: SpeakerType) -> ReferenceConfig {
        let (vowel, f1, f2, plot_config) = match speaker {
            SpeakerType::Male => (
                "ɑ",
                730.0,
                1090.0,
                PlotConfig {
                    f1_range: (200.0, 800.0),
                    f2_range: (600.0, 3000.0),
                    invert_axes: true,
                },
            ),
            SpeakerType::Female => (
                "ɑ",
                850.0,
                1220.0,
                PlotConfig {
                    f1_range: (200.0, 1000.0),
                    f2_range: (600.0, 3500.0),
                    invert_axes: true,
                },
            ),
            SpeakerType::Child => (
                "ɑ",
                1030.0,
                1370.0,
                PlotConfig {
                    f1_range: (300.0, 1200.0),
                    f2_range: (600.0, 4000.0),
                    invert_axes: true,
                },
            ),
        };

        ReferenceConfig {
            vowel_references: vec![VowelReference {
                vowel: vowel.into(),
                f1,
                f2,
            }],
            plot_config,
        }
    }

    /// Immediate reference source; optionally fails for one speaker class.
    struct MockReferenceSource {
        fail_for: Option<SpeakerType>,
    }

    #[async_trait]
    impl ReferenceSource for MockReferenceSource {
        async fn fetch(&self, speaker: SpeakerType) -> Result<ReferenceConfig, ReferenceError> {
            if self.fail_for == Some(speaker) {
                return Err(ReferenceError::Request("connection refused".into()));
            }
            Ok(reference_config_for(speaker))
        }
    }

    /// Reference source whose response for one speaker class is held until
    /// the test releases a semaphore permit — used to race fetches.
    struct GatedReferenceSource {
        gated: SpeakerType,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl ReferenceSource for GatedReferenceSource {
        async fn fetch(&self, speaker: SpeakerType) -> Result<ReferenceConfig, ReferenceError> {
            if speaker == self.gated {
                let _permit = self.gate.acquire().await.expect("gate closed");
            }
            Ok(reference_config_for(speaker))
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        state: SharedState,
        command_tx: mpsc::Sender<ControlCommand>,
        transport_tx: mpsc::Sender<TransportEvent>,
        capture_count: Arc<AtomicUsize>,
    }

    fn spawn_controller(
        connection: ConnectionState,
        capture: MockCaptureSource,
        references: Arc<dyn ReferenceSource>,
    ) -> Harness {
        let state = new_shared_state(SpeakerType::Male);
        let transport = Arc::new(MockTransport::new(connection));
        let capture_count = capture.counter();

        let controller = SessionController::new(
            Arc::clone(&state),
            transport as Arc<dyn Transport>,
            Arc::new(capture) as Arc<dyn CaptureSource>,
            references,
            DownsamplerConfig::default(),
        );

        let (command_tx, command_rx) = mpsc::channel(8);
        let (transport_tx, transport_rx) = mpsc::channel(8);
        tokio::spawn(controller.run(command_rx, transport_rx));

        Harness {
            state,
            command_tx,
            transport_tx,
            capture_count,
        }
    }

    /// Poll `predicate` until it holds (or fail after ~2 s).
    async fn wait_for(label: &str, mut predicate: impl FnMut() -> bool) {
        for _ in 0..100 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached: {label}");
    }

    /// Give in-flight controller work a moment to land.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    fn immediate_references() -> Arc<dyn ReferenceSource> {
        Arc::new(MockReferenceSource { fail_for: None })
    }

    // -----------------------------------------------------------------------
    // Start / stop lifecycle
    // -----------------------------------------------------------------------

    /// A start while disconnected must be refused, not queued.
    #[tokio::test]
    async fn start_refused_while_disconnected() {
        let h = spawn_controller(
            ConnectionState::Disconnected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();

        let state = Arc::clone(&h.state);
        wait_for("start refused", move || {
            state.lock().unwrap().last_error.is_some()
        })
        .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.session, SessionState::Idle);
        assert_eq!(h.capture_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn start_enters_recording_with_one_pipeline() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();

        let state = Arc::clone(&h.state);
        wait_for("recording started", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        assert_eq!(h.capture_count.load(Ordering::SeqCst), 1);
    }

    /// Microphone refusal surfaces as an error and the session stays Idle.
    #[tokio::test]
    async fn mic_denied_stays_idle() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::failing(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();

        let state = Arc::clone(&h.state);
        wait_for("mic error surfaced", move || {
            state.lock().unwrap().last_error.is_some()
        })
        .await;

        assert_eq!(h.state.lock().unwrap().session, SessionState::Idle);
        assert_eq!(h.capture_count.load(Ordering::SeqCst), 0);
    }

    /// Stop-then-start must leave exactly one live pipeline — nothing leaks
    /// from the previous session.
    #[tokio::test]
    async fn stop_then_start_leaves_one_pipeline() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("first start", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        h.command_tx
            .send(ControlCommand::StopRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("stopped", move || {
            !state.lock().unwrap().session.is_recording()
        })
        .await;
        assert_eq!(h.capture_count.load(Ordering::SeqCst), 0);

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("second start", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        assert_eq!(h.capture_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_clears_live_formant() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("recording", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        h.transport_tx
            .send(TransportEvent::Formant(FormantPoint::now(512.0, 1845.0)))
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("estimate displayed", move || {
            state.lock().unwrap().current_formant.is_some()
        })
        .await;

        h.command_tx
            .send(ControlCommand::StopRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("stopped", move || {
            !state.lock().unwrap().session.is_recording()
        })
        .await;

        assert!(h.state.lock().unwrap().current_formant.is_none());
    }

    // -----------------------------------------------------------------------
    // Transport events
    // -----------------------------------------------------------------------

    /// A formant estimate arriving while Idle must leave the live point
    /// unchanged (the counterpart of a malformed frame, which never even
    /// reaches the controller).
    #[tokio::test]
    async fn formant_ignored_while_idle() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.transport_tx
            .send(TransportEvent::Formant(FormantPoint::now(512.0, 1845.0)))
            .await
            .unwrap();
        settle().await;

        assert!(h.state.lock().unwrap().current_formant.is_none());
    }

    /// Connection loss mid-recording degrades silently: the session keeps
    /// recording and only the mirrored state flips.
    #[tokio::test]
    async fn disconnect_mid_recording_is_silent_degrade() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("recording", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        h.transport_tx
            .send(TransportEvent::Disconnected)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("disconnect mirrored", move || {
            state.lock().unwrap().connection == ConnectionState::Disconnected
        })
        .await;

        assert!(h.state.lock().unwrap().session.is_recording());
    }

    #[tokio::test]
    async fn connected_event_is_mirrored() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.transport_tx.send(TransportEvent::Connected).await.unwrap();

        let state = Arc::clone(&h.state);
        wait_for("connect mirrored", move || {
            state.lock().unwrap().connection == ConnectionState::Connected
        })
        .await;
    }

    // -----------------------------------------------------------------------
    // Speaker type / reference configuration
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn initial_reference_fetch_is_applied() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        let state = Arc::clone(&h.state);
        wait_for("initial config applied", move || {
            !state.lock().unwrap().references.is_empty()
        })
        .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.plot_config, reference_config_for(SpeakerType::Male).plot_config);
    }

    /// If the fetch for the old class resolves after a newer class was
    /// selected, the newer configuration must win regardless of arrival
    /// order.
    #[tokio::test]
    async fn speaker_race_is_last_request_wins() {
        let gate = Arc::new(Semaphore::new(0));
        let references = Arc::new(GatedReferenceSource {
            gated: SpeakerType::Male,
            gate: Arc::clone(&gate),
        });

        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            references,
        );

        // The initial male fetch is in flight (gated).  Select female before
        // it resolves.
        h.command_tx
            .send(ControlCommand::SetSpeakerType(SpeakerType::Female))
            .await
            .unwrap();

        let female = reference_config_for(SpeakerType::Female);
        let state = Arc::clone(&h.state);
        let expected = female.plot_config;
        wait_for("female config applied", move || {
            state.lock().unwrap().plot_config == expected
        })
        .await;

        // Now let the stale male response through; it must be discarded.
        gate.add_permits(1);
        settle().await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.plot_config, female.plot_config);
        assert_eq!(st.references, female.vowel_references);
    }

    /// A failed fetch keeps the previously applied configuration.
    #[tokio::test]
    async fn fetch_failure_keeps_prior_config() {
        let references = Arc::new(MockReferenceSource {
            fail_for: Some(SpeakerType::Female),
        });
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            references,
        );

        let male = reference_config_for(SpeakerType::Male);
        let state = Arc::clone(&h.state);
        let expected = male.plot_config;
        wait_for("male config applied", move || {
            state.lock().unwrap().plot_config == expected
        })
        .await;

        h.command_tx
            .send(ControlCommand::SetSpeakerType(SpeakerType::Female))
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("speaker switched", move || {
            state.lock().unwrap().speaker == SpeakerType::Female
        })
        .await;
        settle().await;

        // The female fetch failed; the male overlay is still in effect.
        let st = h.state.lock().unwrap();
        assert_eq!(st.plot_config, male.plot_config);
        assert_eq!(st.references, male.vowel_references);
    }

    /// The selector is disabled while recording; a command that slips
    /// through anyway must be ignored.
    #[tokio::test]
    async fn speaker_change_ignored_while_recording() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("recording", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;

        h.command_tx
            .send(ControlCommand::SetSpeakerType(SpeakerType::Child))
            .await
            .unwrap();
        settle().await;

        assert_eq!(h.state.lock().unwrap().speaker, SpeakerType::Male);
    }

    /// Speaker change while idle clears the stale live point.
    #[tokio::test]
    async fn speaker_change_clears_live_point() {
        let h = spawn_controller(
            ConnectionState::Connected,
            MockCaptureSource::new(),
            immediate_references(),
        );

        // Get an estimate on screen first.
        h.command_tx
            .send(ControlCommand::StartRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("recording", move || {
            state.lock().unwrap().session.is_recording()
        })
        .await;
        h.transport_tx
            .send(TransportEvent::Formant(FormantPoint::now(512.0, 1845.0)))
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("estimate displayed", move || {
            state.lock().unwrap().current_formant.is_some()
        })
        .await;
        h.command_tx
            .send(ControlCommand::StopRecording)
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("stopped", move || {
            !state.lock().unwrap().session.is_recording()
        })
        .await;

        h.command_tx
            .send(ControlCommand::SetSpeakerType(SpeakerType::Child))
            .await
            .unwrap();
        let state = Arc::clone(&h.state);
        wait_for("speaker switched", move || {
            state.lock().unwrap().speaker == SpeakerType::Child
        })
        .await;

        assert!(h.state.lock().unwrap().current_formant.is_none());
    }
}
