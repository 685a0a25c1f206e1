// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-reading session controller.
//!
//! Drives one reading through its lifecycle: creation, layout selection,
//! card draw, interpretation wait, follow-up conversation. Stages are
//! monotonic; every operation checks its precondition client-side before
//! touching the network, and on failure the session stays in the last
//! successfully reached stage so the caller can retry the failed step.

use std::sync::Arc;

use arcanum_core::types::{
    ConversationMessage, Interpretation, Layout, LayoutId, Reading, ReadingId,
};
use arcanum_core::{ArcanumError, TarotBackend};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::poller::{poll_interpretation, PollPolicy};

/// Lifecycle stages of a reading session. No backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadingStage {
    /// Created server-side, no layout chosen.
    Draft,
    /// A layout is attached; cards not yet drawn.
    LayoutSelected,
    /// Cards are drawn. Passed through implicitly: entering it immediately
    /// starts the interpretation poller.
    CardsDrawn,
    /// Poller running or awaiting a manual retry.
    AwaitingInterpretation,
    /// Interpretation resolved; the follow-up sub-protocol is open.
    InterpretationReady,
}

impl std::fmt::Display for ReadingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingStage::Draft => write!(f, "draft"),
            ReadingStage::LayoutSelected => write!(f, "layout_selected"),
            ReadingStage::CardsDrawn => write!(f, "cards_drawn"),
            ReadingStage::AwaitingInterpretation => write!(f, "awaiting_interpretation"),
            ReadingStage::InterpretationReady => write!(f, "interpretation_ready"),
        }
    }
}

/// Mutable session state behind the controller's RwLock.
struct SessionState {
    stage: ReadingStage,
    reading: Reading,
    /// Layout catalog, fetched lazily; used for client-side validation of
    /// layout choices.
    layouts: Vec<Layout>,
    interpretation: Option<Interpretation>,
    /// Cached conversation view. The backend log is the source of truth;
    /// this is refreshed by full refetch, never by local append.
    conversation: Vec<ConversationMessage>,
    /// Number of polling rounds that have run to completion. Waiters that
    /// queued behind a round compare against this to tell whether their
    /// round already finished while they waited.
    rounds_completed: u64,
    /// Terminal error of the last completed round, reported to waiters
    /// that queued behind it. Cleared on success.
    last_poll_failure: Option<ArcanumError>,
}

/// Controller for a single reading session.
///
/// Holds the backend behind the [`TarotBackend`] seam so it can be driven
/// against the HTTP gateway in production and a scripted fake in tests.
/// Interior mutability keeps all operations on `&self`, which is what makes
/// the in-flight guards (one draw, one follow-up at a time) enforceable.
pub struct ReadingSession {
    backend: Arc<dyn TarotBackend>,
    policy: PollPolicy,
    cancel: CancellationToken,
    state: RwLock<SessionState>,
    /// Held across the draw round trip; a second draw while one is in
    /// flight is rejected, because draws are not idempotent server-side.
    draw_gate: Mutex<()>,
    /// At most one in-flight follow-up per interpretation.
    follow_up_gate: Mutex<()>,
    poll_task: Mutex<Option<JoinHandle<Result<Interpretation, ArcanumError>>>>,
}

impl ReadingSession {
    /// Starts a new session by allocating a reading server-side.
    pub async fn begin(
        backend: Arc<dyn TarotBackend>,
        policy: PollPolicy,
    ) -> Result<Self, ArcanumError> {
        let reading = backend.create_reading().await?;
        info!(reading = %reading.id, "reading session created");
        Ok(Self::with_reading(backend, policy, reading, ReadingStage::Draft))
    }

    /// Resumes a session for an existing reading.
    ///
    /// The stage is derived from the reading's observable content rather
    /// than its backend status string: drawn cards put the session straight
    /// into the interpretation wait, a chosen layout into `LayoutSelected`.
    pub async fn resume(
        backend: Arc<dyn TarotBackend>,
        policy: PollPolicy,
        reading_id: &ReadingId,
    ) -> Result<Self, ArcanumError> {
        let reading = backend.get_reading(reading_id).await?;
        let stage = if reading.has_cards() {
            ReadingStage::AwaitingInterpretation
        } else if reading.layout_id.is_some() {
            ReadingStage::LayoutSelected
        } else {
            ReadingStage::Draft
        };
        info!(reading = %reading.id, stage = %stage, "reading session resumed");
        Ok(Self::with_reading(backend, policy, reading, stage))
    }

    fn with_reading(
        backend: Arc<dyn TarotBackend>,
        policy: PollPolicy,
        reading: Reading,
        stage: ReadingStage,
    ) -> Self {
        Self {
            backend,
            policy,
            cancel: CancellationToken::new(),
            state: RwLock::new(SessionState {
                stage,
                reading,
                layouts: Vec::new(),
                interpretation: None,
                conversation: Vec::new(),
                rounds_completed: 0,
                last_poll_failure: None,
            }),
            draw_gate: Mutex::new(()),
            follow_up_gate: Mutex::new(()),
            poll_task: Mutex::new(None),
        }
    }

    /// Current lifecycle stage.
    pub async fn stage(&self) -> ReadingStage {
        self.state.read().await.stage
    }

    /// Snapshot of the reading as last returned by the backend.
    pub async fn reading(&self) -> Reading {
        self.state.read().await.reading.clone()
    }

    /// The resolved interpretation, once the session reaches
    /// [`ReadingStage::InterpretationReady`].
    pub async fn interpretation(&self) -> Option<Interpretation> {
        self.state.read().await.interpretation.clone()
    }

    /// Cached conversation view (see [`Self::refresh_conversation`]).
    pub async fn conversation(&self) -> Vec<ConversationMessage> {
        self.state.read().await.conversation.clone()
    }

    /// Fetches the layout catalog, caching it for client-side validation.
    ///
    /// Every layout is structurally validated at this boundary so a
    /// malformed catalog entry fails here instead of corrupting a draw.
    pub async fn layouts(&self) -> Result<Vec<Layout>, ArcanumError> {
        {
            let state = self.state.read().await;
            if !state.layouts.is_empty() {
                return Ok(state.layouts.clone());
            }
        }
        let layouts = self.backend.list_layouts().await?;
        for layout in &layouts {
            layout.validate()?;
        }
        let mut state = self.state.write().await;
        state.layouts = layouts.clone();
        Ok(layouts)
    }

    /// Attaches a layout choice to the reading.
    ///
    /// The id must come from the catalog returned by [`Self::layouts`];
    /// anything else is rejected client-side before any network call.
    /// Re-selecting before cards are drawn simply re-invokes the backend.
    pub async fn select_layout(&self, layout: &LayoutId) -> Result<Reading, ArcanumError> {
        {
            let state = self.state.read().await;
            if state.stage > ReadingStage::LayoutSelected {
                return Err(ArcanumError::Validation(
                    "cards already drawn; the layout can no longer change".into(),
                ));
            }
        }

        let catalog = self.layouts().await?;
        if !catalog.iter().any(|l| l.id == *layout) {
            return Err(ArcanumError::Validation(format!(
                "layout `{layout}` is not in the catalog"
            )));
        }

        let reading_id = self.state.read().await.reading.id.clone();
        let reading = self.backend.select_layout(&reading_id, layout).await?;

        let mut state = self.state.write().await;
        state.reading = reading.clone();
        state.stage = ReadingStage::LayoutSelected;
        debug!(reading = %reading.id, layout = %layout, "layout selected");
        Ok(reading)
    }

    /// Draws the cards and starts the interpretation poller.
    ///
    /// A whitespace-only question normalizes to "no question"; otherwise the
    /// text passes through verbatim. On success the stage moves through
    /// `CardsDrawn` directly into `AwaitingInterpretation` and the poll task
    /// is spawned -- that transition is not a separate user action.
    pub async fn draw_cards(&self, question: Option<&str>) -> Result<Reading, ArcanumError> {
        let _guard = self.draw_gate.try_lock().map_err(|_| {
            ArcanumError::ConcurrentOperation("a draw is already in flight".into())
        })?;

        let reading_id = {
            let state = self.state.read().await;
            match state.stage {
                ReadingStage::Draft => {
                    return Err(ArcanumError::Validation(
                        "select a layout before drawing cards".into(),
                    ));
                }
                ReadingStage::LayoutSelected => {}
                _ => {
                    return Err(ArcanumError::Validation(
                        "cards already drawn for this reading".into(),
                    ));
                }
            }
            state.reading.id.clone()
        };

        let question = question.filter(|q| !q.trim().is_empty());
        let reading = self.backend.draw_cards(&reading_id, question).await?;
        info!(
            reading = %reading.id,
            cards = reading.cards.as_ref().map_or(0, Vec::len),
            "cards drawn, awaiting interpretation"
        );

        {
            let mut state = self.state.write().await;
            state.reading = reading.clone();
            state.stage = ReadingStage::AwaitingInterpretation;
        }
        self.spawn_poll(reading_id).await;
        Ok(reading)
    }

    /// Awaits the interpretation poller.
    ///
    /// On success the session moves to `InterpretationReady`. On
    /// [`ArcanumError::InterpretationUnavailable`] the stage is unchanged
    /// and calling this again starts a fresh polling round (the manual
    /// "keep waiting" path).
    ///
    /// Waiters are serialized: at most one polling round runs at a time,
    /// so concurrent calls never issue interleaved `get_interpretation`
    /// requests for the same reading. A caller that queues behind a round
    /// already in flight receives that round's outcome rather than
    /// starting another.
    pub async fn wait_for_interpretation(&self) -> Result<Interpretation, ArcanumError> {
        let entry_round = {
            let state = self.state.read().await;
            match state.stage {
                ReadingStage::InterpretationReady => {
                    // Already resolved; the interpretation is cached.
                    return state
                        .interpretation
                        .clone()
                        .ok_or_else(|| ArcanumError::Internal("ready stage without interpretation".into()));
                }
                ReadingStage::AwaitingInterpretation => state.rounds_completed,
                _ => {
                    return Err(ArcanumError::Validation(
                        "cards must be drawn before waiting for an interpretation".into(),
                    ));
                }
            }
        };

        // Waiters serialize here. The handle stays in the slot while it is
        // awaited, so a waiter dropped mid-await leaves the round joinable
        // and the next waiter resumes it instead of spawning a second one.
        let mut slot = self.poll_task.lock().await;

        {
            let state = self.state.read().await;
            if state.stage == ReadingStage::InterpretationReady {
                return state
                    .interpretation
                    .clone()
                    .ok_or_else(|| ArcanumError::Internal("ready stage without interpretation".into()));
            }
            if state.rounds_completed != entry_round {
                // The round this caller queued behind finished without an
                // interpretation; report its outcome instead of burning a
                // fresh attempt budget.
                return Err(state
                    .last_poll_failure
                    .as_ref()
                    .map(ArcanumError::clone_without_source)
                    .unwrap_or_else(|| ArcanumError::Internal("missing poll outcome".into())));
            }
        }

        if slot.is_none() {
            // Previous round exhausted its budget; start another.
            let reading_id = self.state.read().await.reading.id.clone();
            debug!(reading = %reading_id, "starting a fresh polling round");
            *slot = Some(self.poll_handle(reading_id));
        }
        let Some(handle) = slot.as_mut() else {
            return Err(ArcanumError::Internal("poll round missing after spawn".into()));
        };

        let outcome = handle
            .await
            .map_err(|e| ArcanumError::Internal(format!("poll task failed: {e}")))
            .and_then(|result| result);
        *slot = None;

        // State is updated before the slot lock is released so the next
        // queued waiter observes the finished round.
        let mut state = self.state.write().await;
        state.rounds_completed += 1;
        match outcome {
            Ok(interpretation) => {
                state.interpretation = Some(interpretation.clone());
                state.stage = ReadingStage::InterpretationReady;
                state.last_poll_failure = None;
                info!(reading = %state.reading.id, interpretation = %interpretation.id, "interpretation ready");
                Ok(interpretation)
            }
            Err(err) => {
                state.last_poll_failure = Some(err.clone_without_source());
                Err(err)
            }
        }
    }

    /// Appends one follow-up turn and refreshes the conversation view.
    ///
    /// Only valid once the interpretation is ready. A trimmed-empty question
    /// is rejected without a network call, and at most one follow-up may be
    /// in flight at a time.
    pub async fn ask_follow_up(
        &self,
        question: &str,
    ) -> Result<ConversationMessage, ArcanumError> {
        if question.trim().is_empty() {
            return Err(ArcanumError::Validation(
                "follow-up question must not be empty".into(),
            ));
        }

        let interpretation_id = {
            let state = self.state.read().await;
            if state.stage != ReadingStage::InterpretationReady {
                return Err(ArcanumError::Validation(
                    "follow-up questions require a completed interpretation".into(),
                ));
            }
            state
                .interpretation
                .as_ref()
                .map(|i| i.id.clone())
                .ok_or_else(|| ArcanumError::Internal("ready stage without interpretation".into()))?
        };

        let _guard = self.follow_up_gate.try_lock().map_err(|_| {
            ArcanumError::ConcurrentOperation("a follow-up is already in flight".into())
        })?;

        let message = self
            .backend
            .ask_follow_up(&interpretation_id, question)
            .await?;
        debug!(interpretation = %interpretation_id, message = ?message.id, "follow-up answered");

        // Re-read the full log rather than appending locally; the backend
        // remains the source of truth for ordering.
        let conversation = self.backend.get_conversation(&interpretation_id).await?;
        self.state.write().await.conversation = conversation;
        Ok(message)
    }

    /// Refetches the full conversation history from the backend.
    pub async fn refresh_conversation(&self) -> Result<Vec<ConversationMessage>, ArcanumError> {
        let interpretation_id = {
            let state = self.state.read().await;
            if state.stage != ReadingStage::InterpretationReady {
                return Err(ArcanumError::Validation(
                    "no conversation before the interpretation is ready".into(),
                ));
            }
            state
                .interpretation
                .as_ref()
                .map(|i| i.id.clone())
                .ok_or_else(|| ArcanumError::Internal("ready stage without interpretation".into()))?
        };

        let conversation = self.backend.get_conversation(&interpretation_id).await?;
        self.state.write().await.conversation = conversation.clone();
        Ok(conversation)
    }

    /// Abandons the session: the poller stops scheduling further attempts.
    ///
    /// Cooperative only -- an HTTP call already in flight is not aborted,
    /// but no retry is scheduled after it resolves.
    pub fn abandon(&self) {
        debug!("session abandoned, cancelling poll scheduling");
        self.cancel.cancel();
    }

    async fn spawn_poll(&self, reading_id: ReadingId) {
        let mut slot = self.poll_task.lock().await;
        *slot = Some(self.poll_handle(reading_id));
    }

    fn poll_handle(
        &self,
        reading_id: ReadingId,
    ) -> JoinHandle<Result<Interpretation, ArcanumError>> {
        tokio::spawn(poll_interpretation(
            self.backend.clone(),
            reading_id,
            self.policy,
            self.cancel.clone(),
        ))
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        // Dropping the session must not leak a polling task.
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use arcanum_test_utils::{three_card_layout, MockBackend};

    async fn session_with(backend: Arc<MockBackend>) -> ReadingSession {
        ReadingSession::begin(backend, PollPolicy::default())
            .await
            .unwrap()
    }

    async fn drawn_session(backend: Arc<MockBackend>) -> ReadingSession {
        drawn_session_with_policy(backend, PollPolicy::default()).await
    }

    async fn drawn_session_with_policy(
        backend: Arc<MockBackend>,
        policy: PollPolicy,
    ) -> ReadingSession {
        let session = ReadingSession::begin(backend, policy).await.unwrap();
        session
            .select_layout(&LayoutId("three-card".into()))
            .await
            .unwrap();
        session.draw_cards(Some("What lies ahead?")).await.unwrap();
        session
    }

    async fn ready_session(backend: Arc<MockBackend>) -> ReadingSession {
        backend.script_ready().await;
        let session = drawn_session(backend).await;
        session.wait_for_interpretation().await.unwrap();
        session
    }

    #[tokio::test]
    async fn begin_starts_in_draft() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;
        assert_eq!(session.stage().await, ReadingStage::Draft);
        assert_eq!(session.reading().await.id, ReadingId("r-1".into()));
        assert_eq!(backend.call_count("create_reading").await, 1);
    }

    #[tokio::test]
    async fn unknown_layout_is_rejected_before_the_network() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;

        let err = session
            .select_layout(&LayoutId("celtic-cross".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)), "got: {err}");
        // The catalog fetch happened; the select call did not.
        assert_eq!(backend.call_count("list_layouts").await, 1);
        assert_eq!(backend.call_count("select_layout").await, 0);
        assert_eq!(session.stage().await, ReadingStage::Draft);
    }

    #[tokio::test]
    async fn reselecting_a_layout_reinvokes_the_backend() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;
        let layout = LayoutId("three-card".into());

        session.select_layout(&layout).await.unwrap();
        session.select_layout(&layout).await.unwrap();
        assert_eq!(backend.call_count("select_layout").await, 2);
        assert_eq!(session.stage().await, ReadingStage::LayoutSelected);
    }

    #[tokio::test]
    async fn drawing_without_a_layout_is_rejected() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;

        let err = session.draw_cards(None).await.unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)), "got: {err}");
        assert_eq!(backend.call_count("draw_cards").await, 0);
    }

    #[tokio::test]
    async fn three_card_scenario_draws_a_position_bijection() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;

        let catalog = session.layouts().await.unwrap();
        let layout = catalog.iter().find(|l| l.id.0 == "three-card").unwrap();
        session.select_layout(&layout.id).await.unwrap();
        let reading = session.draw_cards(None).await.unwrap();

        let cards = reading.cards.as_deref().unwrap();
        assert_eq!(cards.len(), 3);
        let mut positions: Vec<u32> = cards.iter().map(|c| c.position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(reading.cards_complete(&three_card_layout()).is_ok());
        assert_eq!(session.stage().await, ReadingStage::AwaitingInterpretation);
    }

    #[tokio::test]
    async fn whitespace_question_normalizes_to_no_question() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;
        session
            .select_layout(&LayoutId("three-card".into()))
            .await
            .unwrap();

        let reading = session.draw_cards(Some("   ")).await.unwrap();
        assert_eq!(reading.question, None);
    }

    #[tokio::test]
    async fn a_second_draw_is_rejected_after_the_first_succeeds() {
        let backend = MockBackend::new().into_shared();
        let session = drawn_session(backend.clone()).await;

        let err = session.draw_cards(None).await.unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)), "got: {err}");
        assert_eq!(backend.call_count("draw_cards").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_draws_are_rejected_while_one_is_in_flight() {
        let backend = MockBackend::new()
            .with_latency(Duration::from_millis(500))
            .into_shared();
        let session = session_with(backend.clone()).await;
        session
            .select_layout(&LayoutId("three-card".into()))
            .await
            .unwrap();

        let (first, second) = tokio::join!(session.draw_cards(None), session.draw_cards(None));
        assert!(first.is_ok(), "got: {first:?}");
        assert!(
            matches!(second, Err(ArcanumError::ConcurrentOperation(_))),
            "got: {second:?}"
        );
        assert_eq!(backend.call_count("draw_cards").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interpretation_on_final_attempt_reaches_ready() {
        let backend = MockBackend::new().into_shared();
        backend.script_not_ready(14).await;
        backend.script_ready().await;

        let session = drawn_session(backend.clone()).await;
        let interpretation = session.wait_for_interpretation().await.unwrap();

        assert_eq!(session.stage().await, ReadingStage::InterpretationReady);
        assert_eq!(interpretation.card_interpretations.len(), 3);
        assert_eq!(backend.call_count("get_interpretation").await, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_polling_leaves_session_awaiting_and_can_retry() {
        let backend = MockBackend::new().into_shared();
        let session = drawn_session(backend.clone()).await;

        let err = session.wait_for_interpretation().await.unwrap_err();
        assert!(
            matches!(err, ArcanumError::InterpretationUnavailable { attempts: 15 }),
            "got: {err}"
        );
        assert_eq!(session.stage().await, ReadingStage::AwaitingInterpretation);

        // Manual "keep waiting": a fresh round picks up the now-ready result.
        backend.script_ready().await;
        let interpretation = session.wait_for_interpretation().await.unwrap();
        assert_eq!(session.stage().await, ReadingStage::InterpretationReady);
        assert_eq!(interpretation.reading_id, ReadingId("r-1".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn hard_poll_error_surfaces_as_transport() {
        let backend = MockBackend::new().into_shared();
        backend.script_not_ready(1).await;
        backend.script_failure(502).await;

        let session = drawn_session(backend.clone()).await;
        let err = session.wait_for_interpretation().await.unwrap_err();
        assert!(
            matches!(err, ArcanumError::Transport { status: Some(502), .. }),
            "got: {err}"
        );
        assert_eq!(session.stage().await, ReadingStage::AwaitingInterpretation);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_cancels_the_poll() {
        let backend = MockBackend::new().into_shared();
        let session = drawn_session(backend.clone()).await;

        session.abandon();
        let err = session.wait_for_interpretation().await.unwrap_err();
        assert!(matches!(err, ArcanumError::Cancelled), "got: {err}");
        // At most the attempt already in flight; no further scheduling.
        assert!(backend.call_count("get_interpretation").await <= 1);
    }

    #[tokio::test]
    async fn follow_up_requires_a_ready_interpretation() {
        let backend = MockBackend::new().into_shared();
        let session = session_with(backend.clone()).await;

        let err = session.ask_follow_up("why?").await.unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)), "got: {err}");
        assert_eq!(backend.call_count("ask_follow_up").await, 0);
    }

    #[tokio::test]
    async fn empty_follow_up_is_rejected_without_a_network_call() {
        let backend = MockBackend::new().into_shared();
        let session = ready_session(backend.clone()).await;

        let err = session.ask_follow_up("  \t ").await.unwrap_err();
        assert!(matches!(err, ArcanumError::Validation(_)), "got: {err}");
        assert_eq!(backend.call_count("ask_follow_up").await, 0);
    }

    #[tokio::test]
    async fn follow_ups_append_in_order_across_refetches() {
        let backend = MockBackend::new().into_shared();
        let session = ready_session(backend.clone()).await;

        session.ask_follow_up("What about the tower?").await.unwrap();
        let after_first = session.conversation().await;
        assert_eq!(after_first.len(), 1);

        session.ask_follow_up("And the star?").await.unwrap();
        let after_second = session.conversation().await;
        assert_eq!(after_second.len(), 2);
        assert_eq!(after_second[0].question, "What about the tower?");
        assert_eq!(after_second[1].question, "And the star?");

        // A fresh refetch returns the same ordering.
        let refetched = session.refresh_conversation().await.unwrap();
        assert_eq!(refetched, after_second);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_follow_ups_are_rejected() {
        let backend = MockBackend::new()
            .with_latency(Duration::from_millis(500))
            .into_shared();
        backend.script_ready().await;
        let session = drawn_session(backend.clone()).await;
        session.wait_for_interpretation().await.unwrap();

        let (first, second) = tokio::join!(
            session.ask_follow_up("first question"),
            session.ask_follow_up("second question")
        );
        assert!(first.is_ok(), "got: {first:?}");
        assert!(
            matches!(second, Err(ArcanumError::ConcurrentOperation(_))),
            "got: {second:?}"
        );
        assert_eq!(backend.call_count("ask_follow_up").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waits_share_one_polling_round() {
        let backend = MockBackend::new().into_shared();
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 3,
        };
        let session = drawn_session_with_policy(backend.clone(), policy).await;

        // Unscripted backend: the round exhausts. Both waiters must ride
        // the same round and report its outcome.
        let (first, second) = tokio::join!(
            session.wait_for_interpretation(),
            session.wait_for_interpretation()
        );
        assert!(
            matches!(first, Err(ArcanumError::InterpretationUnavailable { attempts: 3 })),
            "got: {first:?}"
        );
        assert!(
            matches!(second, Err(ArcanumError::InterpretationUnavailable { attempts: 3 })),
            "got: {second:?}"
        );
        assert_eq!(backend.call_count("get_interpretation").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waits_both_receive_the_interpretation() {
        let backend = MockBackend::new().into_shared();
        backend.script_not_ready(1).await;
        backend.script_ready().await;
        let session = drawn_session(backend.clone()).await;

        let (first, second) = tokio::join!(
            session.wait_for_interpretation(),
            session.wait_for_interpretation()
        );
        assert_eq!(first.unwrap().id.0, "i-1");
        assert_eq!(second.unwrap().id.0, "i-1");
        assert_eq!(backend.call_count("get_interpretation").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_dropped_mid_round_rejoins_the_same_round() {
        let backend = MockBackend::new().into_shared();
        let session = drawn_session(backend.clone()).await;

        // Give up on the wait partway through the round. The round keeps
        // running; a later wait must pick it up rather than start another.
        let gave_up =
            tokio::time::timeout(Duration::from_millis(500), session.wait_for_interpretation())
                .await;
        assert!(gave_up.is_err(), "expected the wait to time out");

        backend.script_ready().await;
        let interpretation = session.wait_for_interpretation().await.unwrap();
        assert_eq!(interpretation.id.0, "i-1");
        assert_eq!(backend.call_count("get_interpretation").await, 2);
    }

    #[tokio::test]
    async fn wait_after_ready_returns_the_cached_interpretation() {
        let backend = MockBackend::new().into_shared();
        let session = ready_session(backend.clone()).await;
        let calls_before = backend.call_count("get_interpretation").await;

        let interpretation = session.wait_for_interpretation().await.unwrap();
        assert_eq!(interpretation.id.0, "i-1");
        assert_eq!(
            backend.call_count("get_interpretation").await,
            calls_before
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resume_derives_the_stage_from_reading_content() {
        let backend = MockBackend::new().into_shared();

        // Fresh draft resumes into Draft.
        let session = ReadingSession::resume(
            backend.clone(),
            PollPolicy::default(),
            &ReadingId("r-1".into()),
        )
        .await
        .unwrap();
        assert_eq!(session.stage().await, ReadingStage::Draft);

        // Advance the backing reading, then resume again.
        let driver = drawn_session(backend.clone()).await;
        driver.abandon();
        let resumed = ReadingSession::resume(
            backend.clone(),
            PollPolicy::default(),
            &ReadingId("r-1".into()),
        )
        .await
        .unwrap();
        assert_eq!(
            resumed.stage().await,
            ReadingStage::AwaitingInterpretation
        );

        // The resumed session can finish the wait once generation completes.
        backend.script_ready().await;
        resumed.wait_for_interpretation().await.unwrap();
        assert_eq!(resumed.stage().await, ReadingStage::InterpretationReady);
    }
}
