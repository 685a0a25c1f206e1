// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock backend for deterministic controller and poller tests.
//!
//! `MockBackend` implements [`TarotBackend`] entirely in memory: a scripted
//! queue of interpretation outcomes, a mutable reading that advances through
//! the draw flow, and an append-only conversation log. Every call is
//! recorded so tests can assert on what did (and did not) hit the backend.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use arcanum_core::types::{
    CardId, CardInterpretation, ConversationMessage, DrawnCard, Interpretation,
    InterpretationId, Layout, LayoutId, LayoutPosition, MessageId, Orientation, Reading,
    ReadingId,
};
use arcanum_core::{ArcanumError, TarotBackend};

/// Scripted outcome for one `get_interpretation` attempt.
pub enum InterpretationStep {
    /// Resource not generated yet (the retried case).
    NotReady,
    /// Generation finished; return an interpretation built from the
    /// reading's state at fetch time, not at script time.
    Ready,
    /// A hard failure with this status code.
    Fail(u16),
}

/// In-memory [`TarotBackend`] with scripted responses and call recording.
pub struct MockBackend {
    layouts: Vec<Layout>,
    reading: Mutex<Reading>,
    interpretation_steps: Mutex<VecDeque<InterpretationStep>>,
    conversation: Mutex<Vec<ConversationMessage>>,
    calls: Mutex<Vec<String>>,
    /// Artificial latency per call, so in-flight guards are observable
    /// under paused time.
    latency: Option<Duration>,
}

impl MockBackend {
    /// Creates a mock with the standard three-card layout catalog and a
    /// fresh draft reading.
    pub fn new() -> Self {
        Self {
            layouts: vec![three_card_layout()],
            reading: Mutex::new(draft_reading()),
            interpretation_steps: Mutex::new(VecDeque::new()),
            conversation: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Replaces the layout catalog.
    pub fn with_layouts(mut self, layouts: Vec<Layout>) -> Self {
        self.layouts = layouts;
        self
    }

    /// Adds artificial latency to every backend call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Wraps the mock for sharing with a session.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Scripts `count` "not generated yet" responses.
    pub async fn script_not_ready(&self, count: u32) {
        let mut steps = self.interpretation_steps.lock().await;
        for _ in 0..count {
            steps.push_back(InterpretationStep::NotReady);
        }
    }

    /// Scripts a successful interpretation for the current reading.
    pub async fn script_ready(&self) {
        self.interpretation_steps
            .lock()
            .await
            .push_back(InterpretationStep::Ready);
    }

    /// Scripts a hard failure with the given HTTP status.
    pub async fn script_failure(&self, status: u16) {
        self.interpretation_steps
            .lock()
            .await
            .push_back(InterpretationStep::Fail(status));
    }

    /// Number of recorded calls to `operation`.
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| *c == operation)
            .count()
    }

    /// Total number of recorded backend calls.
    pub async fn total_calls(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn record(&self, operation: &str) {
        self.calls.lock().await.push(operation.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Builds an interpretation matching the current reading's drawn cards.
    async fn canned_interpretation(&self) -> Interpretation {
        let reading = self.reading.lock().await;
        let cards = reading.cards.clone().unwrap_or_default();
        Interpretation {
            id: InterpretationId("i-1".into()),
            reading_id: reading.id.clone(),
            layout_id: reading
                .layout_id
                .clone()
                .unwrap_or_else(|| LayoutId("three-card".into())),
            question: reading.question.clone(),
            card_interpretations: cards
                .iter()
                .map(|card| CardInterpretation {
                    card_id: card.id.clone(),
                    card_name: card.name.clone(),
                    position: card.position,
                    position_name: card.position_name.clone(),
                    interpretation: format!("{} speaks of change.", card.name),
                })
                .collect(),
            overall_theme: "Transition".into(),
            narrative: "The cards describe a threshold being crossed.".into(),
            created_at: "2026-01-01T00:02:00Z".into(),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TarotBackend for MockBackend {
    async fn list_layouts(&self) -> Result<Vec<Layout>, ArcanumError> {
        self.record("list_layouts").await;
        Ok(self.layouts.clone())
    }

    async fn create_reading(&self) -> Result<Reading, ArcanumError> {
        self.record("create_reading").await;
        Ok(self.reading.lock().await.clone())
    }

    async fn get_reading(&self, reading: &ReadingId) -> Result<Reading, ArcanumError> {
        self.record("get_reading").await;
        let current = self.reading.lock().await;
        if current.id != *reading {
            return Err(ArcanumError::transport(
                "get_reading",
                Some(404),
                "no such reading",
            ));
        }
        Ok(current.clone())
    }

    async fn select_layout(
        &self,
        reading: &ReadingId,
        layout: &LayoutId,
    ) -> Result<Reading, ArcanumError> {
        self.record("select_layout").await;
        let chosen = self
            .layouts
            .iter()
            .find(|l| l.id == *layout)
            .ok_or_else(|| {
                ArcanumError::transport("select_layout", Some(422), "unknown layout")
            })?;
        let mut current = self.reading.lock().await;
        if current.id != *reading {
            return Err(ArcanumError::transport(
                "select_layout",
                Some(404),
                "no such reading",
            ));
        }
        current.layout_id = Some(chosen.id.clone());
        current.layout_name = Some(chosen.name.clone());
        current.status = "layout_selected".into();
        Ok(current.clone())
    }

    async fn draw_cards(
        &self,
        reading: &ReadingId,
        question: Option<&str>,
    ) -> Result<Reading, ArcanumError> {
        self.record("draw_cards").await;
        let mut current = self.reading.lock().await;
        if current.id != *reading {
            return Err(ArcanumError::transport(
                "draw_cards",
                Some(404),
                "no such reading",
            ));
        }
        let layout_id = current.layout_id.clone().ok_or_else(|| {
            ArcanumError::transport("draw_cards", Some(409), "no layout selected")
        })?;
        let layout = self
            .layouts
            .iter()
            .find(|l| l.id == layout_id)
            .expect("scripted layout exists");
        current.question = question.map(str::to_string);
        current.cards = Some(
            layout
                .positions
                .iter()
                .map(|slot| DrawnCard {
                    id: CardId(format!("card-{}", slot.position)),
                    name: format!("Card {}", slot.position),
                    arcana: "major".into(),
                    suit: None,
                    number: None,
                    position: slot.position,
                    orientation: if slot.position % 2 == 0 {
                        Orientation::Upright
                    } else {
                        Orientation::Reversed
                    },
                    position_name: slot.name.clone(),
                    position_description: slot.description.clone(),
                })
                .collect(),
        );
        current.status = "cards_drawn".into();
        Ok(current.clone())
    }

    async fn get_interpretation(
        &self,
        _reading: &ReadingId,
    ) -> Result<Interpretation, ArcanumError> {
        self.record("get_interpretation").await;
        let step = self.interpretation_steps.lock().await.pop_front();
        match step {
            Some(InterpretationStep::Ready) => Ok(self.canned_interpretation().await),
            Some(InterpretationStep::Fail(status)) => Err(ArcanumError::transport(
                "get_interpretation",
                Some(status),
                "backend failure",
            )),
            // Unscripted attempts behave like an interpretation that never
            // finishes generating.
            Some(InterpretationStep::NotReady) | None => Err(ArcanumError::NotFound {
                operation: "get_interpretation".into(),
            }),
        }
    }

    async fn ask_follow_up(
        &self,
        interpretation: &InterpretationId,
        question: &str,
    ) -> Result<ConversationMessage, ArcanumError> {
        self.record("ask_follow_up").await;
        let mut conversation = self.conversation.lock().await;
        let message = ConversationMessage {
            id: MessageId(format!("m-{}", conversation.len() + 1)),
            interpretation_id: interpretation.clone(),
            question: question.to_string(),
            answer: format!("Answer to: {question}"),
            created_at: format!("2026-01-01T00:0{}:00Z", conversation.len() + 3),
        };
        conversation.push(message.clone());
        Ok(message)
    }

    async fn get_conversation(
        &self,
        _interpretation: &InterpretationId,
    ) -> Result<Vec<ConversationMessage>, ArcanumError> {
        self.record("get_conversation").await;
        Ok(self.conversation.lock().await.clone())
    }
}

/// The standard three-card spread used across tests.
pub fn three_card_layout() -> Layout {
    Layout {
        id: LayoutId("three-card".into()),
        name: "Three Card".into(),
        description: "Past, present, future".into(),
        card_count: 3,
        positions: vec![
            LayoutPosition {
                position: 0,
                name: "Past".into(),
                description: "What came before".into(),
            },
            LayoutPosition {
                position: 1,
                name: "Present".into(),
                description: "Where things stand".into(),
            },
            LayoutPosition {
                position: 2,
                name: "Future".into(),
                description: "What approaches".into(),
            },
        ],
    }
}

/// A fresh draft reading, as `create_reading` would return it.
pub fn draft_reading() -> Reading {
    Reading {
        id: ReadingId("r-1".into()),
        status: "draft".into(),
        layout_id: None,
        layout_name: None,
        question: None,
        cards: None,
        seed: None,
        created_at: "2026-01-01T00:00:00Z".into(),
        updated_at: "2026-01-01T00:00:00Z".into(),
    }
}
