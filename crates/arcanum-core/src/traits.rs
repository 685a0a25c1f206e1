// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backend trait seam between the session layer and the transport.

use async_trait::async_trait;

use crate::error::ArcanumError;
use crate::types::{
    ConversationMessage, Interpretation, InterpretationId, Layout, LayoutId, Reading, ReadingId,
};

/// Typed boundary to the three backend services (layout, reading,
/// interpretation).
///
/// The production implementation is the HTTP gateway; tests drive the
/// controller and poller through a scripted fake. Implementations are
/// stateless from the session's point of view and safe to share across
/// sessions.
#[async_trait]
pub trait TarotBackend: Send + Sync {
    /// Lists the spread layout catalog.
    async fn list_layouts(&self) -> Result<Vec<Layout>, ArcanumError>;

    /// Allocates a new reading session server-side, in its initial draft state.
    async fn create_reading(&self) -> Result<Reading, ArcanumError>;

    /// Fetches an existing reading by id.
    async fn get_reading(&self, reading: &ReadingId) -> Result<Reading, ArcanumError>;

    /// Attaches a layout choice to the reading.
    async fn select_layout(
        &self,
        reading: &ReadingId,
        layout: &LayoutId,
    ) -> Result<Reading, ArcanumError>;

    /// Triggers card drawing, recording the optional free-text question.
    /// Not idempotent: each call produces an independent server-side draw.
    async fn draw_cards(
        &self,
        reading: &ReadingId,
        question: Option<&str>,
    ) -> Result<Reading, ArcanumError>;

    /// Fetches the interpretation for a reading. Fails with
    /// [`ArcanumError::NotFound`] while generation is still in progress.
    async fn get_interpretation(
        &self,
        reading: &ReadingId,
    ) -> Result<Interpretation, ArcanumError>;

    /// Appends one follow-up Q&A turn to an interpretation's conversation.
    async fn ask_follow_up(
        &self,
        interpretation: &InterpretationId,
        question: &str,
    ) -> Result<ConversationMessage, ArcanumError>;

    /// Returns the full ordered conversation history.
    async fn get_conversation(
        &self,
        interpretation: &InterpretationId,
    ) -> Result<Vec<ConversationMessage>, ArcanumError>;
}
