// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Arcanum workspace.
//!
//! These mirror the JSON bodies the three backend services exchange, so every
//! struct uses camelCase wire names. Schema validation happens once, at the
//! gateway boundary: a body that fails to deserialize never reaches the
//! session state machine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ArcanumError;

/// Unique identifier for a reading session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingId(pub String);

/// Unique identifier for a spread layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutId(pub String);

/// Unique identifier for a generated interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterpretationId(pub String);

/// Unique identifier for a tarot card definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub String);

/// Unique identifier for a conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for ReadingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for LayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for InterpretationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orientation of a drawn card, fixed at draw time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Orientation {
    Upright,
    Reversed,
}

/// One position slot within a spread layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPosition {
    /// Zero-based index of the slot within the spread.
    pub position: u32,
    pub name: String,
    pub description: String,
}

/// A named spread template defining an ordered set of card positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: LayoutId,
    pub name: String,
    pub description: String,
    pub card_count: u32,
    pub positions: Vec<LayoutPosition>,
}

impl Layout {
    /// Checks the layout's structural invariants: `card_count` matches the
    /// number of positions, and position indices are contiguous from zero.
    pub fn validate(&self) -> Result<(), ArcanumError> {
        if self.card_count as usize != self.positions.len() {
            return Err(ArcanumError::Validation(format!(
                "layout `{}` declares {} cards but has {} positions",
                self.id,
                self.card_count,
                self.positions.len()
            )));
        }
        for (index, slot) in self.positions.iter().enumerate() {
            if slot.position as usize != index {
                return Err(ArcanumError::Validation(format!(
                    "layout `{}` position at index {index} carries index {}",
                    self.id, slot.position
                )));
            }
        }
        Ok(())
    }
}

/// A tarot card placed in a specific spread position.
///
/// Card identity fields (`name`, `arcana`, `suit`, `number`) come from the
/// static card definition; `position_name`/`position_description` are bound
/// from the chosen layout at draw time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnCard {
    pub id: CardId,
    pub name: String,
    pub arcana: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Index into the layout's positions.
    pub position: u32,
    pub orientation: Orientation,
    pub position_name: String,
    pub position_description: String,
}

impl DrawnCard {
    /// Image asset file name under the static card-art path convention.
    pub fn image_file(&self, ext: &str) -> String {
        format!("{}.{ext}", self.id.0)
    }
}

/// One user reading session: a layout choice, drawn cards, and an optional
/// free-text question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: ReadingId,
    /// Backend status string. The session controller derives its own stage
    /// from observable content rather than trusting this vocabulary.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<LayoutId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Absent until cards are drawn, then fixed-length == layout card count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<DrawnCard>>,
    /// Shuffle seed recorded by the reading service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Reading {
    /// True once the backend has populated the drawn cards.
    pub fn has_cards(&self) -> bool {
        self.cards.as_ref().is_some_and(|cards| !cards.is_empty())
    }

    /// Verifies the drawn cards form a bijection onto the layout's position
    /// indices: exactly `card_count` cards, each index 0..card_count once.
    pub fn cards_complete(&self, layout: &Layout) -> Result<(), ArcanumError> {
        let cards = self.cards.as_deref().ok_or_else(|| {
            ArcanumError::Validation(format!("reading `{}` has no drawn cards", self.id))
        })?;
        if cards.len() != layout.card_count as usize {
            return Err(ArcanumError::Validation(format!(
                "reading `{}` has {} cards, layout `{}` expects {}",
                self.id,
                cards.len(),
                layout.id,
                layout.card_count
            )));
        }
        let mut seen = vec![false; layout.card_count as usize];
        for card in cards {
            let slot = card.position as usize;
            if slot >= seen.len() || seen[slot] {
                return Err(ArcanumError::Validation(format!(
                    "reading `{}` card `{}` has invalid or duplicate position {}",
                    self.id, card.name, card.position
                )));
            }
            seen[slot] = true;
        }
        Ok(())
    }
}

/// Per-card commentary within an interpretation, 1:1 with drawn cards by
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInterpretation {
    pub card_id: CardId,
    pub card_name: String,
    pub position: u32,
    pub position_name: String,
    pub interpretation: String,
}

/// Backend-generated narrative and per-card commentary for a completed
/// reading. Owned by the interpretation service; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub id: InterpretationId,
    pub reading_id: ReadingId,
    pub layout_id: LayoutId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub card_interpretations: Vec<CardInterpretation>,
    pub overall_theme: String,
    pub narrative: String,
    pub created_at: String,
}

/// One follow-up Q&A turn in the append-only conversation log attached to
/// an interpretation. Never mutated or deleted; the client always re-reads
/// the full log rather than merging locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: MessageId,
    pub interpretation_id: InterpretationId,
    pub question: String,
    pub answer: String,
    pub created_at: String,
}
