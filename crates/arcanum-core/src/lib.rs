// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Arcanum tarot reading client.
//!
//! This crate provides the domain model shared by the gateway, session
//! controller, and poller: wire types for the three backend services, the
//! error taxonomy, and the [`TarotBackend`] trait that decouples session
//! logic from transport.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ArcanumError;
pub use traits::TarotBackend;
pub use types::{
    CardId, CardInterpretation, ConversationMessage, DrawnCard, Interpretation,
    InterpretationId, Layout, LayoutId, LayoutPosition, MessageId, Orientation, Reading,
    ReadingId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn orientation_round_trips_display_and_from_str() {
        for orientation in [Orientation::Upright, Orientation::Reversed] {
            let s = orientation.to_string();
            assert_eq!(Orientation::from_str(&s).unwrap(), orientation);
        }
    }

    #[test]
    fn orientation_serializes_lowercase() {
        let json = serde_json::to_string(&Orientation::Reversed).unwrap();
        assert_eq!(json, "\"reversed\"");
    }

    #[test]
    fn id_newtypes_are_cloneable_and_comparable() {
        let rid = ReadingId("r-1".into());
        assert_eq!(rid.clone(), rid);
        let lid = LayoutId("three-card".into());
        assert_eq!(lid.to_string(), "three-card");
    }
}
