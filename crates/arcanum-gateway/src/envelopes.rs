// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON response envelopes used by the backend services.
//!
//! Every service wraps its payload in a single-key object. Unwrapping
//! happens here, at the gateway boundary, so a malformed body fails fast as
//! a transport error instead of leaking into the session state machine.

use arcanum_core::types::{ConversationMessage, Interpretation, Layout, Reading};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct LayoutsEnvelope {
    pub layouts: Vec<Layout>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadingEnvelope {
    pub reading: Reading,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterpretationEnvelope {
    pub interpretation: Interpretation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageEnvelope {
    pub message: ConversationMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesEnvelope {
    pub messages: Vec<ConversationMessage>,
}
