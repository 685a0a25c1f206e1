// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading session orchestration for the Arcanum client.
//!
//! Two pieces live here: the [`ReadingSession`] controller, which drives a
//! reading through its lifecycle against a [`arcanum_core::TarotBackend`],
//! and the interpretation poller, which bridges the backend's asynchronous
//! interpretation generation to a bounded "wait until ready" call.

pub mod controller;
pub mod poller;

pub use controller::{ReadingSession, ReadingStage};
pub use poller::{poll_interpretation, PollPolicy};
