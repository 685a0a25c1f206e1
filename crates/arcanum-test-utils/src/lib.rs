// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Arcanum integration tests.
//!
//! Provides a scripted in-memory backend for fast, deterministic,
//! CI-runnable tests without the three HTTP services.
//!
//! # Components
//!
//! - [`MockBackend`] - Scripted [`arcanum_core::TarotBackend`] with call recording
//! - [`three_card_layout`] / [`draft_reading`] - Shared fixtures

pub mod mock_backend;

pub use mock_backend::{draft_reading, three_card_layout, InterpretationStep, MockBackend};
