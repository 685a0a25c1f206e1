// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service Gateway for the Arcanum reading client.
//!
//! Translates domain operations into HTTP calls against the three backend
//! services (layout, reading, interpretation) and normalizes failures into
//! the shared error taxonomy. See [`ServiceGateway`].

mod envelopes;
mod gateway;

pub use gateway::ServiceGateway;
