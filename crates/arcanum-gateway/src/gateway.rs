// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of [`TarotBackend`] against the three backend
//! services.
//!
//! The gateway is stateless and safe to reuse across sessions. It owns HTTP
//! error normalization: network failures and non-2xx responses become
//! [`ArcanumError::Transport`] carrying the operation name and status, with
//! one exception -- a 404 from `get_interpretation` becomes
//! [`ArcanumError::NotFound`], the poller's retry signal. No retries happen
//! at this layer.

use std::time::Duration;

use arcanum_config::ServicesConfig;
use arcanum_core::types::{
    ConversationMessage, Interpretation, InterpretationId, Layout, LayoutId, Reading, ReadingId,
};
use arcanum_core::{ArcanumError, TarotBackend};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::envelopes::{
    InterpretationEnvelope, LayoutsEnvelope, MessageEnvelope, MessagesEnvelope, ReadingEnvelope,
};

/// Request body for the draw endpoint. The `question` key is omitted
/// entirely when no question was asked; the reading service distinguishes
/// an absent key from an explicit null.
#[derive(Serialize)]
struct DrawCardsBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<&'a str>,
}

/// HTTP gateway to the layout, reading, and interpretation services.
#[derive(Debug, Clone)]
pub struct ServiceGateway {
    client: reqwest::Client,
    reading_url: String,
    layout_url: String,
    interpretation_url: String,
}

impl ServiceGateway {
    /// Creates a gateway from explicit service configuration.
    ///
    /// Base URLs come from the config struct, never from ambient globals,
    /// so tests can point each service at its own mock server.
    pub fn new(config: &ServicesConfig) -> Result<Self, ArcanumError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArcanumError::Transport {
                operation: "build_client".into(),
                status: None,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            reading_url: config.reading_url.trim_end_matches('/').to_string(),
            layout_url: config.layout_url.trim_end_matches('/').to_string(),
            interpretation_url: config.interpretation_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends a request and unwraps the JSON envelope, normalizing failures.
    ///
    /// `not_found_is_pending`: map a 404 to [`ArcanumError::NotFound`]
    /// instead of a transport error. Only `get_interpretation` sets this.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
        not_found_is_pending: bool,
    ) -> Result<T, ArcanumError> {
        let response = request.send().await.map_err(|e| ArcanumError::Transport {
            operation: operation.to_string(),
            status: None,
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(operation, status = %status, "response received");

        if status == StatusCode::NOT_FOUND && not_found_is_pending {
            return Err(ArcanumError::NotFound {
                operation: operation.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArcanumError::transport(
                operation,
                Some(status.as_u16()),
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body
                },
            ));
        }

        let body = response.text().await.map_err(|e| ArcanumError::Transport {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        serde_json::from_str(&body).map_err(|e| ArcanumError::Transport {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            message: format!("malformed response body: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl TarotBackend for ServiceGateway {
    async fn list_layouts(&self) -> Result<Vec<Layout>, ArcanumError> {
        let url = format!("{}/layouts", self.layout_url);
        let envelope: LayoutsEnvelope = self
            .execute("list_layouts", self.client.get(&url), false)
            .await?;
        Ok(envelope.layouts)
    }

    async fn create_reading(&self) -> Result<Reading, ArcanumError> {
        let url = format!("{}/readings", self.reading_url);
        let envelope: ReadingEnvelope = self
            .execute("create_reading", self.client.post(&url), false)
            .await?;
        Ok(envelope.reading)
    }

    async fn get_reading(&self, reading: &ReadingId) -> Result<Reading, ArcanumError> {
        let url = format!("{}/readings/{}", self.reading_url, reading.0);
        let envelope: ReadingEnvelope = self
            .execute("get_reading", self.client.get(&url), false)
            .await?;
        Ok(envelope.reading)
    }

    async fn select_layout(
        &self,
        reading: &ReadingId,
        layout: &LayoutId,
    ) -> Result<Reading, ArcanumError> {
        let url = format!("{}/readings/{}/layout", self.reading_url, reading.0);
        let body = serde_json::json!({ "layoutId": layout });
        let envelope: ReadingEnvelope = self
            .execute("select_layout", self.client.post(&url).json(&body), false)
            .await?;
        Ok(envelope.reading)
    }

    async fn draw_cards(
        &self,
        reading: &ReadingId,
        question: Option<&str>,
    ) -> Result<Reading, ArcanumError> {
        let url = format!("{}/readings/{}/draw", self.reading_url, reading.0);
        let body = DrawCardsBody { question };
        let envelope: ReadingEnvelope = self
            .execute("draw_cards", self.client.post(&url).json(&body), false)
            .await?;
        Ok(envelope.reading)
    }

    async fn get_interpretation(
        &self,
        reading: &ReadingId,
    ) -> Result<Interpretation, ArcanumError> {
        let url = format!(
            "{}/interpretations/reading/{}",
            self.interpretation_url, reading.0
        );
        let envelope: InterpretationEnvelope = self
            .execute("get_interpretation", self.client.get(&url), true)
            .await?;
        Ok(envelope.interpretation)
    }

    async fn ask_follow_up(
        &self,
        interpretation: &InterpretationId,
        question: &str,
    ) -> Result<ConversationMessage, ArcanumError> {
        if question.trim().is_empty() {
            return Err(ArcanumError::Validation(
                "follow-up question must not be empty".into(),
            ));
        }
        let url = format!(
            "{}/interpretations/{}/follow-up",
            self.interpretation_url, interpretation.0
        );
        let body = serde_json::json!({ "question": question });
        let envelope: MessageEnvelope = self
            .execute("ask_follow_up", self.client.post(&url).json(&body), false)
            .await?;
        Ok(envelope.message)
    }

    async fn get_conversation(
        &self,
        interpretation: &InterpretationId,
    ) -> Result<Vec<ConversationMessage>, ArcanumError> {
        let url = format!(
            "{}/interpretations/{}/conversation",
            self.interpretation_url, interpretation.0
        );
        let envelope: MessagesEnvelope = self
            .execute("get_conversation", self.client.get(&url), false)
            .await?;
        Ok(envelope.messages)
    }
}
