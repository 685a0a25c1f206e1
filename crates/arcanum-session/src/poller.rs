// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-retry wait for an interpretation that may not exist yet.
//!
//! Interpretation generation is asynchronous server-side and can take tens
//! of seconds. The poller bridges that to a "wait until ready" contract:
//! fixed interval, fixed attempt cap, cancellation between attempts. Fixed
//! rather than exponential backoff is deliberate -- generation latency is
//! bounded and roughly constant, so predictable worst-case latency wins.

use std::sync::Arc;
use std::time::Duration;

use arcanum_config::PollerConfig;
use arcanum_core::types::{Interpretation, ReadingId};
use arcanum_core::{ArcanumError, TarotBackend};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Retry policy for interpretation polling.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Wait between attempts. Sleeps happen only *between* attempts, so a
    /// full exhaustion of N attempts waits (N-1) intervals.
    pub interval: Duration,
    /// Maximum number of `get_interpretation` attempts.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 15,
        }
    }
}

impl From<&PollerConfig> for PollPolicy {
    fn from(config: &PollerConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Polls for a reading's interpretation until it appears, a hard error
/// occurs, the attempt budget runs out, or the token is cancelled.
///
/// Attempts are serialized: a new attempt is never issued until the previous
/// one has resolved. Only [`ArcanumError::NotFound`] is retried; any other
/// failure propagates immediately. Budget exhaustion surfaces as
/// [`ArcanumError::InterpretationUnavailable`], never as the last raw
/// `NotFound`. Cancellation is cooperative: it prevents scheduling the next
/// attempt but cannot abort one already in flight.
pub async fn poll_interpretation(
    backend: Arc<dyn TarotBackend>,
    reading: ReadingId,
    policy: PollPolicy,
    cancel: CancellationToken,
) -> Result<Interpretation, ArcanumError> {
    if cancel.is_cancelled() {
        return Err(ArcanumError::Cancelled);
    }

    for attempt in 1..=policy.max_attempts {
        debug!(reading = %reading, attempt, max = policy.max_attempts, "polling interpretation");

        match backend.get_interpretation(&reading).await {
            Ok(interpretation) => {
                info!(reading = %reading, attempt, "interpretation ready");
                return Ok(interpretation);
            }
            Err(err) if err.is_not_found() => {
                if attempt == policy.max_attempts {
                    warn!(
                        reading = %reading,
                        attempts = policy.max_attempts,
                        "interpretation polling budget exhausted"
                    );
                    return Err(ArcanumError::InterpretationUnavailable {
                        attempts: policy.max_attempts,
                    });
                }
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(reading = %reading, attempt, "polling cancelled during wait");
                        return Err(ArcanumError::Cancelled);
                    }
                    _ = tokio::time::sleep(policy.interval) => {}
                }
            }
            Err(err) => {
                warn!(reading = %reading, attempt, error = %err, "polling aborted on hard error");
                return Err(err);
            }
        }
    }

    // Reachable only with max_attempts == 0.
    Err(ArcanumError::InterpretationUnavailable { attempts: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanum_test_utils::MockBackend;
    use tokio::time::Instant;

    fn reading() -> ReadingId {
        ReadingId("r-1".into())
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_immediately_on_first_success() {
        let backend = MockBackend::new().into_shared();
        backend.script_ready().await;

        let start = Instant::now();
        let result = poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            CancellationToken::new(),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(backend.call_count("get_interpretation").await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_the_final_attempt() {
        let backend = MockBackend::new().into_shared();
        backend.script_not_ready(14).await;
        backend.script_ready().await;

        let start = Instant::now();
        let result = poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            CancellationToken::new(),
        )
        .await;

        assert!(result.is_ok(), "got: {result:?}");
        assert_eq!(backend.call_count("get_interpretation").await, 15);
        // 14 waits of 2s between the 15 attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(28));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_surfaces_interpretation_unavailable() {
        // Unscripted attempts always report "not generated yet".
        let backend = MockBackend::new().into_shared();

        let start = Instant::now();
        let err = poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            ArcanumError::InterpretationUnavailable { attempts } => assert_eq!(attempts, 15),
            other => panic!("expected InterpretationUnavailable, got {other}"),
        }
        assert_eq!(backend.call_count("get_interpretation").await, 15);
        assert!(start.elapsed() >= Duration::from_secs(28));
    }

    #[tokio::test(start_paused = true)]
    async fn hard_error_propagates_without_further_retries() {
        let backend = MockBackend::new().into_shared();
        backend.script_not_ready(2).await;
        backend.script_failure(500).await;

        let err = poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(
            matches!(err, ArcanumError::Transport { status: Some(500), .. }),
            "got: {err}"
        );
        assert_eq!(backend.call_count("get_interpretation").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_scheduling_further_attempts() {
        let backend = MockBackend::new().into_shared();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            cancel.clone(),
        ));

        // Let the first attempt run and park in its inter-attempt wait.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ArcanumError::Cancelled), "got: {err}");
        assert_eq!(backend.call_count("get_interpretation").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_short_circuits() {
        let backend = MockBackend::new().into_shared();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poll_interpretation(
            backend.clone(),
            reading(),
            PollPolicy::default(),
            cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ArcanumError::Cancelled));
        assert_eq!(backend.total_calls().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_bounds_are_respected() {
        let backend = MockBackend::new().into_shared();
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            max_attempts: 3,
        };

        let start = Instant::now();
        let err = poll_interpretation(backend.clone(), reading(), policy, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ArcanumError::InterpretationUnavailable { attempts: 3 }
        ));
        assert_eq!(backend.call_count("get_interpretation").await, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }
}
