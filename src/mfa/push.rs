//! Push challenge polling.
//!
//! One deadline is computed at entry. Each iteration issues a single poll call
//! (bounded by whatever budget remains), then waits a fixed interval. The wait
//! and the in-flight call both observe the caller's cancellation token.

use crate::{
    config::IdentityConfig,
    error::AuthError,
    remote::{FactorResult, IdentityProvider, PushPollResult},
};
use rand::Rng;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_PUSH_TIMEOUT_SECONDS: u64 = 90;
pub const DEFAULT_PUSH_INTERVAL_SECONDS: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushSettings {
    timeout: Duration,
    interval: Duration,
    jitter: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl PushSettings {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECONDS),
            interval: Duration::from_secs(DEFAULT_PUSH_INTERVAL_SECONDS),
            jitter: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Extra random delay added on top of the interval, never subtracted.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn next_wait(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }

        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.interval + Duration::from_millis(extra)
    }
}

/// Drives a push challenge to a terminal answer.
pub struct PushPoller {
    provider: Arc<dyn IdentityProvider>,
    config: Arc<IdentityConfig>,
    settings: PushSettings,
}

impl PushPoller {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        config: Arc<IdentityConfig>,
        settings: PushSettings,
    ) -> Self {
        Self {
            provider,
            config,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PushSettings {
        &self.settings
    }

    /// Poll the challenge at `challenge_ref` until it resolves.
    ///
    /// # Errors
    /// - `Configuration` if `challenge_ref` cannot be resolved to an address
    /// - `MfaDenied` when the push is rejected
    /// - `MfaTimeout` when the provider reports a timeout or the deadline elapses
    /// - `Cancelled` when `cancel` fires
    /// - `RemoteUnavailable` when a poll call fails
    #[instrument(skip(self, state_token, cancel))]
    pub async fn poll(
        &self,
        challenge_ref: &str,
        state_token: &SecretString,
        cancel: &CancellationToken,
    ) -> Result<PushPollResult, AuthError> {
        let url = self.config.resolve_url(challenge_ref).ok_or_else(|| {
            AuthError::Configuration(format!("invalid verify URL: {challenge_ref}"))
        })?;

        let deadline = Instant::now() + self.settings.timeout;
        let mut last: Option<PushPollResult> = None;
        let mut attempts: u32 = 0;

        while Instant::now() < deadline {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthError::Cancelled),
                outcome = timeout(remaining, self.provider.advance_challenge(&url, state_token)) => {
                    match outcome {
                        Ok(result) => result?,
                        Err(_) => {
                            warn!("push poll call outlived the challenge deadline");
                            break;
                        }
                    }
                }
            };

            if result.is_success() {
                info!("push challenge approved after {} polls", attempts);
                return Ok(result);
            }

            match result.factor_result {
                FactorResult::Rejected => {
                    return Err(AuthError::MfaDenied("MFA push rejected".to_string()));
                }
                FactorResult::Timeout => {
                    return Err(AuthError::MfaTimeout("MFA push timed out".to_string()));
                }
                FactorResult::Pending | FactorResult::Success => {}
            }

            debug!("push challenge pending: {}", result.describe());
            last = Some(result);

            let wake = (Instant::now() + self.settings.next_wait()).min(deadline);
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthError::Cancelled),
                () = sleep_until(wake) => {}
            }
        }

        let reason = last
            .as_ref()
            .map_or("MFA push timeout", PushPollResult::describe)
            .to_string();

        warn!("push challenge unresolved after {} polls: {}", attempts, reason);

        Err(AuthError::MfaTimeout(reason))
    }
}
