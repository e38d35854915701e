//! Step-up (MFA) handling.
//!
//! Only out-of-band push approval from an accepted provider is supported.
//! Other enrolled factors (TOTP, SMS, ...) are ignored during selection.

pub mod push;

use crate::remote::{Factor, FactorType};

pub use push::{PushPoller, PushSettings};

/// Providers whose push factor can be polled.
pub const ACCEPTED_PUSH_PROVIDERS: &[&str] = &["OKTA", "OKTA_VERIFY"];

/// First push factor from an accepted provider that carries a challenge reference.
#[must_use]
pub fn select_push_factor(factors: &[Factor]) -> Option<&str> {
    factors
        .iter()
        .filter(|factor| factor.factor_type == FactorType::Push)
        .filter(|factor| ACCEPTED_PUSH_PROVIDERS.contains(&factor.provider.as_str()))
        .find_map(|factor| factor.challenge_ref.as_deref())
}
