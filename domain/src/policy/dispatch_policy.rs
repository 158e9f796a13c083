//! Dispatch policy: per-run timeout and retry behavior.
//!
//! [`Policy`] is resolved once per run from the `settings` table. Each value
//! that is missing or unparseable falls back to [`PolicyDefaults`]; the
//! fallbacks taken are reported alongside the policy so callers can log them.

use crate::policy::setting_key::{self, SettingKeyInfo};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff between attempts of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBackoff {
    pub base: Duration,
}

impl RetryBackoff {
    pub const fn none() -> Self {
        Self {
            base: Duration::ZERO,
        }
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self {
            base: Duration::from_millis(ms),
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
    /// capped at [`MAX_BACKOFF`].
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base.is_zero() || retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Built-in values used when a setting is absent or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDefaults {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

/// Why a setting did not contribute to the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Missing,
    Invalid(String),
}

/// A setting that fell back to its built-in value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFallback {
    pub key: &'static str,
    pub reason: FallbackReason,
}

/// Resolved {timeout, max_retries} pair governing one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Deadline of a single attempt
    pub timeout: Duration,
    /// Additional attempts after a transient failure
    pub max_retries: u32,
    pub backoff: RetryBackoff,
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_defaults(&PolicyDefaults::default())
    }
}

impl Policy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            backoff: RetryBackoff::none(),
        }
    }

    pub fn from_defaults(defaults: &PolicyDefaults) -> Self {
        Self {
            timeout: Duration::from_secs(defaults.timeout_secs.max(1)),
            max_retries: defaults.max_retries,
            backoff: RetryBackoff::from_millis(defaults.retry_backoff_ms),
        }
    }

    pub fn with_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Upper bound on attempts per lane.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Resolve a policy from raw setting values.
    ///
    /// `lookup` returns the stored value of a key, if any.
    pub fn from_settings<F>(defaults: &PolicyDefaults, lookup: F) -> (Self, Vec<PolicyFallback>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fallbacks = Vec::new();
        let mut read = |key: &'static str, default: u64| -> u64 {
            let Some(info) = setting_key::lookup_key(key) else {
                return default;
            };
            match lookup(key) {
                None => {
                    fallbacks.push(PolicyFallback {
                        key,
                        reason: FallbackReason::Missing,
                    });
                    default
                }
                Some(raw) => match parse(info, &raw) {
                    Some(v) => v,
                    None => {
                        fallbacks.push(PolicyFallback {
                            key,
                            reason: FallbackReason::Invalid(raw),
                        });
                        default
                    }
                },
            }
        };

        let timeout_secs = read(setting_key::DEFAULT_TIMEOUT, defaults.timeout_secs.max(1));
        let max_retries = read(setting_key::MAX_RETRIES, u64::from(defaults.max_retries));
        let backoff_ms = read(setting_key::RETRY_BACKOFF_MS, defaults.retry_backoff_ms);

        let policy = Self {
            timeout: Duration::from_secs(timeout_secs),
            max_retries: u32::try_from(max_retries).unwrap_or(u32::MAX),
            backoff: RetryBackoff::from_millis(backoff_ms),
        };
        (policy, fallbacks)
    }
}

fn parse(info: &SettingKeyInfo, raw: &str) -> Option<u64> {
    setting_key::parse_numeric(info, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_all_settings_present() {
        let store = settings(&[
            ("default_timeout", "5"),
            ("max_retries", "3"),
            ("retry_backoff_ms", "100"),
        ]);
        let (policy, fallbacks) =
            Policy::from_settings(&PolicyDefaults::default(), |k| store.get(k).cloned());
        assert_eq!(policy.timeout, Duration::from_secs(5));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff, RetryBackoff::from_millis(100));
        assert_eq!(policy.max_attempts(), 4);
        assert!(fallbacks.is_empty());
    }

    #[test]
    fn test_missing_and_garbage_fall_back() {
        let store = settings(&[("default_timeout", "soon"), ("max_retries", "-1")]);
        let (policy, fallbacks) =
            Policy::from_settings(&PolicyDefaults::default(), |k| store.get(k).cloned());
        assert_eq!(policy, Policy::default());
        assert_eq!(fallbacks.len(), 3);
        assert_eq!(
            fallbacks[0].reason,
            FallbackReason::Invalid("soon".to_string())
        );
        assert_eq!(fallbacks[2].key, "retry_backoff_ms");
        assert_eq!(fallbacks[2].reason, FallbackReason::Missing);
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let store = settings(&[("default_timeout", "0")]);
        let (policy, fallbacks) =
            Policy::from_settings(&PolicyDefaults::default(), |k| store.get(k).cloned());
        assert_eq!(policy.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(matches!(fallbacks[0].reason, FallbackReason::Invalid(_)));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = PolicyDefaults {
            timeout_secs: 10,
            max_retries: 0,
            retry_backoff_ms: 0,
        };
        let (policy, _) = Policy::from_settings(&defaults, |_| None);
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.backoff, RetryBackoff::none());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = RetryBackoff::from_millis(250);
        assert_eq!(backoff.delay_for(0), Duration::ZERO);
        assert_eq!(backoff.delay_for(1), Duration::from_millis(250));
        assert_eq!(backoff.delay_for(2), Duration::from_millis(500));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(1000));
        assert_eq!(backoff.delay_for(40), MAX_BACKOFF);
        assert_eq!(RetryBackoff::none().delay_for(5), Duration::ZERO);
    }
}
