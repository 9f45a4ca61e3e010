// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User-facing configuration and its validation.
//!
//! Everything here is checked once, synchronously, when an
//! [`Engine`](crate::engine::Engine) is built. A [`ConfigError`] means the
//! engine never starts; nothing is scheduled and nothing is observed.

use alloc::string::String;
use alloc::vec::Vec;

use crate::context::ContextSpec;
use crate::error::ConfigError;
use crate::time::{Duration, TICKS_PER_MILLI};

/// Default instance name, also the prefix of the reserved element names.
pub const DEFAULT_NAME: &str = "vigil";

/// Scanner option keys a host may pass through.
pub const SUPPORTED_SCAN_OPTION_KEYS: [&str; 2] = ["rules", "runOnly"];

/// Rate limit for scan cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Throttle {
    /// Minimum spacing between scan cycles.
    pub wait: Duration,
    /// Run the first batch after an idle period right away instead of
    /// waiting a full `wait`.
    pub leading: bool,
}

impl Throttle {
    /// Builds a throttle from a millisecond wait as received from a host
    /// language with floating-point numbers.
    ///
    /// Negative, NaN, and infinite waits are rejected.
    pub fn from_millis(wait: f64, leading: bool) -> Result<Self, ConfigError> {
        if !wait.is_finite() || wait < 0.0 {
            return Err(ConfigError::InvalidThrottleWait);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "finite non-negative; float-to-int casts saturate"
        )]
        let ticks = (wait * TICKS_PER_MILLI as f64) as u64;
        Ok(Self {
            wait: Duration(ticks),
            leading,
        })
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(1_000),
            leading: true,
        }
    }
}

/// Enables or disables one scanner rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleSetting {
    /// Rule id, e.g. `color-contrast`.
    pub id: String,
    /// Whether the rule runs.
    pub enabled: bool,
}

/// Restricts a scan to a subset of rules.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RunOnly {
    /// Only these rule ids.
    Rules(Vec<String>),
    /// Only rules carrying one of these tags (`wcag2a`, `best-practice`, ...).
    Tags(Vec<String>),
}

/// The pass-through subset of scanner options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScanOptions {
    /// Per-rule overrides.
    pub rules: Vec<RuleSetting>,
    /// Optional rule subset.
    pub run_only: Option<RunOnly>,
}

impl ScanOptions {
    /// Rejects option keys other than `rules` and `runOnly`.
    ///
    /// For hosts that receive untyped option objects and need to validate
    /// them before converting to [`ScanOptions`].
    pub fn check_keys<'k>(keys: impl IntoIterator<Item = &'k str>) -> Result<(), ConfigError> {
        for key in keys {
            if !SUPPORTED_SCAN_OPTION_KEYS.contains(&key) {
                return Err(ConfigError::UnsupportedScanOption(key.into()));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.iter().any(|rule| rule.id.is_empty()) {
            return Err(ConfigError::InvalidScanOption("rule ids must not be empty"));
        }
        Ok(())
    }
}

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct Config<N> {
    /// Which part of the document is checked.
    pub context: ContextSpec<N>,
    /// Options forwarded to the scanner.
    pub scan_options: ScanOptions,
    /// Scan rate limit.
    pub throttle: Throttle,
    /// Instance name; reserved element names are derived from it.
    pub name: String,
}

impl<N> Default for Config<N> {
    fn default() -> Self {
        Self {
            context: ContextSpec::Document,
            scan_options: ScanOptions::default(),
            throttle: Throttle::default(),
            name: DEFAULT_NAME.into(),
        }
    }
}

impl<N> Config<N> {
    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        self.context.validate()?;
        self.scan_options.validate()
    }
}

/// Checks that `name` matches `^[a-z][a-z0-9-]*$`.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    let mut bytes = name.bytes();
    let valid = match bytes.next() {
        Some(first) => {
            first.is_ascii_lowercase()
                && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.into()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    #[test]
    fn default_throttle_is_one_second_leading() {
        let throttle = Throttle::default();
        assert_eq!(throttle.wait, Duration::from_millis(1_000));
        assert!(throttle.leading);
    }

    #[test]
    fn throttle_from_millis_rejects_bad_waits() {
        for wait in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                Throttle::from_millis(wait, true),
                Err(ConfigError::InvalidThrottleWait),
                "wait {wait}"
            );
        }
        let ok = Throttle::from_millis(2.5, false).unwrap();
        assert_eq!(ok.wait, Duration(2_500));
        assert!(!ok.leading);
        assert_eq!(Throttle::from_millis(0.0, true).unwrap().wait, Duration::ZERO);
    }

    #[test]
    fn names() {
        for good in ["vigil", "a", "a11y-check", "x-1-"] {
            assert!(validate_name(good).is_ok(), "{good}");
        }
        for bad in ["", "1abc", "-abc", "Vigil", "has space", "under_score", "émoji"] {
            assert_eq!(
                validate_name(bad),
                Err(ConfigError::InvalidName(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn scan_option_keys() {
        assert!(ScanOptions::check_keys(["rules", "runOnly"]).is_ok());
        assert!(ScanOptions::check_keys([]).is_ok());
        assert_eq!(
            ScanOptions::check_keys(["rules", "reporter"]),
            Err(ConfigError::UnsupportedScanOption("reporter".to_string()))
        );
    }

    #[test]
    fn config_validation() {
        let config = Config::<u32>::default();
        assert!(config.validate().is_ok());

        let bad_name = Config::<u32> {
            name: "Bad".into(),
            ..Config::default()
        };
        assert!(matches!(
            bad_name.validate(),
            Err(ConfigError::InvalidName(_))
        ));

        let bad_rule = Config::<u32> {
            scan_options: ScanOptions {
                rules: vec![RuleSetting {
                    id: String::new(),
                    enabled: false,
                }],
                run_only: None,
            },
            ..Config::default()
        };
        assert!(matches!(
            bad_rule.validate(),
            Err(ConfigError::InvalidScanOption(_))
        ));
    }
}
