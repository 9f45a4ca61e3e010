// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Errors fall into three classes with different handling:
//!
//! - [`ConfigError`] is returned synchronously while building an
//!   [`Engine`](crate::engine::Engine) and is fatal for that setup attempt.
//! - [`ScanError`] comes from the scanner. A cycle that hits one keeps the
//!   previous annotations and the next cycle runs normally.
//! - [`EngineError::Internal`] means an engine invariant broke. It is
//!   reported through the trace sink together with [`REPORT_URL`] and then
//!   propagated to the caller.

use alloc::string::String;
use core::fmt;

/// Where internal errors should be reported.
pub const REPORT_URL: &str = "https://github.com/vigil-a11y/vigil/issues";

/// Invalid configuration supplied at setup time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The throttle wait was negative or not a finite number.
    InvalidThrottleWait,
    /// The instance name must match `^[a-z][a-z0-9-]*$`.
    InvalidName(String),
    /// The scan context was malformed.
    InvalidContext(&'static str),
    /// A scanner option other than `rules` or `runOnly` was supplied.
    UnsupportedScanOption(String),
    /// A supported scanner option had an invalid value.
    InvalidScanOption(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThrottleWait => {
                f.write_str("throttle wait must be a finite number of milliseconds >= 0")
            }
            Self::InvalidName(name) => write!(
                f,
                "invalid name {name:?}: use lowercase letters, digits, and dashes, starting with a letter"
            ),
            Self::InvalidContext(reason) => write!(f, "invalid scan context: {reason}"),
            Self::UnsupportedScanOption(key) => write!(
                f,
                "unsupported scanner option {key:?}: only `rules` and `runOnly` are accepted"
            ),
            Self::InvalidScanOption(reason) => write!(f, "invalid scanner option: {reason}"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// A selector the host DOM could not evaluate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector was empty or only whitespace.
    Empty,
    /// The selector uses syntax the host does not support.
    Unsupported(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty selector"),
            Self::Unsupported(selector) => write!(f, "unsupported selector {selector:?}"),
        }
    }
}

impl core::error::Error for SelectorError {}

/// The scanner failed to produce results for one cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanError {
    message: String,
}

impl ScanError {
    /// Creates a scan error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan failed: {}", self.message)
    }
}

impl core::error::Error for ScanError {}

/// Errors that escape a scan cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A selector in the configured context could not be evaluated.
    Selector(SelectorError),
    /// An engine invariant was violated.
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(err) => write!(f, "could not resolve scan context: {err}"),
            Self::Internal { message } => write!(
                f,
                "internal error: {message} (please report this at {REPORT_URL})"
            ),
        }
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Selector(err) => Some(err),
            Self::Internal { .. } => None,
        }
    }
}

impl From<SelectorError> for EngineError {
    fn from(err: SelectorError) -> Self {
        Self::Selector(err)
    }
}
