//! Shared types for logtree
//!
//! This crate contains the value types passed between the filter engine,
//! the terminal console and the command line front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::OnceLock;

// ============================================================================
// Severity Ranks
// ============================================================================

/// Numeric severity of a level. Higher means more severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(NonZeroU32);

impl Rank {
    /// Distance between two consecutive registered levels
    pub const STEP: u32 = 100;

    /// Create a rank from its raw value (zero is not a rank)
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Rank assigned to the level at `index` in a registration list
    pub fn for_position(index: usize) -> Self {
        let raw = (index as u32 + 1).saturating_mul(Self::STEP);
        // (index + 1) * STEP is never zero
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MAX))
    }

    /// Raw numeric value
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Error Payloads
// ============================================================================

/// Classification of an error as it relates to logging
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErrorCause {
    /// Unexpected condition worth a detailed probe
    #[default]
    Unexpected,
    /// Expected condition caused by the client (bad input, missing record, ...)
    RecognizedClientError,
}

/// An error carried as the detail of a log probe.
///
/// The log id is assigned the first time the error is rendered and stays
/// with the error, so later probes for the same error can be recognized as
/// duplicates.
#[derive(Clone, Debug, Default)]
pub struct ProbeError {
    /// Error kind name (e.g. `ValidationError`)
    pub name: String,

    /// Technical message
    pub message: String,

    /// Message suitable for the end user
    pub client_msg: Option<String>,

    /// HTTP status associated with the error, if any
    pub http_status: Option<u16>,

    /// Request URL associated with the error, if any
    pub url: Option<String>,

    /// Whether the client caused this error
    pub cause: ErrorCause,

    stack: Option<String>,
    log_id: OnceLock<String>,
}

impl ProbeError {
    /// Create a new error payload, capturing a backtrace when enabled
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let backtrace = std::backtrace::Backtrace::capture();
        let stack = match backtrace.status() {
            std::backtrace::BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            name: name.into(),
            message: message.into(),
            stack,
            ..Default::default()
        }
    }

    /// Build a payload from any standard error, recording its source chain
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut probe = Self::new("Error", err.to_string());

        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if !chain.is_empty() {
            probe.stack = Some(chain.join("\n"));
        }

        probe
    }

    /// Set the client-facing message
    pub fn with_client_msg(mut self, msg: impl Into<String>) -> Self {
        self.client_msg = Some(msg.into());
        self
    }

    /// Set the HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Set the request URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replace the recorded stack trace
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Mark this error as an expected client-caused condition
    pub fn client_caused(mut self) -> Self {
        self.cause = ErrorCause::RecognizedClientError;
        self
    }

    /// Is this a recognized client-caused condition?
    pub fn is_client_caused(&self) -> bool {
        self.cause == ErrorCause::RecognizedClientError
    }

    /// Recorded stack trace (or source chain)
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Log id, once a formatting pass has assigned one
    pub fn log_id(&self) -> Option<&str> {
        self.log_id.get().map(String::as_str)
    }

    /// Return the log id, generating it on first use
    pub fn assign_log_id<F>(&self, generate: F) -> &str
    where
        F: FnOnce() -> String,
    {
        self.log_id.get_or_init(generate)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for ProbeError {}

// ============================================================================
// Probe Payloads
// ============================================================================

/// Optional detail attached to a log probe
#[derive(Clone, Debug)]
pub enum Payload<'a> {
    /// An error, rendered as a detailed block and subject to the error veto
    Error(&'a ProbeError),
    /// A point in time, rendered on a single line
    Timestamp(DateTime<Utc>),
    /// Anything else, rendered as indented JSON
    Structured(serde_json::Value),
}

impl Payload<'_> {
    /// Serialize an arbitrary value into a structured payload.
    ///
    /// Serialization failures are folded into the payload text so that
    /// emission never fails because of payload shape.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Structured(value),
            Err(e) => Self::Structured(serde_json::Value::String(format!(
                "<unserializable payload: {}>",
                e
            ))),
        }
    }

    /// The error carried by this payload, if it is one
    pub fn as_error(&self) -> Option<&ProbeError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<'a> From<&'a ProbeError> for Payload<'a> {
    fn from(err: &'a ProbeError) -> Self {
        Self::Error(err)
    }
}

impl From<DateTime<Utc>> for Payload<'_> {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Timestamp(at)
    }
}

impl From<serde_json::Value> for Payload<'_> {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

// ============================================================================
// Configuration Documents
// ============================================================================

/// Literal used in configuration to unset a filter (inherit from parent)
pub const LEVEL_NONE: &str = "none";

/// Reserved namespace of the filter tree root
pub const ROOT_NAMESPACE: &str = "root";

/// Value of one `filter` entry: a level name (or `none`), optionally with a note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSetting {
    Level(String),
    Annotated(String, String),
}

impl FilterSetting {
    /// Level name (or `none`)
    pub fn level(&self) -> &str {
        match self {
            Self::Level(level) | Self::Annotated(level, _) => level,
        }
    }

    /// Note attached to the filter, if any
    pub fn note(&self) -> Option<&str> {
        match self {
            Self::Level(_) => None,
            Self::Annotated(_, note) => Some(note),
        }
    }
}

impl From<&str> for FilterSetting {
    fn from(level: &str) -> Self {
        Self::Level(level.to_string())
    }
}

/// A boolean setting that also accepts `"true"` / `"false"` strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagSetting {
    Bool(bool),
    Text(String),
}

impl FlagSetting {
    /// Interpret the setting, `None` when the text is not a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<bool> for FlagSetting {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Serializable form of a configuration write (and of a snapshot).
///
/// Every field is optional on write. Unknown keys are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigDocument {
    /// Level names in ascending severity, the default marked with `*`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_levels: Option<Vec<String>>,

    /// Whether recognized client errors are kept out of the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_client_errors: Option<FlagSetting>,

    /// Filter levels keyed by namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, FilterSetting>>,
}

impl ConfigDocument {
    /// Is this document free of any setting?
    pub fn is_empty(&self) -> bool {
        self.log_levels.is_none() && self.exclude_client_errors.is_none() && self.filter.is_none()
    }
}
