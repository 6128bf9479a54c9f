//! Configuration writes and snapshots.
//!
//! A [`ConfigUpdate`] carries only the parts a caller wants to change. The
//! serializable parts come from a [`ConfigDocument`] (JSON or TOML); format
//! hooks and the output sink can only be supplied in code.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use logtree_types::{ConfigDocument, FilterSetting, FlagSetting};

use crate::error::{LogError, Result};
use crate::format::{
    ErrorHook, Formatter, LevelLabelHook, MessageHook, NamespaceLabelHook, PayloadHook, ProbeHook,
    TimestampHook,
};
use crate::sink::{OutputSink, SinkDebug};

/// Replacement formatting hooks; unset hooks are left alone
#[derive(Clone, Default)]
pub struct FormatOverrides {
    pub probe: Option<ProbeHook>,
    pub level_label: Option<LevelLabelHook>,
    pub timestamp: Option<TimestampHook>,
    pub namespace_label: Option<NamespaceLabelHook>,
    pub message: Option<MessageHook>,
    pub payload: Option<PayloadHook>,
    pub error: Option<ErrorHook>,
}

impl FormatOverrides {
    pub fn is_empty(&self) -> bool {
        self.probe.is_none()
            && self.level_label.is_none()
            && self.timestamp.is_none()
            && self.namespace_label.is_none()
            && self.message.is_none()
            && self.payload.is_none()
            && self.error.is_none()
    }

    /// Formatter with these hooks swapped in
    pub(crate) fn apply_to(&self, base: &Formatter) -> Formatter {
        let mut formatter = base.clone();
        if let Some(hook) = &self.probe {
            formatter.probe = hook.clone();
        }
        if let Some(hook) = &self.level_label {
            formatter.level_label = hook.clone();
        }
        if let Some(hook) = &self.timestamp {
            formatter.timestamp = hook.clone();
        }
        if let Some(hook) = &self.namespace_label {
            formatter.namespace_label = hook.clone();
        }
        if let Some(hook) = &self.message {
            formatter.message = hook.clone();
        }
        if let Some(hook) = &self.payload {
            formatter.payload = hook.clone();
        }
        if let Some(hook) = &self.error {
            formatter.error = hook.clone();
        }
        formatter
    }
}

impl fmt::Debug for FormatOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = [
            ("probe", self.probe.is_some()),
            ("level_label", self.level_label.is_some()),
            ("timestamp", self.timestamp.is_some()),
            ("namespace_label", self.namespace_label.is_some()),
            ("message", self.message.is_some()),
            ("payload", self.payload.is_some()),
            ("error", self.error.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect();
        f.debug_struct("FormatOverrides").field("set", &set).finish()
    }
}

/// A partial configuration write
#[derive(Clone, Default)]
pub struct ConfigUpdate {
    pub(crate) log_levels: Option<Vec<String>>,
    pub(crate) filter: BTreeMap<String, FilterSetting>,
    pub(crate) exclude_client_errors: Option<bool>,
    pub(crate) format: FormatOverrides,
    pub(crate) output_handler: Option<Arc<dyn OutputSink>>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from a parsed document
    pub fn from_document(document: ConfigDocument) -> Result<Self> {
        let exclude_client_errors = document
            .exclude_client_errors
            .as_ref()
            .map(parse_flag)
            .transpose()?;

        Ok(Self {
            log_levels: document.log_levels,
            filter: document.filter.unwrap_or_default(),
            exclude_client_errors,
            ..Self::default()
        })
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: ConfigDocument = serde_json::from_str(json)
            .map_err(|e| LogError::config(format!("invalid JSON configuration: {}", e)))?;
        Self::from_document(document)
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let document: ConfigDocument = toml::from_str(text)
            .map_err(|e| LogError::config(format!("invalid TOML configuration: {}", e)))?;
        Self::from_document(document)
    }

    /// Re-register the level schema (`*` marks the default)
    pub fn log_levels<I, S>(mut self, marked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_levels = Some(marked.into_iter().map(Into::into).collect());
        self
    }

    /// Set one filter entry (level name, `none`, or an annotated pair)
    pub fn filter(mut self, namespace: impl Into<String>, setting: impl Into<FilterSetting>) -> Self {
        self.filter.insert(namespace.into(), setting.into());
        self
    }

    /// Set one filter entry together with its note
    pub fn filter_with_note(
        self,
        namespace: impl Into<String>,
        level: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        self.filter(namespace, FilterSetting::Annotated(level.into(), note.into()))
    }

    pub fn exclude_client_errors(mut self, exclude: bool) -> Self {
        self.exclude_client_errors = Some(exclude);
        self
    }

    pub fn format_probe(mut self, hook: ProbeHook) -> Self {
        self.format.probe = Some(hook);
        self
    }

    pub fn format_level_label(mut self, hook: LevelLabelHook) -> Self {
        self.format.level_label = Some(hook);
        self
    }

    pub fn format_timestamp(mut self, hook: TimestampHook) -> Self {
        self.format.timestamp = Some(hook);
        self
    }

    pub fn format_namespace_label(mut self, hook: NamespaceLabelHook) -> Self {
        self.format.namespace_label = Some(hook);
        self
    }

    pub fn format_message(mut self, hook: MessageHook) -> Self {
        self.format.message = Some(hook);
        self
    }

    pub fn format_payload(mut self, hook: PayloadHook) -> Self {
        self.format.payload = Some(hook);
        self
    }

    pub fn format_error(mut self, hook: ErrorHook) -> Self {
        self.format.error = Some(hook);
        self
    }

    /// Replace the output sink
    pub fn output_handler(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.output_handler = Some(sink);
        self
    }

    /// Does this update change nothing?
    pub fn is_empty(&self) -> bool {
        self.log_levels.is_none()
            && self.filter.is_empty()
            && self.exclude_client_errors.is_none()
            && self.format.is_empty()
            && self.output_handler.is_none()
    }
}

impl fmt::Debug for ConfigUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigUpdate")
            .field("log_levels", &self.log_levels)
            .field("filter", &self.filter)
            .field("exclude_client_errors", &self.exclude_client_errors)
            .field("format", &self.format)
            .field("output_handler", &self.output_handler.as_ref().map(|_| SinkDebug))
            .finish()
    }
}

fn parse_flag(flag: &FlagSetting) -> Result<bool> {
    flag.as_bool().ok_or_else(|| {
        LogError::config(format!(
            "excludeClientErrors must be true or false, got {:?}",
            flag
        ))
    })
}

/// One namespace as seen in a snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterEntry {
    pub namespace: String,
    /// Declared level name, `none` when inheriting
    pub level: String,
    /// Level the namespace currently resolves to
    pub resolved: String,
    pub note: String,
}

impl FilterEntry {
    fn setting(&self) -> FilterSetting {
        if self.note.is_empty() {
            FilterSetting::Level(self.level.clone())
        } else {
            FilterSetting::Annotated(self.level.clone(), self.note.clone())
        }
    }
}

/// The full configuration at one point in time
#[derive(Clone)]
pub struct ConfigSnapshot {
    /// Level names in ascending severity, the default marked with `*`
    pub log_levels: Vec<String>,
    pub default_level: String,
    /// Every known namespace, root first
    pub filter: Vec<FilterEntry>,
    pub exclude_client_errors: bool,
    pub formatter: Formatter,
    pub output_handler: Arc<dyn OutputSink>,
}

impl ConfigSnapshot {
    /// Entry for one namespace, if it exists
    pub fn entry(&self, namespace: &str) -> Option<&FilterEntry> {
        self.filter.iter().find(|e| e.namespace == namespace)
    }

    /// Serializable part of the snapshot; applying it to a fresh registry
    /// reproduces the same filters, levels and flag
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            log_levels: Some(self.log_levels.clone()),
            exclude_client_errors: Some(FlagSetting::Bool(self.exclude_client_errors)),
            filter: Some(
                self.filter
                    .iter()
                    .map(|e| (e.namespace.clone(), e.setting()))
                    .collect(),
            ),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| LogError::config(format!("cannot render configuration: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.to_document())
            .map_err(|e| LogError::config(format!("cannot render configuration: {}", e)))
    }
}

impl Serialize for ConfigSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("log_levels", &self.log_levels)
            .field("default_level", &self.default_level)
            .field("filter", &self.filter)
            .field("exclude_client_errors", &self.exclude_client_errors)
            .field("formatter", &self.formatter)
            .field("output_handler", &SinkDebug)
            .finish()
    }
}
