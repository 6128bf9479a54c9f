//! Hierarchical namespace log filtering for logtree
//!
//! This crate provides the level schema, the filter tree, log handles,
//! gating with the client error veto, probe formatting and output sinks.

mod buffer;
mod config;
mod error;
mod format;
mod gate;
mod handle;
mod level;
mod registry;
mod sink;
mod tree;

pub use buffer::{LevelCounts, ProbeBuffer, ProbeRecord};
pub use config::{ConfigSnapshot, ConfigUpdate, FilterEntry, FormatOverrides};
pub use error::{LogError, Result};
pub use format::{
    ErrorHook, Formatter, LevelLabelHook, MessageHook, NamespaceLabelHook, PayloadHook, ProbeHook,
    ProbeParts, TimestampHook, generate_log_id,
};
pub use gate::{is_active, level_passes, vetoed};
pub use handle::{LevelOps, Log, MIX_SEPARATOR};
pub use level::{DEFAULT_LEVELS, DEFAULT_MARKER, Level, LevelSchema, OFF};
pub use registry::{LogRegistry, POST_LABEL};
pub use sink::{ConsoleSink, NullSink, OutputSink, ProbeContext, TracingSink};
pub use tree::{FilterNode, FilterTree, validate_namespace};

// Re-export types used in our public API
pub use logtree_types::{
    ConfigDocument, ErrorCause, FilterSetting, FlagSetting, LEVEL_NONE, Payload, ProbeError,
    ROOT_NAMESPACE, Rank,
};
