use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info};

use logtree_types::{Payload, Rank};

use crate::config::{ConfigSnapshot, ConfigUpdate, FilterEntry};
use crate::error::{LogError, Result};
use crate::format::{Formatter, ProbeParts};
use crate::handle::Log;
use crate::level::{Level, LevelSchema};
use crate::sink::{ConsoleSink, OutputSink, ProbeContext};
use crate::tree::{FilterNode, FilterTree, validate_namespace};

/// Level label of unconditional posts
pub const POST_LABEL: &str = "POST";

struct Shared {
    schema: RwLock<Arc<LevelSchema>>,
    tree: FilterTree,
    exclude_client_errors: AtomicBool,
    formatter: RwLock<Arc<Formatter>>,
    sink: RwLock<Arc<dyn OutputSink>>,
    /// Serializes every write
    writer: Mutex<()>,
}

/// The level schema, filter tree and output pipeline of one host.
///
/// Construct once at startup and hand clones to every component that
/// creates log handles. Clones share state.
#[derive(Clone)]
pub struct LogRegistry {
    shared: Arc<Shared>,
}

impl LogRegistry {
    /// Create a registry whose root filter sits at the schema's default level
    pub fn new(schema: LevelSchema) -> Self {
        let tree = FilterTree::new(schema.default_rank());
        Self {
            shared: Arc::new(Shared {
                schema: RwLock::new(Arc::new(schema)),
                tree,
                exclude_client_errors: AtomicBool::new(true),
                formatter: RwLock::new(Arc::new(Formatter::default())),
                sink: RwLock::new(Arc::new(ConsoleSink)),
                writer: Mutex::new(()),
            }),
        }
    }

    /// Create a registry from level names where one carries the `*` default marker
    pub fn with_levels<S: AsRef<str>>(marked: &[S]) -> Result<Self> {
        Ok(Self::new(LevelSchema::parse(marked)?))
    }

    /// The active level schema
    pub fn schema(&self) -> Arc<LevelSchema> {
        self.shared.schema.read().clone()
    }

    /// Read guard on the active schema.
    ///
    /// Re-registration remaps the tree under the write side of this lock,
    /// so node levels read while the guard is held match the schema it
    /// derefs to. Never hold it across a sink or producer call.
    pub(crate) fn schema_view(&self) -> RwLockReadGuard<'_, Arc<LevelSchema>> {
        self.shared.schema.read()
    }

    /// Replace the level schema.
    ///
    /// The root is reset to the new default. Explicit levels of other
    /// namespaces keep their level name when the new schema has it and
    /// fall back to inheriting otherwise.
    pub fn register_levels(&self, schema: LevelSchema) {
        let _guard = self.shared.writer.lock();
        self.swap_schema(schema);
    }

    fn swap_schema(&self, schema: LevelSchema) {
        let mut slot = self.shared.schema.write();
        let old = slot.clone();

        self.shared
            .tree
            .remap_levels(schema.default_rank(), |node: &FilterNode, rank: Rank| {
                let name = old.name_of(rank).ok()?;
                match schema.rank_of(name) {
                    Ok(mapped) => mapped,
                    Err(_) => {
                        debug!(
                            namespace = node.name(),
                            level = name,
                            "Level no longer registered, filter now inherits"
                        );
                        None
                    }
                }
            });

        info!(
            levels = ?schema.marked_names(),
            "Registered log levels"
        );
        *slot = Arc::new(schema);
    }

    /// Look up a level of the active schema by name
    pub fn level(&self, name: &str) -> Result<Level> {
        self.schema().level(name)
    }

    /// Rank of a level name (`none` gives None)
    pub fn rank_of(&self, name: &str) -> Result<Option<Rank>> {
        self.schema().rank_of(name)
    }

    /// Level name of a rank
    pub fn name_of(&self, rank: Rank) -> Result<String> {
        self.schema().name_of(rank).map(str::to_string)
    }

    /// Set the explicit level of a namespace by name; `none` unsets it
    pub fn set_level(&self, namespace: &str, level: &str, note: Option<&str>) -> Result<()> {
        let _guard = self.shared.writer.lock();
        let rank = self.schema().rank_of(level)?;
        self.shared.tree.set_level(namespace, rank, note)?;
        debug!(namespace, level, "Filter level set");
        Ok(())
    }

    /// Declared level name of a namespace, `none` when it inherits
    pub fn filter(&self, namespace: &str) -> Result<String> {
        let node = self.shared.tree.locate_or_create(namespace)?;
        let schema = self.schema_view();
        schema.setting_name(node.level()).map(str::to_string)
    }

    /// Level a namespace resolves to
    pub fn resolve(&self, namespace: &str) -> Result<Level> {
        let schema = self.schema_view();
        let rank = self.shared.tree.resolve(namespace)?;
        schema.level(schema.name_of(rank)?)
    }

    /// Node for a namespace, created on first use
    pub fn node(&self, namespace: &str) -> Result<Arc<FilterNode>> {
        self.shared.tree.locate_or_create(namespace)
    }

    /// Log handle bound to a namespace
    pub fn handle(&self, namespace: &str) -> Result<Log> {
        Log::new(self, namespace)
    }

    pub fn exclude_client_errors(&self) -> bool {
        self.shared.exclude_client_errors.load(Ordering::Acquire)
    }

    pub fn formatter(&self) -> Arc<Formatter> {
        self.shared.formatter.read().clone()
    }

    pub fn output_handler(&self) -> Arc<dyn OutputSink> {
        self.shared.sink.read().clone()
    }

    /// Unconditional operator output, bypassing every filter
    pub fn post(&self, message: &str, payload: Option<&Payload<'_>>) {
        let schema = self.schema();
        let parts = ProbeParts {
            namespace: "",
            level_name: POST_LABEL,
            label_width: schema.label_width().max(POST_LABEL.len()),
            message: message.to_string(),
            payload,
        };
        let context = ProbeContext {
            level: None,
            level_name: POST_LABEL.to_string(),
            namespace: String::new(),
        };
        self.dispatch(parts, &context);
    }

    /// Format and hand an already gated probe to the sink
    pub(crate) fn emit(
        &self,
        namespace: &str,
        level: &Level,
        label_width: usize,
        message: String,
        payload: Option<&Payload<'_>>,
    ) {
        let parts = ProbeParts {
            namespace,
            level_name: level.name(),
            label_width,
            message,
            payload,
        };
        let context = ProbeContext {
            level: Some(level.rank()),
            level_name: level.name().to_string(),
            namespace: namespace.to_string(),
        };
        self.dispatch(parts, &context);
    }

    fn dispatch(&self, parts: ProbeParts<'_>, context: &ProbeContext) {
        // Hooks and sinks run without any registry lock held
        let formatter = self.formatter();
        let sink = self.output_handler();
        let probe = formatter.render(parts);
        sink.emit(&probe, context);
    }

    /// Read the configuration, or apply a partial write and read it back.
    ///
    /// A write is validated completely before anything changes, then
    /// applied in order: levels, filter, flag, format hooks, output sink.
    pub fn config(&self, update: Option<ConfigUpdate>) -> Result<ConfigSnapshot> {
        let Some(update) = update else {
            return Ok(self.snapshot());
        };

        let _guard = self.shared.writer.lock();

        let new_schema = update
            .log_levels
            .as_deref()
            .map(LevelSchema::parse)
            .transpose()?;

        let filters = {
            let current = self.schema();
            let target = new_schema.as_ref().unwrap_or(current.as_ref());
            let mut filters = Vec::with_capacity(update.filter.len());
            for (namespace, setting) in &update.filter {
                validate_namespace(namespace)?;
                let rank = target.rank_of(setting.level())?;
                if rank.is_none() && namespace == logtree_types::ROOT_NAMESPACE {
                    return Err(LogError::RootUnset);
                }
                filters.push((namespace.as_str(), rank, setting.note()));
            }
            filters
        };

        if let Some(schema) = new_schema {
            self.swap_schema(schema);
        }

        for (namespace, rank, note) in filters {
            self.shared.tree.set_level(namespace, rank, note)?;
        }

        if let Some(exclude) = update.exclude_client_errors {
            self.shared
                .exclude_client_errors
                .store(exclude, Ordering::Release);
        }

        if !update.format.is_empty() {
            let mut formatter = self.shared.formatter.write();
            *formatter = Arc::new(update.format.apply_to(&formatter));
        }

        if let Some(sink) = update.output_handler {
            *self.shared.sink.write() = sink;
        }

        debug!(filters = update.filter.len(), "Configuration applied");
        Ok(self.snapshot())
    }

    /// Current configuration
    pub fn snapshot(&self) -> ConfigSnapshot {
        let exclude_client_errors = self.exclude_client_errors();
        let formatter = (*self.formatter()).clone();
        let output_handler = self.output_handler();

        let schema = self.schema_view();
        let name = |rank: Rank| {
            schema
                .name_of(rank)
                .map(str::to_string)
                .unwrap_or_else(|_| rank.to_string())
        };

        let filter = self
            .shared
            .tree
            .nodes()
            .iter()
            .map(|node| FilterEntry {
                namespace: node.name().to_string(),
                level: node
                    .level()
                    .map(name)
                    .unwrap_or_else(|| logtree_types::LEVEL_NONE.to_string()),
                resolved: name(node.resolve()),
                note: node.note(),
            })
            .collect();

        ConfigSnapshot {
            log_levels: schema.marked_names(),
            default_level: schema.default_level().name().to_string(),
            filter,
            exclude_client_errors,
            formatter,
            output_handler,
        }
    }
}

impl Default for LogRegistry {
    fn default() -> Self {
        Self::new(LevelSchema::default())
    }
}

impl std::fmt::Debug for LogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRegistry")
            .field("schema", &self.schema().marked_names())
            .field("tree", &self.shared.tree)
            .field("exclude_client_errors", &self.exclude_client_errors())
            .finish_non_exhaustive()
    }
}
