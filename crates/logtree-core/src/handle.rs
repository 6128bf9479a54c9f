//! Log handles: the call-site facing side of the engine.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use logtree_types::Payload;

use crate::error::{LogError, Result};
use crate::gate;
use crate::level::{Level, LevelSchema};
use crate::registry::LogRegistry;
use crate::tree::FilterNode;

/// Separator between constituent namespaces of a mixed handle
pub const MIX_SEPARATOR: &str = "||";

/// A namespace-bound logger.
///
/// Holds the filter node(s) it gates on, never a copied level, so
/// configuration changes apply to existing handles immediately.
#[derive(Clone)]
pub struct Log {
    registry: LogRegistry,
    namespace: String,
    nodes: Vec<Arc<FilterNode>>,
}

impl Log {
    /// Bind a handle to `namespace`, creating its filter node if needed
    pub fn new(registry: &LogRegistry, namespace: &str) -> Result<Self> {
        let node = registry.node(namespace)?;
        Ok(Self {
            registry: registry.clone(),
            namespace: node.name().to_string(),
            nodes: vec![node],
        })
    }

    /// Combine handles into one that is enabled when any of them is.
    ///
    /// The label joins the constituent namespaces with `||`. All handles
    /// must come from the same registry; the first one's is used.
    pub fn mix<'a, I>(handles: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Log>,
    {
        let mut handles = handles.into_iter();
        let first = handles
            .next()
            .ok_or_else(|| LogError::config("a log mix needs at least one handle"))?;

        let mut mixed = first.clone();
        for handle in handles {
            mixed.namespace.push_str(MIX_SEPARATOR);
            mixed.namespace.push_str(&handle.namespace);
            mixed.nodes.extend(handle.nodes.iter().cloned());
        }
        Ok(mixed)
    }

    /// Namespace label used in probes
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registry this handle belongs to
    pub fn registry(&self) -> &LogRegistry {
        &self.registry
    }

    /// Would a probe at `level` with this payload be emitted?
    pub fn is_level_enabled(&self, level: &Level, payload: Option<&Payload<'_>>) -> bool {
        let schema = self.registry.schema_view();
        self.active(&schema, level, payload).is_some()
    }

    /// Emit a probe at `level`. The producer runs only when the probe is active.
    pub fn log<F>(&self, level: &Level, producer: F, payload: Option<&Payload<'_>>)
    where
        F: FnOnce() -> String,
    {
        let gated = {
            let schema = self.registry.schema_view();
            self.active(&schema, level, payload)
                .map(|level| (level, schema.label_width()))
        };
        if let Some((level, label_width)) = gated {
            self.registry
                .emit(&self.namespace, &level, label_width, producer(), payload);
        }
    }

    /// Operations bound to one level of the active schema
    pub fn at(&self, level_name: &str) -> Result<LevelOps<'_>> {
        let level = self.registry.level(level_name)?;
        Ok(LevelOps { log: self, level })
    }

    /// Gate check; returns the level re-resolved against `schema` when active
    fn active(
        &self,
        schema: &LevelSchema,
        level: &Level,
        payload: Option<&Payload<'_>>,
    ) -> Option<Level> {
        let level = match schema.refresh(level) {
            Ok(level) => level,
            Err(_) => {
                warn!(
                    namespace = %self.namespace,
                    level = level.name(),
                    "Level is not registered anymore, probe dropped"
                );
                return None;
            }
        };

        let off = schema.off_rank();
        let passes = self
            .nodes
            .iter()
            .any(|node| gate::level_passes(node.resolve(), level.rank(), off));
        (passes && !gate::vetoed(payload, self.registry.exclude_client_errors())).then_some(level)
    }

    /// Shorthand support: silently inactive when the schema lacks `name`
    fn named_level(&self, name: &str) -> Option<Level> {
        self.registry.level(name).ok()
    }
}

macro_rules! level_shorthands {
    ($(($name:literal, $log:ident, $enabled:ident)),* $(,)?) => {
        impl Log {
            $(
                #[doc = concat!("Emit at `", $name, "`; no-op when the schema has no such level")]
                pub fn $log<F>(&self, producer: F, payload: Option<&Payload<'_>>)
                where
                    F: FnOnce() -> String,
                {
                    if let Some(level) = self.named_level($name) {
                        self.log(&level, producer, payload);
                    }
                }

                #[doc = concat!("Is `", $name, "` enabled? False when the schema has no such level")]
                pub fn $enabled(&self, payload: Option<&Payload<'_>>) -> bool {
                    self.named_level($name)
                        .is_some_and(|level| self.is_level_enabled(&level, payload))
                }
            )*
        }
    };
}

level_shorthands!(
    ("TRACE", trace, is_trace_enabled),
    ("DEBUG", debug, is_debug_enabled),
    ("INFO", info, is_info_enabled),
    ("WARN", warn, is_warn_enabled),
    ("ERROR", error, is_error_enabled),
    ("FATAL", fatal, is_fatal_enabled),
);

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("namespace", &self.namespace)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Emission and query bound to one level
#[derive(Clone, Debug)]
pub struct LevelOps<'a> {
    log: &'a Log,
    level: Level,
}

impl LevelOps<'_> {
    /// The bound level, as resolved when the ops were created
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Same as [`Log::is_level_enabled`] at the bound level
    pub fn enabled(&self, payload: Option<&Payload<'_>>) -> bool {
        self.log.is_level_enabled(&self.level, payload)
    }

    /// Same as [`Log::log`] at the bound level
    pub fn log<F>(&self, producer: F, payload: Option<&Payload<'_>>)
    where
        F: FnOnce() -> String,
    {
        self.log.log(&self.level, producer, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ProbeBuffer;
    use crate::config::ConfigUpdate;
    use crate::level::LevelSchema;
    use logtree_types::ProbeError;
    use std::cell::Cell;

    fn setup() -> (LogRegistry, ProbeBuffer) {
        let registry = LogRegistry::with_levels(&["TRACE", "DEBUG", "*INFO", "WARN", "ERROR"]).unwrap();
        let buffer = ProbeBuffer::new(64);
        registry
            .config(Some(ConfigUpdate::new().output_handler(Arc::new(buffer.clone()))))
            .unwrap();
        (registry, buffer)
    }

    #[test]
    fn test_producer_runs_exactly_when_active() {
        let (registry, buffer) = setup();
        let log = registry.handle("a.b").unwrap();
        let calls = Cell::new(0);

        for name in ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"] {
            let level = registry.level(name).unwrap();
            let active = log.is_level_enabled(&level, None);
            let before = calls.get();
            log.log(
                &level,
                || {
                    calls.set(calls.get() + 1);
                    format!("at {}", name)
                },
                None,
            );
            assert_eq!(calls.get() - before, usize::from(active), "level {}", name);
        }

        assert_eq!(calls.get(), 3);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_existing_handles_follow_config() {
        let (registry, buffer) = setup();
        let log = registry.handle("a.b.c").unwrap();
        assert!(!log.is_debug_enabled(None));

        registry.set_level("a.b", "DEBUG", None).unwrap();
        assert!(log.is_debug_enabled(None));
        log.debug(|| "now visible".to_string(), None);
        assert_eq!(buffer.last().unwrap().namespace, "a.b.c");
        assert_eq!(buffer.last().unwrap().level_name, "DEBUG");
    }

    #[test]
    fn test_off_silences_everything() {
        let (registry, buffer) = setup();
        let log = registry.handle("quiet").unwrap();
        registry.set_level("quiet", "OFF", None).unwrap();
        log.error(|| "nope".to_string(), None);
        assert!(!log.is_error_enabled(None));

        let off = registry.level("OFF").unwrap();
        registry.set_level("quiet", "TRACE", None).unwrap();
        assert!(!log.is_level_enabled(&off, None));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_client_error_veto() {
        let (registry, buffer) = setup();
        let log = registry.handle("api").unwrap();
        let err = ProbeError::new("NotFound", "no such record").client_caused();
        let payload = Payload::from(&err);

        for name in ["INFO", "WARN", "ERROR"] {
            assert!(!log.at(name).unwrap().enabled(Some(&payload)));
        }
        log.error(|| "hidden".to_string(), Some(&payload));
        assert!(buffer.is_empty());

        registry
            .config(Some(ConfigUpdate::new().exclude_client_errors(false)))
            .unwrap();
        log.error(|| "shown".to_string(), Some(&payload));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_error_logged_only_once() {
        let (registry, buffer) = setup();
        let log = registry.handle("api").unwrap();
        let err = ProbeError::new("TypeError", "undefined is not a function");
        let payload = Payload::from(&err);

        log.error(|| "first".to_string(), Some(&payload));
        assert!(err.log_id().is_some());
        log.error(|| "again".to_string(), Some(&payload));
        assert_eq!(buffer.len(), 1);
        assert!(buffer.all()[0].text.contains(err.log_id().unwrap()));
    }

    #[test]
    fn test_at_dispatch() {
        let (registry, buffer) = setup();
        registry
            .config(Some(ConfigUpdate::new().log_levels(["DEBUG", "*FLOW", "INFO"])))
            .unwrap();
        let log = registry.handle("svc").unwrap();

        let flow = log.at("FLOW").unwrap();
        assert!(flow.enabled(None));
        flow.log(|| "step".to_string(), None);
        assert_eq!(buffer.last().unwrap().level_name, "FLOW");

        assert!(matches!(log.at("WARN"), Err(LogError::UnknownLevel { .. })));
        // shorthand for a level the schema lacks is inert
        assert!(!log.is_warn_enabled(None));
        log.warn(|| unreachable!(), None);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_stale_level_refreshed_by_name() {
        let (registry, buffer) = setup();
        let log = registry.handle("svc").unwrap();
        let debug = registry.level("DEBUG").unwrap();
        let trace = registry.level("TRACE").unwrap();
        registry.set_level("svc", "DEBUG", None).unwrap();

        registry.register_levels(LevelSchema::parse(&["VERBOSE", "DEBUG", "*INFO"]).unwrap());

        // the node kept DEBUG by name and the old Level value is re-resolved
        assert!(log.is_level_enabled(&debug, None));
        log.log(&debug, || "refreshed".to_string(), None);
        assert_eq!(buffer.len(), 1);

        // TRACE vanished: dropped without running the producer
        assert!(!log.is_level_enabled(&trace, None));
        log.log(&trace, || unreachable!(), None);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_gate_consistent_during_reregistration() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;
        use std::time::{Duration, Instant};

        let (registry, buffer) = setup();
        registry.set_level("svc", "ERROR", None).unwrap();
        let log = registry.handle("svc").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let swapper = {
            let registry = registry.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let wide = LevelSchema::parse(&["TRACE", "DEBUG", "*INFO", "WARN", "ERROR"]).unwrap();
                let narrow = LevelSchema::parse(&["INFO", "*WARN", "ERROR"]).unwrap();
                let mut flip = false;
                while !stop.load(Ordering::Relaxed) {
                    let schema = if flip { wide.clone() } else { narrow.clone() };
                    registry.register_levels(schema);
                    flip = !flip;
                }
            })
        };

        // svc stays at ERROR in both schemas, so WARN must never pass
        let deadline = Instant::now() + Duration::from_millis(500);
        let mut leaked = 0;
        while Instant::now() < deadline {
            if log.is_warn_enabled(None) {
                leaked += 1;
            }
            log.warn(|| "must stay hidden".to_string(), None);
        }
        stop.store(true, Ordering::Relaxed);
        swapper.join().unwrap();

        assert_eq!(leaked, 0);
        assert!(buffer.is_empty());
        assert_eq!(registry.filter("svc").unwrap(), "ERROR");
    }

    #[test]
    fn test_mix_enabled_when_any_part_is() {
        let (registry, buffer) = setup();
        registry.set_level("ui.form", "DEBUG", None).unwrap();
        let caller = registry.handle("ui.form").unwrap();
        let util = registry.handle("util.dates").unwrap();

        let mixed = Log::mix([&util, &caller]).unwrap();
        assert_eq!(mixed.namespace(), "util.dates||ui.form");
        assert_eq!(mixed.nodes.len(), 2);
        assert!(!util.is_debug_enabled(None));
        assert!(mixed.is_debug_enabled(None));

        mixed.debug(|| "parsed".to_string(), None);
        let record = &buffer.last().unwrap();
        assert_eq!(record.namespace, "util.dates||ui.form");
        assert!(record.text.contains("util.dates||ui.form:"));

        let empty: [&Log; 0] = [];
        assert!(Log::mix(empty).is_err());
    }

    #[test]
    fn test_probe_layout_through_handle() {
        let (registry, buffer) = setup();
        registry
            .config(Some(
                ConfigUpdate::new().format_timestamp(Arc::new(|| "2024-01-15 10:30:00".to_string())),
            ))
            .unwrap();
        registry.handle("startup.appStore").unwrap().warn(
            || "store created".to_string(),
            None,
        );
        assert_eq!(
            buffer.last().unwrap().text,
            "WARN  2024-01-15 10:30:00 startup.appStore:\n      store created"
        );
    }
}
