use std::fmt;
use std::io::Write;

use logtree_types::Rank;

/// Describes the probe handed to an output sink
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeContext {
    /// Rank of the probe's level, None for unconditional posts
    pub level: Option<Rank>,

    /// Level label (`POST` for unconditional posts)
    pub level_name: String,

    /// Namespace of the emitting handle (empty for posts)
    pub namespace: String,
}

impl ProbeContext {
    /// Was this probe posted unconditionally?
    pub fn is_post(&self) -> bool {
        self.level.is_none()
    }
}

/// Final destination of formatted probes. Called synchronously.
pub trait OutputSink: Send + Sync {
    fn emit(&self, probe: &str, context: &ProbeContext);
}

impl<F> OutputSink for F
where
    F: Fn(&str, &ProbeContext) + Send + Sync,
{
    fn emit(&self, probe: &str, context: &ProbeContext) {
        self(probe, context)
    }
}

/// Writes probes to the terminal: warnings and errors to stderr, the rest to stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn uses_stderr(level_name: &str) -> bool {
        matches!(level_name, "WARN" | "ERROR" | "FATAL")
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&self, probe: &str, context: &ProbeContext) {
        // Best effort: a closed stream must not break the caller
        if Self::uses_stderr(&context.level_name) {
            let _ = writeln!(std::io::stderr().lock(), "{}", probe);
        } else {
            let _ = writeln!(std::io::stdout().lock(), "{}", probe);
        }
    }
}

/// Forwards probes into `tracing` events under the `logtree` target.
///
/// The built-in level names map onto the matching tracing level, `FATAL`
/// onto `ERROR`. Custom levels and posts are emitted at `INFO`. The
/// namespace travels as the `namespace` field.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn emit(&self, probe: &str, context: &ProbeContext) {
        let namespace = context.namespace.as_str();
        match context.level_name.as_str() {
            "TRACE" => tracing::trace!(target: "logtree", namespace, "{}", probe),
            "DEBUG" => tracing::debug!(target: "logtree", namespace, "{}", probe),
            "WARN" => tracing::warn!(target: "logtree", namespace, "{}", probe),
            "ERROR" | "FATAL" => tracing::error!(target: "logtree", namespace, "{}", probe),
            _ => tracing::info!(target: "logtree", namespace, "{}", probe),
        }
    }
}

/// Discards every probe
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&self, _probe: &str, _context: &ProbeContext) {}
}

/// Debug rendering for boxed sinks
pub(crate) struct SinkDebug;

impl fmt::Debug for SinkDebug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn OutputSink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |probe: &str, ctx: &ProbeContext| {
                seen.lock().push(format!("{}|{}", ctx.namespace, probe));
            }
        };

        let ctx = ProbeContext {
            level: Rank::new(300),
            level_name: "INFO".to_string(),
            namespace: "a.b".to_string(),
        };
        sink.emit("hello", &ctx);
        assert_eq!(seen.lock().as_slice(), ["a.b|hello".to_string()]);
        assert!(!ctx.is_post());
    }

    #[test]
    fn test_console_stream_selection() {
        assert!(ConsoleSink::uses_stderr("ERROR"));
        assert!(ConsoleSink::uses_stderr("WARN"));
        assert!(!ConsoleSink::uses_stderr("DEBUG"));
        assert!(!ConsoleSink::uses_stderr("POST"));
    }

    #[derive(Debug, PartialEq)]
    struct Seen {
        level: tracing::Level,
        target: String,
        namespace: String,
        message: String,
    }

    #[derive(Default)]
    struct Fields {
        namespace: String,
        message: String,
    }

    impl tracing::field::Visit for Fields {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "namespace" {
                self.namespace = value.to_string();
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.message = format!("{:?}", value);
            }
        }
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Seen>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut fields = Fields::default();
            event.record(&mut fields);
            let meta = event.metadata();
            self.0.lock().push(Seen {
                level: *meta.level(),
                target: meta.target().to_string(),
                namespace: fields.namespace,
                message: fields.message,
            });
        }
    }

    #[test]
    fn test_tracing_sink_levels() {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            for (name, namespace) in [
                ("TRACE", "a"),
                ("WARN", "a.b"),
                ("FATAL", "boot"),
                ("FLOW", "svc.step"),
                ("POST", ""),
            ] {
                let ctx = ProbeContext {
                    level: Rank::new(100),
                    level_name: name.to_string(),
                    namespace: namespace.to_string(),
                };
                TracingSink.emit(&format!("{} probe", name), &ctx);
            }
        });

        let seen = capture.0.lock();
        let levels: Vec<tracing::Level> = seen.iter().map(|s| s.level).collect();
        assert_eq!(
            levels,
            [
                tracing::Level::TRACE,
                tracing::Level::WARN,
                tracing::Level::ERROR,
                tracing::Level::INFO,
                tracing::Level::INFO,
            ]
        );
        assert!(seen.iter().all(|s| s.target == "logtree"));
        assert_eq!(seen[1].namespace, "a.b");
        assert_eq!(seen[3].namespace, "svc.step");
        assert_eq!(seen[3].message, "FLOW probe");
        assert_eq!(seen[2].message, "FATAL probe");
    }
}
