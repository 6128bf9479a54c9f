//! Probe formatting pipeline.
//!
//! A probe is rendered as
//!
//! ```text
//! DEBUG 2024-01-15 10:30:00 startup.appStore:
//!       the rendered message<detail block>
//! ```
//!
//! Every stage is a replaceable hook, so an alternate layout (or a machine
//! readable one) needs no change at the call sites.

use std::fmt;
use std::sync::Arc;

use logtree_types::{Payload, ProbeError};

/// Renders the whole probe from its parts
pub type ProbeHook = Arc<dyn Fn(&Formatter, ProbeParts<'_>) -> String + Send + Sync>;
/// Renders the level label given the level name and the pad width
pub type LevelLabelHook = Arc<dyn Fn(&str, usize) -> String + Send + Sync>;
/// Renders the current time
pub type TimestampHook = Arc<dyn Fn() -> String + Send + Sync>;
/// Renders the namespace label
pub type NamespaceLabelHook = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// Post-processes the materialized message
pub type MessageHook = Arc<dyn Fn(String) -> String + Send + Sync>;
/// Renders the detail block of a payload
pub type PayloadHook = Arc<dyn Fn(&Formatter, &Payload<'_>) -> String + Send + Sync>;
/// Renders the detail block of an error payload
pub type ErrorHook = Arc<dyn Fn(&ProbeError) -> String + Send + Sync>;

/// Length of generated log ids
const LOG_ID_LEN: usize = 10;

/// Everything a probe is made of, message already materialized
#[derive(Clone, Debug)]
pub struct ProbeParts<'a> {
    pub namespace: &'a str,
    pub level_name: &'a str,
    pub label_width: usize,
    pub message: String,
    pub payload: Option<&'a Payload<'a>>,
}

/// The set of formatting hooks
#[derive(Clone)]
pub struct Formatter {
    pub probe: ProbeHook,
    pub level_label: LevelLabelHook,
    pub timestamp: TimestampHook,
    pub namespace_label: NamespaceLabelHook,
    pub message: MessageHook,
    pub payload: PayloadHook,
    pub error: ErrorHook,
}

impl Formatter {
    /// Render a complete probe
    pub fn render(&self, parts: ProbeParts<'_>) -> String {
        (self.probe)(self, parts)
    }

    pub fn level_label(&self, level_name: &str, width: usize) -> String {
        (self.level_label)(level_name, width)
    }

    pub fn timestamp(&self) -> String {
        (self.timestamp)()
    }

    pub fn namespace_label(&self, namespace: &str) -> String {
        (self.namespace_label)(namespace)
    }

    pub fn message(&self, message: String) -> String {
        (self.message)(message)
    }

    pub fn payload(&self, payload: &Payload<'_>) -> String {
        (self.payload)(self, payload)
    }

    pub fn error(&self, err: &ProbeError) -> String {
        (self.error)(err)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            probe: Arc::new(default_probe),
            level_label: Arc::new(default_level_label),
            timestamp: Arc::new(default_timestamp),
            namespace_label: Arc::new(default_namespace_label),
            message: Arc::new(default_message),
            payload: Arc::new(default_payload),
            error: Arc::new(default_error),
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter").finish_non_exhaustive()
    }
}

/// Header line, then the message indented under the namespace, then the detail
pub fn default_probe(fmt: &Formatter, parts: ProbeParts<'_>) -> String {
    let mut probe = format!(
        "{} {} {}:\n{:width$} {}",
        fmt.level_label(parts.level_name, parts.label_width),
        fmt.timestamp(),
        fmt.namespace_label(parts.namespace),
        "",
        fmt.message(parts.message),
        width = parts.label_width,
    );
    if let Some(payload) = parts.payload {
        probe.push_str(&fmt.payload(payload));
    }
    probe
}

pub fn default_level_label(level_name: &str, width: usize) -> String {
    format!("{:<width$}", level_name, width = width)
}

pub fn default_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn default_namespace_label(namespace: &str) -> String {
    namespace.to_string()
}

pub fn default_message(message: String) -> String {
    message
}

/// Dispatch on the payload variant
pub fn default_payload(fmt: &Formatter, payload: &Payload<'_>) -> String {
    match payload {
        Payload::Error(err) => fmt.error(err),
        Payload::Timestamp(at) => format!("\n    Date: {}", at.to_rfc3339()),
        Payload::Structured(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            let mut block = String::new();
            for line in pretty.lines() {
                block.push_str("\n    ");
                block.push_str(line);
            }
            block
        }
    }
}

/// Detailed error block. Assigns the error's log id on first rendering.
pub fn default_error(err: &ProbeError) -> String {
    let log_id = err.assign_log_id(generate_log_id);

    let mut block = format!("\n    Error:\n      Name:       {}", err.name);
    if let Some(status) = err.http_status {
        block.push_str(&format!(
            "\n      Status:     {}\n      StatusMsg:  {}",
            status,
            status_text(status)
        ));
    }
    block.push_str(&format!(
        "\n      Client Msg: {}\n      Message:    {}",
        err.client_msg.as_deref().unwrap_or(""),
        err.message
    ));
    if let Some(url) = &err.url {
        block.push_str(&format!("\n      URL:        {}", url));
    }
    block.push_str(&format!("\n      LogId:      {}", log_id));
    block.push_str("\n      Stack Trace:");
    for line in err.stack().unwrap_or("<not captured>").lines() {
        block.push_str("\n       ");
        block.push_str(line);
    }
    block
}

/// Short random id correlating a logged error with what the client saw
pub fn generate_log_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(LOG_ID_LEN);
    id
}

/// Canonical reason phrase of an HTTP status
fn status_text(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parts<'a>(payload: Option<&'a Payload<'a>>) -> ProbeParts<'a> {
        ProbeParts {
            namespace: "startup.appStore",
            level_name: "INFO",
            label_width: 5,
            message: "store created".to_string(),
            payload,
        }
    }

    #[test]
    fn test_default_layout() {
        let formatter = Formatter {
            timestamp: Arc::new(|| "2024-01-15 10:30:00".to_string()),
            ..Formatter::default()
        };
        let probe = formatter.render(parts(None));
        assert_eq!(
            probe,
            "INFO  2024-01-15 10:30:00 startup.appStore:\n      store created"
        );
    }

    #[test]
    fn test_error_block_assigns_log_id_once() {
        let err = ProbeError::new("ValidationError", "bad field")
            .with_status(404)
            .with_client_msg("Not there")
            .with_url("/api/students/7")
            .with_stack("at handler\nat router");
        let payload = Payload::from(&err);

        let first = Formatter::default().render(parts(Some(&payload)));
        let id = err.log_id().unwrap().to_string();
        assert_eq!(id.len(), LOG_ID_LEN);
        assert!(first.contains("Name:       ValidationError"));
        assert!(first.contains("Status:     404"));
        assert!(first.contains("StatusMsg:  Not Found"));
        assert!(first.contains("Client Msg: Not there"));
        assert!(first.contains("URL:        /api/students/7"));
        assert!(first.contains(&format!("LogId:      {}", id)));
        assert!(first.contains("\n       at router"));

        let second = Formatter::default().render(parts(Some(&payload)));
        assert!(second.contains(&format!("LogId:      {}", id)));
    }

    #[test]
    fn test_timestamp_payload_single_line() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let payload = Payload::from(at);
        let rendered = Formatter::default().payload(&payload);
        assert_eq!(rendered, "\n    Date: 2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_structured_payload_indented() {
        let payload = Payload::structured(&serde_json::json!({"id": 7}));
        let rendered = Formatter::default().payload(&payload);
        assert_eq!(rendered, "\n    {\n      \"id\": 7\n    }");
    }

    #[test]
    fn test_hooks_are_replaceable() {
        let formatter = Formatter {
            level_label: Arc::new(|name: &str, _: usize| format!("[{}]", name.to_lowercase())),
            timestamp: Arc::new(|| "T".to_string()),
            namespace_label: Arc::new(|ns: &str| ns.to_uppercase()),
            message: Arc::new(|msg: String| msg.replace("store", "STORE")),
            ..Formatter::default()
        };
        let probe = formatter.render(parts(None));
        assert!(probe.starts_with("[info] T STARTUP.APPSTORE:"));
        assert!(probe.ends_with("STORE created"));
    }

    #[test]
    fn test_probe_hook_controls_layout() {
        let formatter = Formatter {
            probe: Arc::new(|_: &Formatter, parts: ProbeParts<'_>| {
                serde_json::json!({
                    "level": parts.level_name,
                    "ns": parts.namespace,
                    "msg": parts.message,
                })
                .to_string()
            }),
            ..Formatter::default()
        };
        let probe = formatter.render(parts(None));
        let value: serde_json::Value = serde_json::from_str(&probe).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["msg"], "store created");
    }
}
