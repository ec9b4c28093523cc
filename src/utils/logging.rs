//! Structured logging with field redaction
//!
//! Executor decisions are written as one line per event:
//! `[timestamp] LEVEL [target] message | key=value ...`.
//! Values are redacted by field name before they are ever formatted into a
//! line, so a signature or key cannot reach stderr by accident.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

/// Log levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Lines are copied here while a capture is active
static CAPTURE: Mutex<Option<Vec<String>>> = Mutex::new(None);

pub fn enable_debug() {
    MIN_LEVEL.store(LogLevel::Debug as u8, Ordering::Relaxed);
}

pub fn disable_debug() {
    MIN_LEVEL.store(LogLevel::Info as u8, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    MIN_LEVEL.load(Ordering::Relaxed) == LogLevel::Debug as u8
}

fn is_enabled(level: LogLevel) -> bool {
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

/// Start copying emitted lines into an in-memory buffer
pub fn start_capture() {
    *CAPTURE.lock().unwrap_or_else(|e| e.into_inner()) = Some(Vec::new());
}

/// Stop capturing and return the lines seen since `start_capture`
pub fn take_capture() -> Vec<String> {
    CAPTURE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take()
        .unwrap_or_default()
}

/// How a field value is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Redaction {
    /// Never shown, only its length
    Hidden,
    /// 32-byte words: first 10 and last 6 hex digits
    Hash,
    /// Addresses: first 6 and last 4 hex digits
    Address,
    Plain,
}

impl Redaction {
    fn for_key(key: &str) -> Self {
        const HIDDEN: &[&str] = &["private_key", "privatekey", "secret", "seed", "signature", "sig"];
        const HASHES: &[&str] = &["hash", "digest", "key_id"];
        const ADDRESSES: &[&str] = &["address", "account", "signer", "target", "module"];

        let key = key.to_ascii_lowercase();
        let matches = |list: &[&str]| list.iter().any(|k| key.contains(k));

        // Order matters: `operation_hash` is a hash, `signer` is an address
        if matches(HIDDEN) && !key.contains("signer") {
            Redaction::Hidden
        } else if matches(HASHES) {
            Redaction::Hash
        } else if matches(ADDRESSES) {
            Redaction::Address
        } else {
            Redaction::Plain
        }
    }

    fn apply(self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return "[EMPTY]".to_string();
        }
        match self {
            Redaction::Hidden if value.len() <= 4 => "[REDACTED]".to_string(),
            Redaction::Hidden => format!("[REDACTED:{}chars]", value.len()),
            Redaction::Hash => shorten(value, 10, 6),
            Redaction::Address => shorten(value, 6, 4),
            Redaction::Plain => value.to_string(),
        }
    }
}

/// Keep `head` hex digits after any `0x` and `tail` digits at the end
fn shorten(value: &str, head: usize, tail: usize) -> String {
    let prefix = if value.starts_with("0x") { 2 } else { 0 };
    let keep = prefix + head;
    if !value.is_ascii() || value.len() <= keep + tail + 3 {
        return value.to_string();
    }
    format!("{}...{}", &value[..keep], &value[value.len() - tail..])
}

/// One structured log line
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub target: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            target,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Attach a field; the value is redacted according to `key`
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let shown = Redaction::for_key(key).apply(&value.to_string());
        self.fields.push((key, shown));
        self
    }

    pub fn render(&self) -> String {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let mut line = format!("[{}] {} [{}] {}", timestamp, self.level, self.target, self.message);

        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push_str(if i == 0 { " | " } else { " " });
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    /// Write to stderr if the level is enabled
    pub fn log(self) {
        if !is_enabled(self.level) {
            return;
        }
        let line = self.render();
        if let Some(buffer) = CAPTURE.lock().unwrap_or_else(|e| e.into_inner()).as_mut() {
            buffer.push(line.clone());
        }
        eprintln!("{}", line);
    }
}

/// Build and emit a `LogEntry` at an explicit level
#[macro_export]
macro_rules! log_at {
    ($level:expr, $target:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new($level, $target, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => {
        $crate::log_at!($crate::utils::logging::LogLevel::Debug, $($args)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => {
        $crate::log_at!($crate::utils::logging::LogLevel::Info, $($args)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => {
        $crate::log_at!($crate::utils::logging::LogLevel::Warn, $($args)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => {
        $crate::log_at!($crate::utils::logging::LogLevel::Error, $($args)*)
    };
}
