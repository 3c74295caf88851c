use serde::Serialize;
use serde_json::{Map, Value};
use std::env;
use std::fmt::Display;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const SERVICE_NAME: &str = "legal-console";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct Logger {
    env: Arc<str>,
    host: Arc<str>,
    min_level: LogLevel,
}

impl Logger {
    pub fn new(host: String) -> Self {
        let env = env::var("APP_ENV")
            .or_else(|_| env::var("RUST_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        Self {
            env: Arc::from(env),
            host: Arc::from(host),
            min_level: LogLevel::from_env(),
        }
    }

    /// Logger for the local machine, falling back to `unknown` when the
    /// hostname cannot be read.
    pub fn for_local_host() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|value| value.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());
        Self::new(hostname)
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn info<T: Serialize>(&self, event: &str, context: T) {
        self.emit(LogLevel::Info, event, context);
    }

    pub fn warn<T: Serialize>(&self, event: &str, context: T) {
        self.emit(LogLevel::Warn, event, context);
    }

    pub fn error<T: Serialize>(&self, event: &str, context: T) {
        self.emit(LogLevel::Error, event, context);
    }

    pub fn debug<T: Serialize>(&self, event: &str, context: T) {
        self.emit(LogLevel::Debug, event, context);
    }

    fn emit<T: Serialize>(&self, level: LogLevel, event: &str, context: T) {
        if level > self.min_level {
            return;
        }
        let line = self.format_line(level, event, context);
        match level {
            LogLevel::Error | LogLevel::Warn => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn format_line<T: Serialize>(&self, level: LogLevel, event: &str, context: T) -> String {
        let timestamp = OffsetDateTime::now_utc();
        let mut payload = Map::new();
        payload.insert(
            "timestamp".to_string(),
            Value::String(
                timestamp
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| timestamp.to_string()),
            ),
        );
        payload.insert("service".to_string(), Value::String(SERVICE_NAME.to_string()));
        payload.insert("env".to_string(), Value::String(self.env.to_string()));
        payload.insert("host".to_string(), Value::String(self.host.to_string()));
        payload.insert("level".to_string(), Value::String(level.as_str().to_string()));
        payload.insert("event".to_string(), Value::String(event.to_string()));

        match serde_json::to_value(context).unwrap_or(Value::Null) {
            Value::Object(map) => {
                for (key, value) in map {
                    payload.insert(key, value);
                }
            }
            Value::Null => {}
            other => {
                payload.insert("context".to_string(), other);
            }
        }

        Value::Object(payload).to_string()
    }
}

pub fn log_error<E: Display>(logger: &Logger, event: &str, error: E) {
    logger.error(event, serde_json::json!({ "error": error.to_string() }));
}
