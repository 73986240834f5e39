use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity carried by a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
    Unset,
}

impl LogLevel {
    /// Interprets an upstream `level` field.
    ///
    /// Strings are matched case-insensitively; numbers follow the pino
    /// convention Renovate logs with (30 info, 40 warn, 50 error, 60 fatal).
    /// A missing or empty level means `Info`.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => LogLevel::Info,
            Some(Value::String(s)) if s.trim().is_empty() => LogLevel::Info,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "info" => LogLevel::Info,
                "warn" | "warning" => LogLevel::Warn,
                "error" | "fatal" => LogLevel::Error,
                "success" => LogLevel::Success,
                _ => LogLevel::Unset,
            },
            Some(Value::Number(n)) => match n.as_f64() {
                Some(level) if level >= 50.0 => LogLevel::Error,
                Some(level) if level >= 40.0 => LogLevel::Warn,
                Some(level) if level >= 30.0 => LogLevel::Info,
                _ => LogLevel::Unset,
            },
            Some(_) => LogLevel::Unset,
        }
    }
}

/// One line in the live log view. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    /// Clock time, `HH:MM:SS`
    pub time: String,
    pub level: LogLevel,
    /// Upstream message tag (`"log"` when absent)
    #[serde(rename = "type")]
    pub kind: String,
    /// Original payload; `None` for entries the session synthesizes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl LogEntry {
    pub fn synthetic(message: impl Into<String>, level: LogLevel, kind: &str) -> Self {
        Self {
            message: message.into(),
            time: crate::clock::current_timestamp(),
            level,
            kind: kind.to_string(),
            raw: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyStatus {
    Discovered,
    UpdateAvailable,
}

/// Normalized dependency-update row.
///
/// Rows are keyed by `(name, current_version, new_version)`; see
/// [`DependencyTable`](crate::extract::DependencyTable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Datasource identifier (e.g., "npm", "github-releases")
    #[serde(rename = "type")]
    pub datasource: String,
    pub name: String,
    pub current_version: String,
    pub new_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dep_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DependencyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
}

impl Dependency {
    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            name: self.name.clone(),
            current_version: self.current_version.clone(),
            new_version: self.new_version.clone(),
        }
    }

    /// Overlays `newer` onto `self`: required fields are replaced, optional
    /// fields only where `newer` carries a value.
    pub fn merge(&mut self, newer: Dependency) {
        self.datasource = newer.datasource;
        self.name = newer.name;
        self.current_version = newer.current_version;
        self.new_version = newer.new_version;
        if newer.manager.is_some() {
            self.manager = newer.manager;
        }
        if newer.dep_type.is_some() {
            self.dep_type = newer.dep_type;
        }
        if newer.status.is_some() {
            self.status = newer.status;
        }
        if newer.registry_url.is_some() {
            self.registry_url = newer.registry_url;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    pub name: String,
    pub current_version: String,
    pub new_version: String,
}

/// Inbound message from the job runner. Every field is optional; unknown
/// fields are kept in `extra` so the raw payload survives intact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_files: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches_information: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LogMessage {
    pub fn text(&self) -> &str {
        self.msg.as_deref().unwrap_or("")
    }

    pub fn tag(&self) -> Option<&str> {
        self.kind.as_deref().filter(|t| !t.is_empty())
    }
}
