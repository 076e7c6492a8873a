//! Log identity and metadata records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LogError;

/// Log identifier
///
/// Wraps a UUID for type safety.
///
/// # Example
///
/// ```rust
/// use chunklog_core::log::LogId;
///
/// let id = LogId::new();
/// let parsed: LogId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(Uuid);

impl LogId {
    /// Create a new random log ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Name of the blob-store ref holding this log's root node
    pub fn ref_name(&self) -> String {
        format!("logs/{}", self.0.simple())
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LogId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for LogId {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| LogError::invalid_operation(format!("invalid log id '{}': {}", s, e)))
    }
}

/// Format of the text stored in a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// Plain text lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogType {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(LogError::invalid_operation(format!(
                "unknown log type '{}'",
                other
            ))),
        }
    }
}

/// Metadata handle for a log
///
/// Handles are values: every successful update returns a new handle with a
/// bumped `version`, and updates presented with a stale handle are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Identity
    pub id: LogId,
    /// Text or JSON
    pub log_type: LogType,
    /// Ref in the blob store that points at the current root node
    pub ref_name: String,
    /// Number of committed lines
    pub line_count: u64,
    /// Set once no more data will be appended
    pub complete: bool,
    /// Incremented by every metadata update
    pub version: u64,
    /// When the log was created
    pub created_at: DateTime<Utc>,
    /// When the metadata last changed
    pub updated_at: DateTime<Utc>,
}

impl Log {
    /// A fresh, empty log record
    pub fn new(log_type: LogType) -> Self {
        let id = LogId::new();
        let now = Utc::now();
        Self {
            id,
            log_type,
            ref_name: id.ref_name(),
            line_count: 0,
            complete: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a line-count update, enforcing the append-only rules
    ///
    /// The count may not decrease and a complete log may only be "updated"
    /// with its own final state.
    pub fn advanced(&self, line_count: u64, complete: bool) -> Result<Self, LogError> {
        if self.complete {
            if complete && line_count == self.line_count {
                return Ok(self.clone());
            }
            return Err(LogError::LogComplete(self.id.to_string()));
        }
        if line_count < self.line_count {
            return Err(LogError::invalid_operation(format!(
                "line count of log {} cannot decrease from {} to {}",
                self.id, self.line_count, line_count
            )));
        }

        let mut next = self.clone();
        next.line_count = line_count;
        next.complete = complete;
        next.version += 1;
        next.updated_at = Utc::now();
        Ok(next)
    }
}
