//! Minimal key-value + list capability the time series is written against.
//!
//! Any store that can apply a batch of [`Command`]s atomically (an embedded
//! map, or a networked server with transactions) can back a
//! [`TimeSeriesStore`](super::TimeSeriesStore).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backing store unreachable: {0}")]
    Unreachable(String),
    #[error("key `{0}` holds a value of the wrong type")]
    WrongType(String),
    #[error("unexpected reply from backing store")]
    UnexpectedReply,
}

/// List indices are inclusive; negative values count back from the tail,
/// so `(0, -1)` is the whole list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    Get { key: String },
    /// Insert at the head of the list, creating it if needed.
    ListPush { key: String, value: String },
    /// Keep only `start..=end`; an empty range deletes the key.
    ListTrim { key: String, start: i64, end: i64 },
    ListRange { key: String, start: i64, end: i64 },
    ListLen { key: String },
    Delete { key: String },
}

impl Command {
    pub fn set(key: &str, value: String) -> Self {
        Command::Set {
            key: key.to_string(),
            value,
        }
    }

    pub fn get(key: &str) -> Self {
        Command::Get {
            key: key.to_string(),
        }
    }

    pub fn list_push(key: &str, value: String) -> Self {
        Command::ListPush {
            key: key.to_string(),
            value,
        }
    }

    pub fn list_trim(key: &str, start: i64, end: i64) -> Self {
        Command::ListTrim {
            key: key.to_string(),
            start,
            end,
        }
    }

    pub fn list_range(key: &str, start: i64, end: i64) -> Self {
        Command::ListRange {
            key: key.to_string(),
            start,
            end,
        }
    }

    pub fn list_len(key: &str) -> Self {
        Command::ListLen {
            key: key.to_string(),
        }
    }

    pub fn delete(key: &str) -> Self {
        Command::Delete {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Set { key, .. }
            | Command::Get { key }
            | Command::ListPush { key, .. }
            | Command::ListTrim { key, .. }
            | Command::ListRange { key, .. }
            | Command::ListLen { key }
            | Command::Delete { key } => key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Nil,
    Value(String),
    Values(Vec<String>),
    Int(u64),
}

impl Reply {
    pub fn into_value(self) -> Result<Option<String>, BackendError> {
        match self {
            Reply::Value(v) => Ok(Some(v)),
            Reply::Nil => Ok(None),
            _ => Err(BackendError::UnexpectedReply),
        }
    }

    pub fn into_values(self) -> Result<Vec<String>, BackendError> {
        match self {
            Reply::Values(v) => Ok(v),
            _ => Err(BackendError::UnexpectedReply),
        }
    }

    pub fn into_int(self) -> Result<u64, BackendError> {
        match self {
            Reply::Int(n) => Ok(n),
            _ => Err(BackendError::UnexpectedReply),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendInfo {
    pub memory_usage: Option<String>,
    pub uptime_seconds: Option<u64>,
}

pub trait Backend: Send + Sync {
    /// Applies `batch` as one unit: either every command takes effect, or none
    /// does and an error is returned. Batches never interleave.
    fn execute(&self, batch: Vec<Command>) -> Result<Vec<Reply>, BackendError>;

    fn ping(&self) -> Result<(), BackendError>;

    fn info(&self) -> Result<BackendInfo, BackendError>;
}

/// Resolves an inclusive, possibly negative index pair against a list of
/// `len` items. `None` means the range is empty.
pub fn resolve_range(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };
    if len == 0 || start > end || start >= len {
        return None;
    }
    Some((start as usize, end as usize))
}
