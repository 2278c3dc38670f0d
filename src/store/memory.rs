use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::Mutex;

use crate::format::format_bytes;

use super::backend::{Backend, BackendError, BackendInfo, Command, Reply, resolve_range};

#[derive(Debug)]
enum Entry {
    Value(String),
    List(VecDeque<String>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Value,
    List,
}

impl Entry {
    fn kind(&self) -> Kind {
        match self {
            Entry::Value(_) => Kind::Value,
            Entry::List(_) => Kind::List,
        }
    }
}

/// Embedded [`Backend`] keeping everything in process memory.
///
/// Lists are `VecDeque`s, so head inserts and tail trims are O(1) amortized.
/// One lock covers the whole keyspace, which makes every batch atomic.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    started: Instant,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            entries: Mutex::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    fn payload_bytes(entries: &HashMap<String, Entry>) -> u64 {
        entries
            .iter()
            .map(|(key, entry)| {
                let body: usize = match entry {
                    Entry::Value(v) => v.len(),
                    Entry::List(items) => items.iter().map(String::len).sum(),
                };
                (key.len() + body) as u64
            })
            .sum()
    }
}

/// Dry-runs the batch against the key kinds it would see, so a type error
/// rejects the batch before anything is written.
fn check(entries: &HashMap<String, Entry>, batch: &[Command]) -> Result<(), BackendError> {
    let mut overlay: HashMap<&str, Option<Kind>> = HashMap::new();
    for command in batch {
        let key = command.key();
        let current = match overlay.get(key) {
            Some(kind) => *kind,
            None => entries.get(key).map(Entry::kind),
        };
        let wrong_type = || BackendError::WrongType(key.to_string());
        let next = match command {
            Command::Set { .. } => Some(Kind::Value),
            Command::Delete { .. } => None,
            Command::Get { .. } => {
                if current == Some(Kind::List) {
                    return Err(wrong_type());
                }
                current
            }
            Command::ListPush { .. } => {
                if current == Some(Kind::Value) {
                    return Err(wrong_type());
                }
                Some(Kind::List)
            }
            Command::ListTrim { .. } | Command::ListRange { .. } | Command::ListLen { .. } => {
                if current == Some(Kind::Value) {
                    return Err(wrong_type());
                }
                current
            }
        };
        overlay.insert(key, next);
    }
    Ok(())
}

fn apply(entries: &mut HashMap<String, Entry>, command: Command) -> Reply {
    match command {
        Command::Set { key, value } => {
            entries.insert(key, Entry::Value(value));
            Reply::Ok
        }
        Command::Get { key } => match entries.get(&key) {
            Some(Entry::Value(v)) => Reply::Value(v.clone()),
            _ => Reply::Nil,
        },
        Command::ListPush { key, value } => {
            let entry = entries
                .entry(key)
                .or_insert_with(|| Entry::List(VecDeque::new()));
            match entry {
                Entry::List(items) => {
                    items.push_front(value);
                    Reply::Int(items.len() as u64)
                }
                // Rejected by `check`.
                Entry::Value(_) => Reply::Nil,
            }
        }
        Command::ListTrim { key, start, end } => {
            let Some(Entry::List(items)) = entries.get_mut(&key) else {
                return Reply::Ok;
            };
            match resolve_range(items.len(), start, end) {
                Some((from, to)) => {
                    items.truncate(to + 1);
                    items.drain(..from);
                }
                None => {
                    entries.remove(&key);
                }
            }
            Reply::Ok
        }
        Command::ListRange { key, start, end } => {
            let Some(Entry::List(items)) = entries.get(&key) else {
                return Reply::Values(Vec::new());
            };
            let values = match resolve_range(items.len(), start, end) {
                Some((from, to)) => items.range(from..=to).cloned().collect(),
                None => Vec::new(),
            };
            Reply::Values(values)
        }
        Command::ListLen { key } => match entries.get(&key) {
            Some(Entry::List(items)) => Reply::Int(items.len() as u64),
            _ => Reply::Int(0),
        },
        Command::Delete { key } => Reply::Int(u64::from(entries.remove(&key).is_some())),
    }
}

impl Backend for MemoryBackend {
    fn execute(&self, batch: Vec<Command>) -> Result<Vec<Reply>, BackendError> {
        let mut entries = self.entries.lock();
        check(&entries, &batch)?;
        Ok(batch
            .into_iter()
            .map(|command| apply(&mut entries, command))
            .collect())
    }

    fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn info(&self) -> Result<BackendInfo, BackendError> {
        let entries = self.entries.lock();
        Ok(BackendInfo {
            memory_usage: Some(format_bytes(Self::payload_bytes(&entries))),
            uptime_seconds: Some(self.started.elapsed().as_secs()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(backend: &MemoryBackend, batch: Vec<Command>) -> Vec<Reply> {
        backend.execute(batch).unwrap()
    }

    #[test]
    fn set_get_delete() {
        let backend = MemoryBackend::new();
        run(&backend, vec![Command::set("k", "v".into())]);
        assert_eq!(
            run(&backend, vec![Command::get("k")]),
            vec![Reply::Value("v".into())]
        );
        assert_eq!(run(&backend, vec![Command::delete("k")]), vec![Reply::Int(1)]);
        assert_eq!(run(&backend, vec![Command::get("k")]), vec![Reply::Nil]);
        assert_eq!(run(&backend, vec![Command::delete("k")]), vec![Reply::Int(0)]);
    }

    #[test]
    fn push_prepends_and_trim_caps_length() {
        let backend = MemoryBackend::new();
        for i in 0..10 {
            run(
                &backend,
                vec![
                    Command::list_push("l", i.to_string()),
                    Command::list_trim("l", 0, 4),
                ],
            );
        }
        let replies = run(&backend, vec![Command::list_range("l", 0, -1), Command::list_len("l")]);
        assert_eq!(
            replies,
            vec![
                Reply::Values(vec!["9".into(), "8".into(), "7".into(), "6".into(), "5".into()]),
                Reply::Int(5),
            ]
        );
    }

    #[test]
    fn range_past_end_is_clamped() {
        let backend = MemoryBackend::new();
        run(
            &backend,
            vec![
                Command::list_push("l", "a".into()),
                Command::list_push("l", "b".into()),
            ],
        );
        let replies = run(&backend, vec![Command::list_range("l", 0, 99)]);
        assert_eq!(replies, vec![Reply::Values(vec!["b".into(), "a".into()])]);
        let replies = run(&backend, vec![Command::list_range("missing", 0, 99)]);
        assert_eq!(replies, vec![Reply::Values(vec![])]);
    }

    #[test]
    fn empty_trim_removes_the_list() {
        let backend = MemoryBackend::new();
        run(&backend, vec![Command::list_push("l", "a".into())]);
        run(&backend, vec![Command::list_trim("l", 1, 0)]);
        assert_eq!(run(&backend, vec![Command::list_len("l")]), vec![Reply::Int(0)]);
        // Key is free to become a plain value again.
        run(&backend, vec![Command::set("l", "v".into())]);
    }

    #[test]
    fn type_error_rejects_whole_batch() {
        let backend = MemoryBackend::new();
        run(&backend, vec![Command::set("v", "x".into())]);
        let err = backend
            .execute(vec![
                Command::set("other", "y".into()),
                Command::list_push("v", "z".into()),
            ])
            .unwrap_err();
        assert!(matches!(err, BackendError::WrongType(ref k) if k == "v"));
        assert_eq!(run(&backend, vec![Command::get("other")]), vec![Reply::Nil]);
    }

    #[test]
    fn delete_then_push_in_one_batch_is_allowed() {
        let backend = MemoryBackend::new();
        run(&backend, vec![Command::set("k", "x".into())]);
        run(
            &backend,
            vec![Command::delete("k"), Command::list_push("k", "y".into())],
        );
        assert_eq!(run(&backend, vec![Command::list_len("k")]), vec![Reply::Int(1)]);
    }

    #[test]
    fn info_reports_payload_size() {
        let backend = MemoryBackend::new();
        run(&backend, vec![Command::set("key", "x".repeat(2048))]);
        let info = backend.info().unwrap();
        assert_eq!(info.memory_usage.as_deref(), Some("2 KB"));
        assert!(info.uptime_seconds.is_some());
    }
}
