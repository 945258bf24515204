use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String key-value storage seam. The watcher and sound bank only ever
/// talk to this trait, so tests can substitute an in-memory fake and a
/// broken backend degrades instead of crashing callers.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;
}
