use std::sync::Mutex;

use super::SessionStore;
use crate::error::{CoreError, Result};
use crate::session::SessionRecord;

/// In-process session store. Useful for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<SessionRecord>>,
    /// When set, every call fails with this message.
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SessionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            failure: None,
        }
    }

    /// A store whose calls always fail, for exercising warning paths.
    pub fn failing(message: &str) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SessionRecord>> {
        // A poisoned lock still holds valid records.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(CoreError::backend("memory", message.clone())),
            None => Ok(()),
        }
    }
}

impl SessionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn insert(&self, record: &SessionRecord) -> Result<()> {
        self.check()?;
        self.lock().push(record.clone());
        Ok(())
    }

    fn select_all(&self) -> Result<Vec<SessionRecord>> {
        self.check()?;
        Ok(self.lock().clone())
    }
}
