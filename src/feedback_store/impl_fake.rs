use crate::error::PersistenceError;
use crate::feedback_store::interface::{FeedbackRecord, FeedbackStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

fn read_only() -> PersistenceError {
    PersistenceError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_READONLY),
        Some("attempt to write a readonly database".to_string()),
    ))
}

#[derive(Default)]
pub struct FeedbackStoreFake {
    records: Mutex<Vec<FeedbackRecord>>,
    initializations: AtomicUsize,
    unwritable: AtomicBool,
}

impl FeedbackStoreFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FeedbackRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    pub fn set_unwritable(&self, unwritable: bool) {
        self.unwritable.store(unwritable, Ordering::SeqCst);
    }
}

impl FeedbackStore for FeedbackStoreFake {
    fn initialize(&self) -> Result<(), PersistenceError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn append(
        &self,
        image_reference: &str,
        prediction_set: &str,
        feedback_text: &str,
    ) -> Result<i64, PersistenceError> {
        if self.unwritable.load(Ordering::SeqCst) {
            return Err(read_only());
        }

        let mut records = self.records.lock().map_err(|_| read_only())?;
        let id = records.len() as i64 + 1;
        records.push(FeedbackRecord {
            id,
            image_reference: image_reference.to_string(),
            prediction_set: prediction_set.to_string(),
            feedback_text: feedback_text.to_string(),
        });
        Ok(id)
    }
}
