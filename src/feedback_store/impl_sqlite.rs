use crate::error::PersistenceError;
use crate::feedback_store::interface::FeedbackStore;
use crate::library::logger::interface::Logger;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::Arc;

const CREATE_FEEDBACK_TABLE: &str = "CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_path TEXT NOT NULL,
    prediction TEXT NOT NULL,
    feedback TEXT NOT NULL
)";

/// Feedback kept in a single SQLite file. Every operation opens its own
/// connection, which is closed when it goes out of scope.
pub struct FeedbackStoreSqlite {
    path: PathBuf,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FeedbackStoreSqlite {
    pub fn new(path: impl Into<PathBuf>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            path: path.into(),
            logger: logger.with_namespace("feedback_store"),
        }
    }

    fn connect(&self) -> Result<Connection, PersistenceError> {
        Ok(Connection::open(&self.path)?)
    }

    // Logging is best effort, the row is already written.
    fn log_info(&self, message: &str) {
        let _ = self.logger.info(message);
    }
}

impl FeedbackStore for FeedbackStoreSqlite {
    fn initialize(&self) -> Result<(), PersistenceError> {
        let conn = self.connect()?;

        conn.execute(CREATE_FEEDBACK_TABLE, [])?;

        self.log_info(&format!("Feedback table ready in {}", self.path.display()));
        Ok(())
    }

    fn append(
        &self,
        image_reference: &str,
        prediction_set: &str,
        feedback_text: &str,
    ) -> Result<i64, PersistenceError> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO feedback (image_path, prediction, feedback) VALUES (?1, ?2, ?3)",
            params![image_reference, prediction_set, feedback_text],
        )?;
        let id = conn.last_insert_rowid();

        self.log_info(&format!("Stored feedback {} for {}", id, image_reference));
        Ok(id)
    }
}
