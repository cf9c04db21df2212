use crate::library::logger::interface::Logger;
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LoggerConsole {
    namespace: Option<String>,
    timezone: chrono::FixedOffset,
}

impl LoggerConsole {
    pub fn new(timezone: chrono::FixedOffset) -> Self {
        Self {
            namespace: None,
            timezone,
        }
    }

    fn line(&self, level: &str, message: &str) -> String {
        let local_time = Utc::now().with_timezone(&self.timezone);
        let formatted = local_time.format("%Y-%m-%d %I:%M:%S%.3f %p");
        match &self.namespace {
            Some(namespace) => format!("[{}] {} {}: {}", formatted, level, namespace, message),
            None => format!("[{}] {} {}", formatted, level, message),
        }
    }
}

impl Logger for LoggerConsole {
    // Logs go to stderr so they never interleave with shell output on stdout.
    fn info(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        writeln!(std::io::stderr(), "{}", self.line("INFO", message))?;
        Ok(())
    }

    fn error(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        writeln!(std::io::stderr(), "{}", self.line("ERROR", message))?;
        Ok(())
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        let new_namespace = match &self.namespace {
            Some(current) => format!("{}:{}", current, namespace),
            None => namespace.to_string(),
        };

        Arc::new(LoggerConsole {
            namespace: Some(new_namespace),
            timezone: self.timezone,
        })
    }
}
