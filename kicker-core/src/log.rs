//! Per-session audit log.
//!
//! A [`SessionLog`] opens its handle on the first write and closes it exactly
//! once, either on explicit [`SessionLog::close`] or when dropped. After close
//! further writes are discarded; the handle is never reopened.

use std::{
    fs,
    io::Write as _,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Context as _;
use chrono::Utc;
use tracing::{Level, debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::host::{SessionLogFactory, SessionLogWriter};
use crate::target::ScopeKey;

enum Slot {
    Unopened,
    Open(Box<dyn SessionLogWriter>),
    Closed,
}

pub struct SessionLog {
    scope: ScopeKey,
    name: String,
    factory: Arc<dyn SessionLogFactory>,
    slot: Mutex<Slot>,
}

impl SessionLog {
    pub fn new(scope: ScopeKey, name: String, factory: Arc<dyn SessionLogFactory>) -> Self {
        Self {
            scope,
            name,
            factory,
            slot: Mutex::new(Slot::Unopened),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self, message: &str) {
        self.write(Level::INFO, message);
    }

    pub fn error(&self, message: &str) {
        self.write(Level::ERROR, message);
    }

    pub fn write(&self, level: Level, message: &str) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if matches!(*slot, Slot::Unopened) {
            match self.factory.open(self.scope, &self.name) {
                Ok(writer) => *slot = Slot::Open(writer),
                Err(source) => {
                    warn!(?source, session_log = %self.name, "failed to open session log");
                    return;
                }
            }
        }

        match &mut *slot {
            Slot::Open(writer) => {
                if let Err(source) = writer.write_line(level, message) {
                    warn!(?source, session_log = %self.name, "failed to write session log");
                }
            }
            Slot::Closed => {
                debug!(session_log = %self.name, "session log already closed, dropping line");
            }
            Slot::Unopened => {}
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        matches!(
            *self.slot.lock().unwrap_or_else(PoisonError::into_inner),
            Slot::Open(_)
        )
    }

    /// Close the handle if one is open.
    ///
    /// Returns `true` only for the call that actually closed a handle.
    pub fn close(&self) -> bool {
        let previous = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, Slot::Closed)
        };

        match previous {
            Slot::Open(mut writer) => {
                if let Err(source) = writer.close() {
                    warn!(?source, session_log = %self.name, "failed to close session log");
                }
                true
            }
            Slot::Unopened | Slot::Closed => false,
        }
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Writes each session to `<directory>/<session name>.log`.
#[derive(Clone, Debug)]
pub struct FileLogFactory {
    directory: PathBuf,
}

impl FileLogFactory {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl SessionLogFactory for FileLogFactory {
    fn open(
        &self,
        _scope: ScopeKey,
        session_name: &str,
    ) -> anyhow::Result<Box<dyn SessionLogWriter>> {
        fs::create_dir_all(&self.directory).with_context(|| {
            format!("failed to create log directory {}", self.directory.display())
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(session_name)
            .filename_suffix("log")
            .build(&self.directory)
            .with_context(|| format!("failed to create session log {session_name}"))?;

        Ok(Box::new(FileLogWriter { appender }))
    }
}

struct FileLogWriter {
    appender: RollingFileAppender,
}

impl SessionLogWriter for FileLogWriter {
    fn write_line(&mut self, level: Level, message: &str) -> anyhow::Result<()> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.appender, "{timestamp} | {:>6} | {message}", level.as_str())?;
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.appender.flush()?;
        Ok(())
    }
}
