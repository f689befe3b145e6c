//! Persistence sinks
//!
//! The sink receives exactly one write per session. There is no update or
//! merge; a failed write is reported once and never retried by the engine.

use crate::error::ComputeError;
use crate::payload::PersistencePayload;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for computed session payloads
pub trait PersistenceSink {
    fn write(&mut self, payload: &PersistencePayload) -> Result<(), ComputeError>;
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for Box<S> {
    fn write(&mut self, payload: &PersistencePayload) -> Result<(), ComputeError> {
        (**self).write(payload)
    }
}

/// In-memory sink; rejects a second write for the same session
#[derive(Debug, Default)]
pub struct MemorySink {
    payloads: Vec<PersistencePayload>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> &[PersistencePayload] {
        &self.payloads
    }

    pub fn into_payloads(self) -> Vec<PersistencePayload> {
        self.payloads
    }
}

impl PersistenceSink for MemorySink {
    fn write(&mut self, payload: &PersistencePayload) -> Result<(), ComputeError> {
        if self
            .payloads
            .iter()
            .any(|p| p.session_id == payload.session_id)
        {
            return Err(ComputeError::PersistenceError(format!(
                "session {} already recorded",
                payload.session_id
            )));
        }
        self.payloads.push(payload.clone());
        Ok(())
    }
}

/// Appends one JSON line per payload to a file
#[derive(Debug, Clone)]
pub struct NdjsonFileSink {
    path: PathBuf,
}

impl NdjsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for NdjsonFileSink {
    fn write(&mut self, payload: &PersistencePayload) -> Result<(), ComputeError> {
        let line = serde_json::to_string(payload)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ComputeError::PersistenceError(format!(
                    "cannot open {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        writeln!(file, "{}", line).map_err(|e| {
            ComputeError::PersistenceError(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}
