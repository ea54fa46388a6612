//! Command output: JSON documents on stdout, notes on stderr.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::error::XpostResult;

/// Where command results go.
pub struct Output {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Output {
    /// Process stdout and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { out, err }
    }

    /// A single entity, pretty-printed as `{"data": ...}`.
    ///
    /// # Errors
    ///
    /// Write failures.
    pub fn entity(&mut self, data: Value) -> XpostResult<()> {
        let document = json!({ "data": data });
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// The result of a state toggle, e.g. `{"data": {"liked": true}}`.
    ///
    /// # Errors
    ///
    /// Write failures.
    pub fn toggle(&mut self, flag: &str, state: bool) -> XpostResult<()> {
        self.entity(json!({ flag: state }))
    }

    /// One item of a multi-entity result, as a single compact line.
    ///
    /// # Errors
    ///
    /// Write failures.
    pub fn line(&mut self, item: &Value) -> XpostResult<()> {
        serde_json::to_writer(&mut self.out, item)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Informational text for humans.
    ///
    /// # Errors
    ///
    /// Write failures.
    pub fn note(&mut self, message: &str) -> XpostResult<()> {
        writeln!(self.err, "{message}")?;
        Ok(())
    }
}
