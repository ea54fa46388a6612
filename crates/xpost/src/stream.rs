//! Newline-delimited JSON stream consumption.
//!
//! X streams send one JSON object per line, with blank `\r\n` keep-alives in
//! between. The consumer decodes records as they arrive and stops after a
//! fixed number of them, after a period without any data, or when the
//! server closes the connection. The source is dropped on return, which
//! closes the underlying connection.

use std::pin::pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{XpostError, XpostResult};

/// Longest record kept in memory; longer ones are dropped.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

/// Why consumption ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The requested number of records arrived.
    Target,
    /// Nothing arrived within the idle timeout.
    Idle,
    /// The server closed the stream.
    Closed,
}

/// Summary of a finished consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub records: usize,
    pub end: StreamEnd,
}

/// Decode records from `source` and pass each to `emit`.
///
/// # Errors
///
/// A transport error from `source`, or whatever `emit` returns.
pub async fn consume<S, E, F>(
    source: S,
    target: usize,
    idle_timeout: Duration,
    mut emit: F,
) -> XpostResult<StreamSummary>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<XpostError>,
    F: FnMut(Value) -> XpostResult<()>,
{
    let mut source = pin!(source);
    let mut buffer: Vec<u8> = Vec::new();
    // Set while skipping the rest of an oversized record.
    let mut discarding = false;
    let mut records = 0;

    if target == 0 {
        return Ok(StreamSummary {
            records,
            end: StreamEnd::Target,
        });
    }

    let end = loop {
        let chunk = match tokio::time::timeout(idle_timeout, source.next()).await {
            Err(_) => {
                info!(idle_secs = idle_timeout.as_secs(), "Stream idle, disconnecting");
                break StreamEnd::Idle;
            }
            Ok(None) => {
                debug!("Stream closed by server");
                if discarding {
                    break StreamEnd::Closed;
                }
                if let Some(record) = decode_line(&buffer) {
                    emit(record)?;
                    records += 1;
                }
                break StreamEnd::Closed;
            }
            Ok(Some(chunk)) => chunk.map_err(Into::into)?,
        };

        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if std::mem::take(&mut discarding) {
                continue;
            }
            if line.len() > MAX_RECORD_BYTES {
                warn!(len = line.len(), "Dropping oversized stream record");
                continue;
            }
            let Some(record) = decode_line(&line) else {
                continue;
            };

            emit(record)?;
            records += 1;

            if records >= target {
                return Ok(StreamSummary {
                    records,
                    end: StreamEnd::Target,
                });
            }
        }

        if buffer.len() > MAX_RECORD_BYTES {
            if !discarding {
                warn!(len = buffer.len(), "Dropping oversized stream record");
            }
            buffer.clear();
            discarding = true;
        }
    };

    Ok(StreamSummary { records, end })
}

/// Parse one line; blank keep-alives and malformed records yield `None`.
fn decode_line(line: &[u8]) -> Option<Value> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice(line) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, len = line.len(), "Skipping malformed stream record");
            None
        }
    }
}
