//! Byte streams the VM writes to.
//!
//! Frames address streams by the well-known indices 0/1/2 baked into the
//! `WRITE*` instructions. The [`StreamSet`] trait abstracts the backing
//! descriptors so tests can capture output instead of touching the real
//! stdout/stderr.

use std::io::Write;

use crate::errors::RunError;

/// A well-known stream index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamId {
    /// Decodes a stream index operand.
    pub fn from_index(index: i32) -> Result<Self, RunError> {
        match index {
            0 => Ok(Self::Stdin),
            1 => Ok(Self::Stdout),
            2 => Ok(Self::Stderr),
            other => Err(RunError::BadStream(other)),
        }
    }
}

/// Destination for the VM's `WRITEI`/`WRITEO`/`WRITENL` output.
pub trait StreamSet {
    fn write(&mut self, stream: StreamId, bytes: &[u8]) -> Result<(), RunError>;
}

/// Writes to the process's real stdout and stderr.
#[derive(Debug, Default)]
pub struct StdStreams;

impl StreamSet for StdStreams {
    fn write(&mut self, stream: StreamId, bytes: &[u8]) -> Result<(), RunError> {
        let result = match stream {
            StreamId::Stdout => std::io::stdout().write_all(bytes),
            StreamId::Stderr => std::io::stderr().write_all(bytes),
            StreamId::Stdin => return Err(RunError::BadStream(0)),
        };
        result.map_err(|e| RunError::StreamWrite(e.to_string()))
    }
}

/// Captures output in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct CollectStreams {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CollectStreams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured stdout as text (lossy for non-UTF-8 bytes).
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl StreamSet for CollectStreams {
    fn write(&mut self, stream: StreamId, bytes: &[u8]) -> Result<(), RunError> {
        match stream {
            StreamId::Stdout => self.stdout.extend_from_slice(bytes),
            StreamId::Stderr => self.stderr.extend_from_slice(bytes),
            StreamId::Stdin => return Err(RunError::BadStream(0)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_index_decoding() {
        assert_eq!(StreamId::from_index(1).unwrap(), StreamId::Stdout);
        assert_eq!(StreamId::from_index(2).unwrap(), StreamId::Stderr);
        assert!(StreamId::from_index(7).is_err());
    }

    #[test]
    fn collect_streams_capture() {
        let mut streams = CollectStreams::new();
        streams.write(StreamId::Stdout, b"hi").unwrap();
        streams.write(StreamId::Stdout, b"\n").unwrap();
        streams.write(StreamId::Stderr, b"oops").unwrap();
        assert_eq!(streams.stdout_str(), "hi\n");
        assert_eq!(streams.stderr_str(), "oops");
    }
}
