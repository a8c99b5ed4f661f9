//! Recording sessions
//!
//! A recording is a scoped resource: once started it is held until stopped,
//! and stopping flushes every buffered chunk into the final download.

use crate::types::{Download, SessionId};
use crate::Result;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Container produced by the host recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingContainer {
    #[default]
    WebM,
    Mp4,
}

impl RecordingContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            RecordingContainer::WebM => "webm",
            RecordingContainer::Mp4 => "mp4",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            RecordingContainer::WebM => "video/webm",
            RecordingContainer::Mp4 => "video/mp4",
        }
    }

    /// Download name of a finished recording
    pub fn file_name(&self) -> String {
        format!("recorded.{}", self.extension())
    }
}

/// Host-side capture handle
pub trait CaptureSink {
    /// Stop capturing. Returns chunks the sink still held; hosts that deliver
    /// every chunk through [`RecordingSession::push_chunk`] return none.
    fn stop(&mut self) -> Result<Vec<Bytes>>;
}

/// An active recording
pub struct RecordingSession {
    id: SessionId,
    container: RecordingContainer,
    sink: Box<dyn CaptureSink>,
    chunks: Vec<Bytes>,
    started_at: DateTime<Utc>,
}

impl RecordingSession {
    pub fn start(sink: Box<dyn CaptureSink>, container: RecordingContainer) -> Self {
        let session = Self {
            id: SessionId::new(),
            container,
            sink,
            chunks: Vec::new(),
            started_at: Utc::now(),
        };
        info!(session = %session.id, container = container.extension(), "Recording started");
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn container(&self) -> RecordingContainer {
        self.container
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Buffer a chunk of recorded data; empty chunks are dropped
    pub fn push_chunk(&mut self, chunk: Bytes) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Stop the sink and assemble the download
    pub fn stop(mut self) -> Result<Download> {
        for chunk in self.sink.stop()? {
            self.push_chunk(chunk);
        }

        let mut out = BytesMut::with_capacity(self.buffered_bytes());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }

        let elapsed = Utc::now() - self.started_at;
        info!(
            session = %self.id,
            bytes = out.len(),
            chunks = self.chunks.len(),
            elapsed_ms = elapsed.num_milliseconds(),
            "Recording stopped"
        );

        Ok(Download::new(
            self.container.file_name(),
            self.container.mime_type(),
            out.freeze(),
        ))
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("chunks", &self.chunks.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
