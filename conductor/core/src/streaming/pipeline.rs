//! Byte-to-Event Pipeline
//!
//! Chains the decoder, the frame splitter and the parser so the Conductor can
//! hand over raw network chunks and get [`StreamEvent`]s back. The pipeline is
//! synchronous and owns no I/O; the caller decides when the next chunk arrives.

use super::decoder::{DecodeError, Utf8ChunkDecoder};
use super::event::{parse_frame, ParsedFrame, StreamEvent};
use super::frame::FrameSplitter;

/// Counters for one streamed reply
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Byte chunks received
    pub chunks: u32,
    /// Total bytes received
    pub bytes: usize,
    /// Frames produced by the splitter
    pub frames: u32,
    /// Delta events emitted
    pub deltas: u32,
    /// Completion events emitted
    pub completions: u32,
    /// Data frames skipped because their payload was not valid JSON
    pub malformed_frames: u32,
    /// Data frames with a payload of unknown shape
    pub unrecognized_frames: u32,
    /// Frames without the data prefix
    pub noise_frames: u32,
}

/// Decoder + splitter + parser for a single stream
#[derive(Debug, Default)]
pub struct StreamPipeline {
    decoder: Utf8ChunkDecoder,
    splitter: FrameSplitter,
    stats: PipelineStats,
}

impl StreamPipeline {
    /// Create a fresh pipeline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte chunk, returning the events it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len();

        let text = self.decoder.decode(chunk);
        let frames = self.splitter.push(&text);
        self.parse_all(frames)
    }

    /// Signal a clean end of stream
    ///
    /// A trailing frame without its delimiter is still parsed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the stream ended inside a multi-byte
    /// character. The carry-over is discarded in that case.
    pub fn finish(&mut self) -> Result<Vec<StreamEvent>, DecodeError> {
        if let Err(e) = self.decoder.finish() {
            self.splitter.discard();
            return Err(e);
        }

        let frames: Vec<String> = self.splitter.finish().into_iter().collect();
        Ok(self.parse_all(frames))
    }

    /// Drop all buffered state without emitting anything
    pub fn abandon(&mut self) {
        self.decoder.reset();
        self.splitter.discard();
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    fn parse_all(&mut self, frames: Vec<String>) -> Vec<StreamEvent> {
        let mut events = Vec::with_capacity(frames.len());

        for frame in frames {
            self.stats.frames += 1;
            match parse_frame(&frame) {
                Ok(ParsedFrame::Event(event)) => {
                    match &event {
                        StreamEvent::Delta(_) => self.stats.deltas += 1,
                        StreamEvent::Complete => self.stats.completions += 1,
                        StreamEvent::Unrecognized(_) => self.stats.unrecognized_frames += 1,
                    }
                    events.push(event);
                }
                Ok(ParsedFrame::Noise) => self.stats.noise_frames += 1,
                Err(e) => {
                    self.stats.malformed_frames += 1;
                    tracing::debug!(error = %e, "Skipping malformed frame");
                }
            }
        }

        events
    }
}
