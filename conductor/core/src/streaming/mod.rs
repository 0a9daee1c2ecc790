//! Streaming Reply Decoding
//!
//! Turns the raw bytes of a streamed chat reply into events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   bytes   ┌──────────────────┐  text  ┌───────────────┐
//! │  ByteStream  │──────────▶│ Utf8ChunkDecoder │───────▶│ FrameSplitter │
//! └──────────────┘           └──────────────────┘        └───────┬───────┘
//!                                                                │ frames
//!                                                                ▼
//!                             ┌──────────────────┐  events ┌─────────────┐
//!                             │MessageReconciler │◀────────│ parse_frame │
//!                             └──────────────────┘         └─────────────┘
//! ```
//!
//! Each stage is a plain state machine over its input. [`StreamPipeline`]
//! wires the first three together; the reconciler lives in
//! [`crate::reconciler`].
//!
//! # Example
//!
//! ```
//! use chat_conductor::streaming::{StreamEvent, StreamPipeline};
//!
//! let mut pipeline = StreamPipeline::new();
//! let mut events = pipeline.push(b"data: {\"text\": \"Hel");
//! events.extend(pipeline.push(b"lo\"}\n\ndata: {\"done\": true}\n\n"));
//!
//! assert_eq!(
//!     events,
//!     vec![StreamEvent::Delta("Hello".to_string()), StreamEvent::Complete]
//! );
//! ```

mod decoder;
mod event;
mod frame;
mod pipeline;

pub use decoder::{DecodeError, Utf8ChunkDecoder};
pub use event::{parse_frame, FrameParseError, ParsedFrame, StreamEvent, DATA_PREFIX};
pub use frame::{FrameSplitter, FRAME_DELIMITER};
pub use pipeline::{PipelineStats, StreamPipeline};
