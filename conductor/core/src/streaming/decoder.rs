//! Incremental UTF-8 Decoder
//!
//! Turns raw byte chunks into text chunks. A multi-byte character split
//! across two network reads is held back until its remaining bytes arrive.

use std::borrow::Cow;

use thiserror::Error;

/// The byte stream ended in the middle of a multi-byte character
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("stream ended inside a multi-byte character ({} dangling bytes)", .bytes.len())]
pub struct DecodeError {
    /// The incomplete sequence left at end of stream
    pub bytes: Vec<u8>,
}

/// Streaming UTF-8 decoder
///
/// Concatenating everything returned by [`Utf8ChunkDecoder::decode`] equals
/// decoding the concatenation of all chunks at once. Bytes that can never be
/// part of a valid character are replaced with U+FFFD; only an incomplete
/// sequence at end of stream is an error.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Start of a character awaiting its continuation bytes (at most 3)
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Create a new decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let input: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Incomplete character at the end: wait for more bytes
                            self.pending.extend_from_slice(tail);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Number of bytes held back for the next chunk
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Signal end of stream
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if an incomplete character is still buffered.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError {
                bytes: std::mem::take(&mut self.pending),
            })
        }
    }

    /// Drop any buffered bytes without reporting them
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
