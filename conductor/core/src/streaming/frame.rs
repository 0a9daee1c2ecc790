//! Line Framing
//!
//! Splits decoded text into newline-delimited frames. The trailing partial
//! line of each chunk is carried over and completed by the next one, so a
//! frame is never handed out before its terminating `\n` has arrived.
//!
//! # Frame Format
//!
//! ```text
//! data: {"text": "Hel"}\n
//! data: {"text": "lo"}\n
//! \n                          <- empty frame, ignored by the parser
//! data: {"done": true}\n
//! ```

/// Frame delimiter
pub const FRAME_DELIMITER: char = '\n';

/// Carry-over line splitter
#[derive(Debug, Default)]
pub struct FrameSplitter {
    /// Partial line awaiting its delimiter
    carry: String,
}

impl FrameSplitter {
    /// Create a new splitter with an empty carry-over
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk, returning every frame it completes
    ///
    /// Frames do not include the delimiter. Empty frames are returned as-is.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        // Only the new text can hold a delimiter; the carry never does
        let Some(last_delimiter) = text.rfind(FRAME_DELIMITER) else {
            self.carry.push_str(text);
            return Vec::new();
        };

        let carried = self.carry.len();
        self.carry.push_str(text);

        let rest = self.carry.split_off(carried + last_delimiter + 1);
        let mut complete = std::mem::replace(&mut self.carry, rest);
        complete.pop();

        complete.split(FRAME_DELIMITER).map(str::to_owned).collect()
    }

    /// The partial line currently carried over
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.carry
    }

    /// Signal a clean end of stream, flushing a non-empty carry-over
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.carry))
        }
    }

    /// Drop the carry-over without flushing it (abandoned stream)
    pub fn discard(&mut self) {
        self.carry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_complete_lines() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.push("data: a\ndata: b\n");
        assert_eq!(frames, vec!["data: a", "data: b"]);
        assert_eq!(splitter.pending(), "");
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_partial_line_carried_over() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push("data: {\"te").is_empty());
        assert_eq!(splitter.pending(), "data: {\"te");

        let frames = splitter.push("xt\": \"Hel\"}\ndata: {");
        assert_eq!(frames, vec!["data: {\"text\": \"Hel\"}"]);
        assert_eq!(splitter.pending(), "data: {");
    }

    #[test]
    fn test_blank_lines_become_empty_frames() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.push("data: a\n\ndata: b\n\n");
        assert_eq!(frames, vec!["data: a", "", "data: b", ""]);
    }

    #[test]
    fn test_delimiter_alone() {
        let mut splitter = FrameSplitter::new();
        splitter.push("data: x");
        let frames = splitter.push("\n");
        assert_eq!(frames, vec!["data: x"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut splitter = FrameSplitter::new();
        splitter.push("data: a\ndata: {\"done\": true}");
        assert_eq!(
            splitter.finish(),
            Some("data: {\"done\": true}".to_string())
        );
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_discard_drops_partial_frame() {
        let mut splitter = FrameSplitter::new();
        splitter.push("data: {\"text\": \"lost");
        splitter.discard();
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_long_line_in_single_bytes() {
        let payload = "x".repeat(200_000);
        let line = format!("data: {{\"text\": \"{payload}\"}}\n");

        let mut splitter = FrameSplitter::new();
        let mut frames = Vec::new();
        for (i, _) in line.char_indices() {
            frames.extend(splitter.push(&line[i..=i]));
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), line.len() - 1);
        assert_eq!(splitter.pending(), "");
    }

    #[test]
    fn test_delimiter_after_long_carry() {
        let mut splitter = FrameSplitter::new();
        splitter.push("data: a");
        splitter.push("bc");
        let frames = splitter.push("d\ndata: e\ndata");
        assert_eq!(frames, vec!["data: abcd", "data: e"]);
        assert_eq!(splitter.pending(), "data");
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push("").is_empty());
        assert_eq!(splitter.pending(), "");
    }
}
