//! # Serial Line Framer
//!
//! Splits the raw serial byte stream into newline-delimited records.
//!
//! The framer retains the unterminated trailing fragment across calls, so
//! the lines it emits are independent of how the transport chunked the
//! bytes. It never drops a byte and never emits a line it knows to be
//! incomplete.

use bytes::BytesMut;

/// Incremental newline framer for the serial sensor feed
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes and collect all complete lines
    ///
    /// Returns every line terminated inside the buffered stream so far, in
    /// arrival order, with the trailing `\r` of CRLF endings removed. The
    /// final unterminated segment stays buffered for the next call.
    ///
    /// # Arguments
    ///
    /// * `chunk` - Raw bytes as received from the transport
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            let text = String::from_utf8_lossy(&line[..pos]);
            lines.push(text.trim_end_matches('\r').to_string());
        }

        lines
    }

    /// Number of buffered bytes awaiting a line terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Discard the buffered fragment
    ///
    /// Called on channel close. A partial record is never flushed as a fake
    /// final line; guessing at truncated JSON produces garbage samples.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"21.5,40,101,12.1\n");
        assert_eq!(lines, vec!["21.5,40,101,12.1"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"{\"temp\":2").is_empty());
        assert_eq!(framer.pending(), 9);

        let lines = framer.feed(b"1.5}\n");
        assert_eq!(lines, vec!["{\"temp\":21.5}"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"a\nb\nc\npartial");
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert_eq!(framer.pending(), 7);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"first\r\nsecond\r\n");
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_split_invariance() {
        // Any chunking of the same byte stream must produce the same lines
        let input = b"21.5,40,101,12.1\n{\"temp\":22}\n\nlast line\n";

        let mut whole = LineFramer::new();
        let expected = whole.feed(input);

        for chunk_size in 1..input.len() {
            let mut framer = LineFramer::new();
            let mut lines = Vec::new();
            for chunk in input.chunks(chunk_size) {
                lines.extend(framer.feed(chunk));
            }
            assert_eq!(lines, expected, "chunk size {} diverged", chunk_size);
            assert_eq!(framer.pending(), 0);
        }
    }

    #[test]
    fn test_empty_chunk_is_harmless() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"").is_empty());
        framer.feed(b"abc");
        assert!(framer.feed(b"").is_empty());
        assert_eq!(framer.pending(), 3);
    }

    #[test]
    fn test_reset_discards_fragment() {
        let mut framer = LineFramer::new();
        framer.feed(b"{\"temp\":21");
        framer.reset();
        assert_eq!(framer.pending(), 0);

        // The discarded fragment must not leak into the next connection
        let lines = framer.feed(b".5}\n");
        assert_eq!(lines, vec![".5}"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_dropped() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"ok\n\xFF\xFE\nalso ok\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[2], "also ok");
    }
}
