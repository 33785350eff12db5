//! Incremental SSE frame decoder
//!
//! Turns the raw byte reads of a response body into [`Chunk`]s. Frames are
//! separated by a blank line and carry a `data: ` prefix followed by JSON.

use tracing::{debug, warn};

use crate::chunk::Chunk;
use crate::error::StreamError;

const FRAME_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of a multi-byte character split across reads
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a blank line
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return the chunks of every frame it completed, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Chunk> {
        self.decode(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.find(FRAME_SEPARATOR) {
            let frame: String = self.buffer.drain(..pos + FRAME_SEPARATOR.len()).collect();
            match parse_frame(&frame[..pos]) {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Dropping malformed stream frame"),
            }
        }
        chunks
    }

    /// Text buffered while waiting for a frame terminator.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// End of stream. Anything still buffered was never terminated and is discarded.
    pub fn finish(self) {
        if !self.buffer.trim().is_empty() || !self.pending.is_empty() {
            debug!(
                buffered_len = self.buffer.len(),
                pending_bytes = self.pending.len(),
                "Discarding unterminated frame at end of stream"
            );
        }
    }

    fn decode(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for the next read.
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Parse one frame. `Ok(None)` for blank frames and frames without the data prefix.
pub fn parse_frame(frame: &str) -> Result<Option<Chunk>, StreamError> {
    if frame.trim().is_empty() {
        return Ok(None);
    }
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    serde_json::from_str(payload)
        .map(Some)
        .map_err(|e| StreamError::Parse(format!("{}: {}", e, truncate(payload, 120))))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkKind;

    #[test]
    fn test_single_frame() {
        let mut decoder = FrameDecoder::new();
        let chunks = decoder.push(b"data: {\"type\":\"content\",\"data\":\"Hel\"}\n\n");
        assert_eq!(chunks, vec![Chunk::content("Hel")]);
        assert!(decoder.buffered().is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_read_keep_order() {
        let mut decoder = FrameDecoder::new();
        let input = format!(
            "{}{}{}",
            Chunk::content("a").to_frame(),
            Chunk::thinking("b").to_frame(),
            Chunk::content("c").to_frame()
        );
        let chunks = decoder.push(input.as_bytes());
        assert_eq!(
            chunks,
            vec![Chunk::content("a"), Chunk::thinking("b"), Chunk::content("c")]
        );
    }

    #[test]
    fn test_partial_frame_is_retained_until_terminated() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"con").is_empty());
        assert_eq!(decoder.buffered(), "data: {\"type\":\"con");
        assert!(decoder.push(b"tent\",\"data\":\"lo\"}\n").is_empty());
        let chunks = decoder.push(b"\n");
        assert_eq!(chunks, vec![Chunk::content("lo")]);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let frame = Chunk::content("héllo ✓").to_frame();
        let bytes = frame.as_bytes();
        let check = frame.find('✓').unwrap();

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&bytes[..check + 1]).is_empty());
        assert!(decoder.push(&bytes[check + 1..check + 2]).is_empty());
        let chunks = decoder.push(&bytes[check + 2..]);
        assert_eq!(chunks, vec![Chunk::content("héllo ✓")]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let frame = Chunk::content("日本語").to_frame();
        let mut decoder = FrameDecoder::new();
        let mut chunks = Vec::new();
        for byte in frame.as_bytes() {
            chunks.extend(decoder.push(std::slice::from_ref(byte)));
        }
        assert_eq!(chunks, vec![Chunk::content("日本語")]);
    }

    #[test]
    fn test_skips_comments_and_blank_frames() {
        let mut decoder = FrameDecoder::new();
        let input = format!(": keep-alive\n\n\n\nevent: ping\n\n{}", Chunk::content("x").to_frame());
        let chunks = decoder.push(input.as_bytes());
        assert_eq!(chunks, vec![Chunk::content("x")]);
    }

    #[test]
    fn test_malformed_frame_does_not_stop_decoding() {
        let mut decoder = FrameDecoder::new();
        let input = format!("data: not-json\n\n{}", Chunk::content("ok").to_frame());
        let chunks = decoder.push(input.as_bytes());
        assert_eq!(chunks, vec![Chunk::content("ok")]);
    }

    #[test]
    fn test_parse_frame_reports_parse_error() {
        let err = parse_frame("data: {oops").unwrap_err();
        assert!(matches!(err, StreamError::Parse(_)));
        assert_eq!(parse_frame("id: 7").unwrap(), None);
        assert_eq!(parse_frame("   ").unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = FrameDecoder::new();
        let mut input = b"data: {\"type\":\"content\",\"data\":\"a".to_vec();
        input.push(0xff);
        input.extend_from_slice(b"b\"}\n\n");
        let chunks = decoder.push(&input);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Content);
        assert_eq!(chunks[0].data, "a\u{FFFD}b");
    }
}
