//! Line framing for server-sent event bodies.

use memchr::memchr;

use crate::core::constants::DONE_SENTINEL;

/// Accumulates body bytes and hands back complete, trimmed, non-empty lines.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_lines(false)
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        self.drain_lines(true)
    }

    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn drain_lines(&mut self, flush: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut search_index = 0;

        while let Some(relative_pos) = memchr(b'\n', &self.buffer[search_index..]) {
            let newline_index = search_index + relative_pos;
            push_line(&mut lines, &self.buffer[search_index..newline_index]);
            search_index = newline_index + 1;
        }

        if flush {
            push_line(&mut lines, &self.buffer[search_index..]);
            self.buffer.clear();
        } else if search_index > 0 {
            self.buffer.drain(..search_index);
        }

        lines
    }
}

fn push_line(lines: &mut Vec<String>, bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        Err(err) => tracing::debug!(error = %err, "Skipping SSE line with invalid UTF-8"),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// `data: [DONE]`
    Done,
    /// Any other `data:` payload.
    Data(&'a str),
    /// Comments, `event:`/`id:` fields and anything else.
    Ignored,
}

pub fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

pub fn classify_line(line: &str) -> SseLine<'_> {
    match extract_data_payload(line) {
        Some(DONE_SENTINEL) => SseLine::Done,
        Some(payload) => SseLine::Data(payload),
        None => SseLine::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks_are_reassembled() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: {\"a\":").is_empty());
        assert!(buffer.has_remaining());
        assert_eq!(buffer.push(b" 1}\r\n\r\ndata: x\n"), vec!["data: {\"a\": 1}", "data: x"]);
        assert!(!buffer.has_remaining());
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(b"data: [DONE]").is_empty());
        assert_eq!(buffer.finish(), vec!["data: [DONE]"]);
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn invalid_utf8_lines_are_dropped() {
        let mut buffer = SseLineBuffer::default();
        let lines = buffer.push(b"data: \xff\xfe\ndata: ok\n");
        assert_eq!(lines, vec!["data: ok"]);
    }

    #[test]
    fn classify_handles_spacing_variants() {
        assert_eq!(classify_line("data: [DONE]"), SseLine::Done);
        assert_eq!(classify_line("data:[DONE]"), SseLine::Done);
        assert_eq!(classify_line("data: {\"x\":1}"), SseLine::Data("{\"x\":1}"));
        assert_eq!(classify_line("data:{\"x\":1}"), SseLine::Data("{\"x\":1}"));
        assert_eq!(classify_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(classify_line("event: message"), SseLine::Ignored);
    }
}
