//! Newline framing over a chunked byte stream.
//!
//! Bytes are decoded with a stateful UTF-8 decoder so a character split
//! across two chunks is reassembled before it reaches the text buffer.
//! Complete lines are handed out as soon as their `\n` arrives; text after
//! the last newline stays buffered until more bytes come in.

/// Stateful decoder and line splitter owned by exactly one stream.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Decoded text not yet split into lines.
    buffer: String,
    /// Bytes of `buffer` already scanned without finding a newline.
    cursor: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence (at most 3).
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Returned lines have the trailing `\n` (and a preceding `\r`) removed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[self.cursor..].find('\n') {
            let newline = self.cursor + offset;
            let mut line: String = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
            self.cursor = 0;
        }
        self.cursor = self.buffer.len();
        lines
    }

    /// End of input. Returns the unterminated remainder, if any; it is never
    /// a record.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
        self.cursor = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Bytes of decoded text waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn scan_cursor(&self) -> usize {
        self.cursor
    }

    fn decode(&mut self, chunk: &[u8]) {
        let joined;
        let mut input = if self.pending.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.pending);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined[..]
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }
}
