/// Streaming UTF-8 decoder.
///
/// A multi-byte character split across two chunks is held back until the
/// rest of it arrives. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, carrying any incomplete trailing sequence over
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = &bytes[..];

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Truncated sequence at the end of the chunk
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush at end of stream. A sequence that never completed becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Splits decoded text on `\n`, keeping a trailing partial line for the next push
#[derive(Debug, Default)]
pub struct LineSplitter {
    partial: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every line completed by `text`
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.partial.push_str(text);

        let Some(last_newline) = self.partial.rfind('\n') else {
            return Vec::new();
        };

        let remainder = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, remainder);

        complete
            .strip_suffix('\n')
            .unwrap_or(&complete)
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// The unterminated last line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.partial))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character() {
        // "è" is 0xC3 0xA8
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'P', b'e', 0xC3]), "Pe");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&[0xA8, b'!']), "è!");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_character_one_byte_at_a_time() {
        let emoji = "🎤".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in emoji {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(out, "🎤");
    }

    #[test]
    fn test_invalid_byte_is_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_sequence_at_end_of_stream() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_lines_split_across_pushes() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push("data: {\"resp").is_empty());
        assert_eq!(
            splitter.push("onse\":\"a\"}\n\ndata: x"),
            vec!["data: {\"response\":\"a\"}".to_string(), String::new()]
        );
        assert_eq!(splitter.finish(), Some("data: x".to_string()));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_line_ending_exactly_at_chunk_end() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push("one\n"), vec!["one".to_string()]);
        assert_eq!(splitter.finish(), None);
    }
}
