//! Incremental UTF-8 decoding of streamed byte chunks.
//!
//! The answer endpoint streams UTF-8 text, but chunk boundaries fall
//! wherever the network puts them, including inside a multi-byte character.
//! [`StreamDecoder`] carries the incomplete tail of one chunk over to the
//! next so a boundary split never surfaces as a decode failure.

/// Stateful chunk decoder.
///
/// Feed raw chunks with [`decode`](StreamDecoder::decode); each call
/// returns the longest decodable prefix and buffers any trailing partial
/// character. Interior invalid sequences are replaced with U+FFFD rather
/// than failing the stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Trailing bytes of an incomplete multi-byte sequence.
    pending: Vec<u8>,
}

impl StreamDecoder {
    /// Create a new decoder with no carried-over bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, prepending any bytes carried over from the previous
    /// call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);
        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Invalid sequence in the middle of the chunk.
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        // Incomplete sequence at the end: hold it for the
                        // next chunk.
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush the decoder at end of stream.
    ///
    /// A sequence still pending when the stream closes can never complete,
    /// so it decodes to a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}
