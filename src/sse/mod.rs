//! Answer-stream protocol parsing.
//!
//! The answer endpoint streams frames separated by a blank line. Each
//! frame carries an `event:` line and a `data:` JSON payload describing one
//! of the answer event types (text increment, sources, translated query,
//! related queries).
//!
//! # Module structure
//! - `decoder` - incremental UTF-8 decoding of byte chunks
//! - `frames` - `"\n\n"` frame splitting and `event:`/`data:` decoding
//! - `events` - typed [`AnswerEvent`] payloads
//!
//! Everything here is pure: no network access, no session state. The
//! session engine owns the read loop and feeds these pieces.

mod decoder;
mod events;
mod frames;

pub use decoder::StreamDecoder;
pub use events::{parse_answer_event, AnswerEvent};
pub use frames::{decode_frame, FrameBuffer, RawFrame};

#[cfg(test)]
mod tests {
    use super::*;

    // End-to-end: bytes in, typed events out, chunk boundaries everywhere.
    #[test]
    fn test_chunked_bytes_to_events() {
        let stream = concat!(
            "event: message\n",
            "data: {\"type\":\"text\",\"message\":\"Hél\"}\n",
            "\n",
            "event: message\n",
            "data: {\"type\":\"text\",\"message\":\"lo\"}\n",
            "\n",
        )
        .as_bytes();

        let mut decoder = StreamDecoder::new();
        let mut buffer = FrameBuffer::new();
        let mut text = String::new();

        // Feed in 3-byte chunks so both the multi-byte character and the
        // frame delimiter get split.
        for chunk in stream.chunks(3) {
            buffer.push(&decoder.decode(chunk));
            while let Some(frame) = buffer.next_frame() {
                let raw = decode_frame(&frame);
                if let Some(AnswerEvent::Text { message, .. }) =
                    parse_answer_event(&raw).unwrap()
                {
                    text.push_str(&message);
                }
            }
        }

        assert_eq!(text, "Héllo");
        assert!(buffer.is_empty());
    }
}
