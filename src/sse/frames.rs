//! Frame splitting and decoding for the answer protocol.
//!
//! The answer endpoint streams an SSE-shaped body: frames separated by a
//! blank line (`"\n\n"`), each frame carrying an `event:` line and a
//! `data:` payload. [`FrameBuffer`] turns an arbitrarily-chunked text feed
//! into complete frames; [`decode_frame`] splits one frame into its event
//! type and raw payload.

/// One decoded frame: event type plus raw payload text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Event type from the `event:` line, empty if the frame had none.
    pub event: String,
    /// Payload from the `data:` line(s), prefix stripped.
    pub data: String,
}

/// Accumulates decoded stream text and yields `"\n\n"`-delimited frames.
///
/// Chunks are appended with [`push`](FrameBuffer::push); complete frames
/// are drained with [`next_frame`](FrameBuffer::next_frame), which may
/// yield zero, one or many frames per chunk. Text after the last delimiter
/// stays buffered until more input arrives, so a delimiter split across two
/// chunks is detected once the second chunk lands.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: String,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded stream text.
    pub fn push(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Remove and return the next complete frame, delimiter consumed.
    ///
    /// Returns `None` when no full delimiter is buffered yet. Call
    /// repeatedly after each `push` to drain everything that is ready.
    pub fn next_frame(&mut self) -> Option<String> {
        let pos = self.buf.find("\n\n")?;
        let frame = self.buf[..pos].to_string();
        self.buf.drain(..pos + 2);
        Some(frame)
    }

    /// True when no undelivered text remains.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Decode one frame into its event type and payload.
///
/// An `event:` line sets the event type. The first `data:` line begins the
/// payload; every following line is appended to it verbatim, joined with
/// `\n`, so multi-line payloads survive intact.
pub fn decode_frame(frame: &str) -> RawFrame {
    let mut event = String::new();
    let mut data: Option<String> = None;

    for line in frame.lines() {
        if let Some(payload) = data.as_mut() {
            payload.push('\n');
            payload.push_str(line);
        } else if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim_start().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }

    RawFrame {
        event,
        data: data.unwrap_or_default(),
    }
}
