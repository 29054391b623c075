use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced; comments and the other fields
/// (`event`, `id`, `retry`) are skipped, matching what completion
/// endpoints actually send.
pub struct Sse {
    buf: String,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Deliver a buffered event first, if a complete one exists.
            if let Some(event) = self.take_event()? {
                return Ok(Some(event));
            }

            // Not enough buffered data for an event, read more.
            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Chunks)?
            else {
                return Ok(None);
            };
            let Ok(s) = str::from_utf8(&bytes) else {
                return Err(Error::InvalidPayload);
            };
            self.buf.push_str(s);
        }
    }

    /// Consumes one blank-line-terminated block from the buffer and
    /// extracts its data payload. Blocks without any `data` field
    /// (keep-alive comments, ignored fields) are silently skipped.
    fn take_event(&mut self) -> Result<Option<String>, Error> {
        while let Some(eob_idx) = self.buf.find("\n\n") {
            let mut data = String::new();
            let mut has_data = false;
            for line in self.buf[..eob_idx].lines() {
                if let Some(rest) = line.strip_prefix("data:") {
                    if has_data {
                        data.push('\n');
                    }
                    data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
                    has_data = true;
                    continue;
                }
                if line.is_empty() || line.starts_with(':') {
                    // Comment or padding.
                    continue;
                }
                if !line.contains(':') {
                    return Err(Error::InvalidPayload);
                }
                // A field we don't care about.
            }
            self.buf.drain(..eob_idx + 2);

            if has_data {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}
