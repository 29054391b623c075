//! Byte-level plumbing for streamed responses.

mod chunks;
mod sse;

pub(crate) use chunks::{Chunks, Error as ChunksError};
pub(crate) use sse::Sse;
