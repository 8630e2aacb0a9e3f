//! Growable byte buffer that response bodies are assembled into.

use super::HttpError;

/// Accumulates body chunks in arrival order.
///
/// Growth is fallible: if the allocator refuses, or an optional byte limit
/// would be crossed, [`ResponseBuffer::append`] fails and the caller is
/// expected to abort the transfer instead of keeping a truncated body.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    limit: Option<usize>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Append one chunk; the buffer grows by exactly `chunk.len()` bytes.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), HttpError> {
        let buffered = self.bytes.len();
        let out_of_memory = || HttpError::OutOfMemory {
            requested: chunk.len(),
            buffered,
        };

        let new_len = buffered
            .checked_add(chunk.len())
            .ok_or_else(out_of_memory)?;
        if self.limit.is_some_and(|limit| new_len > limit) {
            return Err(out_of_memory());
        }

        self.bytes
            .try_reserve(chunk.len())
            .map_err(|_| out_of_memory())?;
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
