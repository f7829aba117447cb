//! GPU buffer storage seam.

use anyhow::{bail, Result as AnyResult};

/// Opaque handle of a buffer created by a [`BufferStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(usize);

impl BufferHandle {
    /// Zero-based creation index of the buffer.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Destination of instance data, usually a set of GPU storage buffers.
pub trait BufferStore {
    /// Allocates an empty buffer identified by `label` in debug output.
    fn create_buffer(&mut self, label: &str) -> BufferHandle;

    /// Replaces the whole content of a buffer.
    fn store_data(&mut self, buffer: BufferHandle, bytes: &[u8]) -> AnyResult<()>;

    /// Overwrites `bytes.len()` bytes starting at `offset` without resizing.
    fn store_sub_data(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8])
        -> AnyResult<()>;
}

#[derive(Clone, Debug, Default)]
struct MemoryBuffer {
    label: String,
    bytes: Vec<u8>,
}

/// Buffer store keeping every buffer in host memory.
///
/// Used by headless adapters and tests; it also counts how many bytes were
/// written so incremental updates can be told apart from full uploads.
#[derive(Clone, Debug, Default)]
pub struct MemoryBufferStore {
    buffers: Vec<MemoryBuffer>,
    bytes_written: usize,
}

impl MemoryBufferStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of a buffer.
    #[must_use]
    pub fn bytes(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers
            .get(buffer.0)
            .map(|buffer| buffer.bytes.as_slice())
    }

    /// Debug label of a buffer.
    #[must_use]
    pub fn label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers
            .get(buffer.0)
            .map(|buffer| buffer.label.as_str())
    }

    /// Number of buffers created so far.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total bytes written since creation.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> AnyResult<&mut MemoryBuffer> {
        match self.buffers.get_mut(buffer.0) {
            Some(buffer) => Ok(buffer),
            None => bail!("buffer {} was never created", buffer.0),
        }
    }
}

impl BufferStore for MemoryBufferStore {
    fn create_buffer(&mut self, label: &str) -> BufferHandle {
        self.buffers.push(MemoryBuffer {
            label: label.to_owned(),
            bytes: Vec::new(),
        });
        BufferHandle(self.buffers.len() - 1)
    }

    fn store_data(&mut self, buffer: BufferHandle, bytes: &[u8]) -> AnyResult<()> {
        let target = self.buffer_mut(buffer)?;
        target.bytes.clear();
        target.bytes.extend_from_slice(bytes);
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn store_sub_data(
        &mut self,
        buffer: BufferHandle,
        offset: usize,
        bytes: &[u8],
    ) -> AnyResult<()> {
        let target = self.buffer_mut(buffer)?;
        let end = offset + bytes.len();
        if end > target.bytes.len() {
            bail!(
                "write of {} bytes at {offset} overflows buffer `{}` holding {} bytes",
                bytes.len(),
                target.label,
                target.bytes.len()
            );
        }
        target.bytes[offset..end].copy_from_slice(bytes);
        self.bytes_written += bytes.len();
        Ok(())
    }
}
