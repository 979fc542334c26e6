use crate::error::{AsdcpError, Result};

/// Backing memory of a [`FrameBuffer`].
#[derive(Debug)]
pub enum FrameStorage<'a> {
    /// Allocated and grown by the library.
    Owned(Vec<u8>),
    /// Supplied by the caller; never reallocated.
    Borrowed(&'a mut [u8]),
}

/// One essence frame's bytes plus the bookkeeping that travels with them.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    storage: FrameStorage<'a>,
    size: usize,
    frame_number: u32,
    source_length: u32,
    plaintext_offset: u32,
}

impl FrameBuffer<'static> {
    pub fn with_capacity(capacity: usize) -> Self {
        FrameBuffer {
            storage: FrameStorage::Owned(vec![0u8; capacity]),
            size: 0,
            frame_number: 0,
            source_length: 0,
            plaintext_offset: 0,
        }
    }

    /// Wrap existing frame data; the size is the vector's length.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let size = data.len();
        FrameBuffer {
            storage: FrameStorage::Owned(data),
            size,
            frame_number: 0,
            source_length: 0,
            plaintext_offset: 0,
        }
    }
}

impl Default for FrameBuffer<'static> {
    fn default() -> Self {
        FrameBuffer::with_capacity(0)
    }
}

impl<'a> FrameBuffer<'a> {
    pub fn borrowed(buf: &'a mut [u8]) -> Self {
        FrameBuffer {
            storage: FrameStorage::Borrowed(buf),
            size: 0,
            frame_number: 0,
            source_length: 0,
            plaintext_offset: 0,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, FrameStorage::Owned(_))
    }

    pub fn capacity(&self) -> usize {
        match &self.storage {
            FrameStorage::Owned(v) => v.len(),
            FrameStorage::Borrowed(b) => b.len(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn set_size(&mut self, size: usize) -> Result<()> {
        if size > self.capacity() {
            return Err(AsdcpError::SmallBuffer {
                capacity: self.capacity(),
                needed: size,
            });
        }
        self.size = size;
        Ok(())
    }

    /// Make room for `needed` bytes: owned storage grows, borrowed storage must already fit.
    pub fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        match &mut self.storage {
            FrameStorage::Owned(v) => {
                if v.len() < needed {
                    v.resize(needed, 0);
                }
                Ok(())
            }
            FrameStorage::Borrowed(b) if b.len() >= needed => Ok(()),
            FrameStorage::Borrowed(b) => Err(AsdcpError::SmallBuffer {
                capacity: b.len(),
                needed,
            }),
        }
    }

    /// The valid bytes of the frame.
    pub fn data(&self) -> &[u8] {
        match &self.storage {
            FrameStorage::Owned(v) => &v[..self.size],
            FrameStorage::Borrowed(b) => &b[..self.size],
        }
    }

    /// The whole backing buffer, for filling.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            FrameStorage::Owned(v) => v.as_mut_slice(),
            FrameStorage::Borrowed(b) => b,
        }
    }

    /// Replace the contents with `bytes`.
    pub fn fill(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.buffer_mut()[..bytes.len()].copy_from_slice(bytes);
        self.size = bytes.len();
        Ok(())
    }

    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn set_frame_number(&mut self, n: u32) {
        self.frame_number = n;
    }

    /// Plaintext length of an encrypted frame that was returned undecrypted.
    pub fn source_length(&self) -> u32 {
        self.source_length
    }

    pub fn set_source_length(&mut self, n: u32) {
        self.source_length = n;
    }

    /// Leading bytes of the frame left unencrypted.
    pub fn plaintext_offset(&self) -> u32 {
        self.plaintext_offset
    }

    pub fn set_plaintext_offset(&mut self, n: u32) {
        self.plaintext_offset = n;
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            FrameStorage::Owned(mut v) => {
                v.truncate(self.size);
                v
            }
            FrameStorage::Borrowed(b) => b[..self.size].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_owned_grows() {
        let mut fb = FrameBuffer::with_capacity(4);
        fb.fill(b"longer than four").unwrap();
        assert_eq!(fb.data(), b"longer than four");
        assert!(fb.is_owned());
    }

    #[test]
    fn test_borrowed_does_not_grow() {
        let mut backing = [0u8; 4];
        let mut fb = FrameBuffer::borrowed(&mut backing);
        let err = fb.fill(b"too long").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alloc);
        fb.fill(b"ok").unwrap();
        assert_eq!(fb.size(), 2);
        drop(fb);
        assert_eq!(&backing[..2], b"ok");
    }

    #[test]
    fn test_set_size_bounds() {
        let mut fb = FrameBuffer::with_capacity(8);
        assert!(fb.set_size(8).is_ok());
        assert_eq!(fb.set_size(9).unwrap_err().kind(), ErrorKind::Alloc);
    }
}
