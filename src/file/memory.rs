use super::Backend;
use crate::Result;

/// Owned in-memory byte source.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let available = self.data.len().saturating_sub(offset);
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(truncated_error!(offset, len, available));
        };

        if offset_end > self.data.len() {
            return Err(truncated_error!(offset, len, available));
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
