use crate::DomError;

/// The data for a text or comment node: a single mutable string payload
/// with character-offset editing operations.
///
/// Offsets are in characters, not bytes; every operation clamps or rejects
/// offsets against the current character length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextNodeData {
    /// The textual content of the node
    pub content: String,
}

impl TextNodeData {
    pub fn new(content: String) -> Self {
        Self { content }
    }

    /// Character length of the payload
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn byte_offset(&self, char_offset: usize) -> Result<usize, DomError> {
        let len = self.len();
        if char_offset > len {
            return Err(DomError::IndexSize {
                index: char_offset,
                len,
            });
        }
        Ok(self
            .content
            .char_indices()
            .nth(char_offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.content.len()))
    }

    /// Split the payload at `offset`, truncating `self` to the prefix and
    /// returning the suffix.
    pub fn split_at(&mut self, offset: usize) -> Result<String, DomError> {
        let byte = self.byte_offset(offset)?;
        Ok(self.content.split_off(byte))
    }

    pub fn insert_data(&mut self, offset: usize, data: &str) -> Result<(), DomError> {
        let byte = self.byte_offset(offset)?;
        self.content.insert_str(byte, data);
        Ok(())
    }

    /// Delete `count` characters starting at `offset`. A negative count
    /// deletes through to the end of the data.
    pub fn delete_data(&mut self, offset: usize, count: isize) -> Result<(), DomError> {
        let start = self.byte_offset(offset)?;
        let end = if count < 0 {
            self.content.len()
        } else {
            // Clamp the deletion to the end of the data
            let end_chars = (offset + count as usize).min(self.len());
            self.byte_offset(end_chars)?
        };
        self.content.replace_range(start..end, "");
        Ok(())
    }

    pub fn replace_data(&mut self, offset: usize, count: isize, data: &str) -> Result<(), DomError> {
        self.delete_data(offset, count)?;
        self.insert_data(offset, data)
    }

    pub fn substring_data(&self, offset: usize, count: usize) -> Result<String, DomError> {
        if offset > self.len() {
            return Err(DomError::IndexSize {
                index: offset,
                len: self.len(),
            });
        }
        Ok(self.content.chars().skip(offset).take(count).collect())
    }

    pub fn append_data(&mut self, data: &str) {
        self.content.push_str(data);
    }
}
