use serde::{Deserialize, Serialize};

/// Half-open byte range into the original template text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub offset: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Empty span at a position.
    pub fn at(offset: usize) -> Self {
        Self { offset, length: 0 }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn merge(self, other: TextSpan) -> TextSpan {
        let offset = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        TextSpan::new(offset, end - offset)
    }
}
