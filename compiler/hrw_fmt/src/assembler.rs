//! Append-only text builder.

use std::fmt;

/// Spaces emitted per indentation level.
pub const INDENT_WIDTH: usize = 4;

/// Append-only accumulator for generated text.
///
/// Appends are amortized O(1) per byte: the buffer doubles when full and is
/// never re-copied per append. `build` copies the current contents out and
/// leaves the assembler untouched, so it can be called repeatedly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OutputAssembler {
    buffer: String,
}

impl OutputAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Append a text fragment.
    #[inline]
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    /// Append `text` followed by a newline.
    #[inline]
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    /// Append `text` on its own line, indented by `level` steps.
    pub fn append_indented(&mut self, text: &str, level: usize) -> &mut Self {
        self.buffer.extend(std::iter::repeat(' ').take(level * INDENT_WIDTH));
        self.append_line(text)
    }

    /// Append `items` separated by `separator`.
    pub fn join<I>(&mut self, items: I, separator: &str) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut first = true;
        for item in items {
            if !first {
                self.buffer.push_str(separator);
            }
            first = false;
            self.buffer.push_str(item.as_ref());
        }
        self
    }

    /// Copy out the accumulated text. Non-destructive.
    pub fn build(&self) -> String {
        self.buffer.clone()
    }

    /// Consume the assembler and return its buffer without copying.
    pub fn into_string(self) -> String {
        self.buffer
    }

    /// Borrow the accumulated text.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Discard all content. The allocation is kept for reuse.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Bytes accumulated so far.
    #[inline]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl fmt::Write for OutputAssembler {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for OutputAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputAssembler")
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests;
