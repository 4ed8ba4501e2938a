/*!
 * Cursor-split text buffer for merge surgery.
 *
 * Everything before the cursor is committed output; everything after it
 * is untouched source. Inserting at the cursor appends to the output,
 * deleting forward skips source, seeking forward copies source. The cursor
 * never moves backwards, so every operation costs only the span it touches.
 */

/// Text buffer with a single forward-moving cursor
#[derive(Debug, Clone)]
pub struct MergeBuffer {
    source: String,
    consumed: usize,
    output: String,
}

impl MergeBuffer {
    /// Wrap the full original text; the cursor starts at 0
    pub fn new(source: String) -> Self {
        let capacity = source.len() + source.len() / 8;
        Self {
            source,
            consumed: 0,
            output: String::with_capacity(capacity),
        }
    }

    /// Cursor position within the merged text
    pub fn cursor(&self) -> usize {
        self.output.len()
    }

    /// Source text after the cursor; offsets passed to
    /// [`MergeBuffer::delete_to`] and [`MergeBuffer::advance_to`] are
    /// relative to this slice.
    pub fn remaining(&self) -> &str {
        &self.source[self.consumed..]
    }

    /// Committed text before the cursor
    pub fn committed(&self) -> &str {
        &self.output
    }

    /// Insert text at the cursor; the cursor ends up after it
    pub fn insert_at_cursor(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Delete source text from the cursor up to `offset`
    pub fn delete_to(&mut self, offset: usize) {
        let end = self.clamp(offset);
        self.consumed = end;
    }

    /// Keep source text from the cursor up to `offset` and move past it
    pub fn advance_to(&mut self, offset: usize) {
        let end = self.clamp(offset);
        self.output.push_str(&self.source[self.consumed..end]);
        self.consumed = end;
    }

    fn clamp(&self, offset: usize) -> usize {
        (self.consumed + offset).min(self.source.len())
    }

    /// Merged text: committed output followed by the untouched rest
    pub fn into_string(mut self) -> String {
        self.output.push_str(&self.source[self.consumed..]);
        self.output
    }
}
