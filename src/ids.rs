/*!
 * Identifier allocation shared by all physical streams of one document.
 *
 * A logical document may be read from several physical streams (for
 * example a content stream and a styles stream). Inline-markup ids and
 * structural positions must stay unique across all of them, so callers
 * capture the allocator state after one stream and restore it before the
 * next, or simply keep using the same instance.
 */

use serde::{Deserialize, Serialize};

// @struct: Captured allocator counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllocatorState {
    /// Last inline-markup id handed out (0 when none)
    pub last_markup_id: u64,

    /// Current structural position
    pub structural_position: u64,
}

/// Issues inline-markup ids and tracks the structural cursor.
///
/// Not thread-safe by itself; one allocator belongs to one conversion job.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last_markup_id: u64,
    structural_position: u64,
}

impl IdAllocator {
    /// Create an allocator whose first inline-markup id is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from previously captured counters
    pub fn from_state(state: AllocatorState) -> Self {
        Self {
            last_markup_id: state.last_markup_id,
            structural_position: state.structural_position,
        }
    }

    // @returns: Next inline-markup id, monotonic from 1
    pub fn next_inline_markup_id(&mut self) -> u64 {
        self.last_markup_id += 1;
        self.last_markup_id
    }

    // @returns: Current structural position without moving it
    pub fn current_structural_position(&self) -> u64 {
        self.structural_position
    }

    // @returns: Structural position after moving one step
    pub fn advance_structural_position(&mut self) -> u64 {
        self.structural_position += 1;
        self.structural_position
    }

    /// Last inline-markup id handed out
    pub fn last_markup_id(&self) -> u64 {
        self.last_markup_id
    }

    /// Overwrite the markup counter; the next id will be `last + 1`
    pub fn set_last_markup_id(&mut self, last: u64) {
        self.last_markup_id = last;
    }

    /// Overwrite the structural cursor
    pub fn set_structural_position(&mut self, position: u64) {
        self.structural_position = position;
    }

    /// Capture both counters so a later stream can continue numbering
    pub fn suspend(&self) -> AllocatorState {
        AllocatorState {
            last_markup_id: self.last_markup_id,
            structural_position: self.structural_position,
        }
    }

    /// Restore counters captured with [`IdAllocator::suspend`]
    pub fn resume(&mut self, state: AllocatorState) {
        self.last_markup_id = state.last_markup_id;
        self.structural_position = state.structural_position;
    }
}
