//! Offset Controller
//!
//! Owns the non-negative window offset. Step operations report whether the
//! value changed; callers only issue a new window request when it did.

use tracing::debug;

/// Window offset with clamping at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetController {
    offset: u64,
}

impl OffsetController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `offset := offset + step`. Returns true if the offset changed.
    pub fn step_forward(&mut self, step: u64) -> bool {
        let next = self.offset.saturating_add(step);
        self.apply(next)
    }

    /// `offset := max(offset - step, 0)`. Returns true if the offset changed.
    pub fn step_back(&mut self, step: u64) -> bool {
        let next = self.offset.saturating_sub(step);
        self.apply(next)
    }

    /// Back to zero. Returns true if the offset changed.
    pub fn reset(&mut self) -> bool {
        self.apply(0)
    }

    fn apply(&mut self, next: u64) -> bool {
        if next == self.offset {
            return false;
        }
        debug!(from = self.offset, to = next, "Offset changed");
        self.offset = next;
        true
    }
}
