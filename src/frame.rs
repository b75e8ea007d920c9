use crate::types::{Pt, Rect};

/// The writable content region of one page. The cursor counts down from the
/// top edge, so `cursor_y` is how much of the frame has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    rect: Rect,
    cursor_y: Pt,
}

impl Frame {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            cursor_y: Pt::ZERO,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn remaining_height(&self) -> Pt {
        (self.rect.height - self.cursor_y).max(Pt::ZERO)
    }

    pub fn fits(&self, height: Pt) -> bool {
        height <= self.remaining_height()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_y <= Pt::ZERO
    }

    /// Page-space y of the next writable line.
    pub fn top_y(&self) -> Pt {
        self.rect.top() - self.cursor_y
    }

    pub fn advance(&mut self, height: Pt) {
        self.cursor_y = (self.cursor_y + height).min(self.rect.height);
    }
}
