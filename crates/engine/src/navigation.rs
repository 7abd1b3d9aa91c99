//! Keyboard-driven selection state.
//!
//! The selection is an anchor/head pair of addresses. Navigation keys move
//! the head (clamped to the data extent); with the extend modifier the
//! anchor stays put and the selection grows, otherwise both collapse onto
//! the new address.

use crate::address::Address;
use crate::range::Range;

/// Navigation keys the grid responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Tab,
}

impl NavKey {
    /// Map a DOM-style key name; anything unrecognized is not a navigation
    /// key and leaves the selection unchanged.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(NavKey::ArrowUp),
            "ArrowDown" => Some(NavKey::ArrowDown),
            "ArrowLeft" => Some(NavKey::ArrowLeft),
            "ArrowRight" => Some(NavKey::ArrowRight),
            "Enter" => Some(NavKey::Enter),
            "Tab" => Some(NavKey::Tab),
            _ => None,
        }
    }
}

/// The current selection: anchor and head, either order.
///
/// Persisted as its text pair (see [`Selection::to_pair`]), not as raw
/// indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Address,
    pub head: Address,
}

impl Selection {
    pub fn single(addr: Address) -> Self {
        Self { anchor: addr, head: addr }
    }

    /// Restore a selection from its persisted text pair.
    pub fn from_pair(start: &str, end: &str) -> Self {
        Self {
            anchor: Address::parse_lenient(start),
            head: Address::parse_lenient(end),
        }
    }

    /// Selection text pair, `[anchor, head]`.
    pub fn to_pair(&self) -> [String; 2] {
        [self.anchor.to_a1(), self.head.to_a1()]
    }

    pub fn is_single_cell(&self) -> bool {
        self.anchor == self.head
    }

    /// The normalized rectangle this selection covers.
    pub fn range(&self) -> Range {
        Range::normalize(self.anchor, self.head)
    }

    /// Apply a navigation key against a grid of `max_row`/`max_col` maximum
    /// indices. `extend` keeps the anchor fixed and moves only the head.
    pub fn apply(&self, key: NavKey, extend: bool, max_row: usize, max_col: usize) -> Selection {
        let head = self.head;
        let next = match key {
            NavKey::ArrowUp => Address::new(head.col, head.row.saturating_sub(1)),
            NavKey::ArrowDown => Address::new(head.col, (head.row + 1).min(max_row)),
            NavKey::ArrowLeft => Address::new(head.col.saturating_sub(1), head.row),
            NavKey::ArrowRight => Address::new((head.col + 1).min(max_col), head.row),
            NavKey::Enter => Address::new(head.col, (head.row + 1).min(max_row)),
            NavKey::Tab => {
                if head.col >= max_col {
                    // wrap to column 0 of the next row, clamped at the bottom
                    Address::new(0, (head.row + 1).min(max_row))
                } else {
                    Address::new(head.col + 1, head.row)
                }
            }
        };

        if extend {
            Selection { anchor: self.anchor, head: next }
        } else {
            Selection::single(next)
        }
    }
}
