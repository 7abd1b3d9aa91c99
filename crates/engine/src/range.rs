//! Rectangular ranges and the clipboard operations defined over them.
//!
//! Grid data here is the row-major projection of a sheet
//! (`Vec<Arc<Vec<CellValue>>>`). Clear and paste return new row vectors that
//! share every untouched row with the input, copy-on-write at row
//! granularity.

use std::sync::Arc;

use crate::address::Address;
use crate::cell::CellValue;

/// A shared grid row.
pub type GridRow = Arc<Vec<CellValue>>;
/// Row-major grid data.
pub type GridData = Vec<GridRow>;

/// A rectangular range of cells, inclusive on both ends and always
/// normalized: `top_left <= bottom_right` component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub top_left: Address,
    pub bottom_right: Address,
}

impl Range {
    /// Build a normalized range from any pair of corners.
    pub fn normalize(a: Address, b: Address) -> Self {
        Self {
            top_left: Address::new(a.col.min(b.col), a.row.min(b.row)),
            bottom_right: Address::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    /// Single-cell range.
    pub fn single(addr: Address) -> Self {
        Self { top_left: addr, bottom_right: addr }
    }

    /// Parse a selection text pair, lenient like the address codec.
    pub fn from_selection(start: &str, end: &str) -> Self {
        Self::normalize(Address::parse_lenient(start), Address::parse_lenient(end))
    }

    pub fn height(&self) -> usize {
        self.bottom_right.row - self.top_left.row + 1
    }

    pub fn width(&self) -> usize {
        self.bottom_right.col - self.top_left.col + 1
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr.row >= self.top_left.row
            && addr.row <= self.bottom_right.row
            && addr.col >= self.top_left.col
            && addr.col <= self.bottom_right.col
    }

    pub fn is_single(&self) -> bool {
        self.top_left == self.bottom_right
    }

    /// Iterate all addresses in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Address> {
        let (tl, br) = (self.top_left, self.bottom_right);
        (tl.row..=br.row).flat_map(move |r| (tl.col..=br.col).map(move |c| Address::new(c, r)))
    }
}

/// Empty every cell inside the range. Rows outside it are shared with the
/// input; rows without cells in range (past the data) are left as they are.
pub fn clear(data: &GridData, range: &Range) -> GridData {
    let mut out = data.clone();
    if out.is_empty() {
        return out;
    }
    let last_row = range.bottom_right.row.min(out.len() - 1);

    for r in range.top_left.row..=last_row {
        let mut row = (*out[r]).clone();
        for c in range.top_left.col..=range.bottom_right.col {
            if c < row.len() {
                row[c] = CellValue::Empty;
            }
        }
        out[r] = Arc::new(row);
    }
    out
}

/// A captured rectangle of cell values, the source for tiling paste.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    values: Vec<Vec<CellValue>>,
}

impl Clipboard {
    /// Snapshot a range out of grid data. Missing source cells read as empty.
    pub fn capture(data: &GridData, range: &Range) -> Self {
        let values = (range.top_left.row..=range.bottom_right.row)
            .map(|r| {
                (range.top_left.col..=range.bottom_right.col)
                    .map(|c| {
                        data.get(r)
                            .and_then(|row| row.get(c))
                            .cloned()
                            .unwrap_or(CellValue::Empty)
                    })
                    .collect()
            })
            .collect();
        Self { values }
    }

    pub fn from_values(values: Vec<Vec<CellValue>>) -> Self {
        Self { values }
    }

    pub fn height(&self) -> usize {
        self.values.len()
    }

    pub fn width(&self) -> usize {
        self.values.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Source value for a target cell at rectangle-relative offset
    /// `(dr, dc)`: the clipboard tiles modulo its own dimensions.
    fn value_at(&self, dr: usize, dc: usize) -> CellValue {
        if self.values.is_empty() || self.width() == 0 {
            return CellValue::Empty;
        }
        let row = &self.values[dr % self.height()];
        row.get(dc % self.width()).cloned().unwrap_or(CellValue::Empty)
    }
}

/// Paste the clipboard over the target range.
///
/// A target larger than the clipboard repeats the source pattern; a smaller
/// target reads only the subset it needs. Rows beyond the grid's extent are
/// created; target cells beyond a row's width extend that row.
pub fn paste(data: &GridData, clipboard: &Clipboard, target: &Range) -> GridData {
    let mut out = data.clone();

    for (dr, r) in (target.top_left.row..=target.bottom_right.row).enumerate() {
        let mut row: Vec<CellValue> = match out.get(r) {
            Some(existing) => (**existing).clone(),
            None => Vec::new(),
        };
        if row.len() <= target.bottom_right.col {
            row.resize(target.bottom_right.col + 1, CellValue::Empty);
        }

        for (dc, c) in (target.top_left.col..=target.bottom_right.col).enumerate() {
            row[c] = clipboard.value_at(dr, dc);
        }

        if r < out.len() {
            out[r] = Arc::new(row);
        } else {
            // fill any gap rows first so indices line up
            while out.len() < r {
                out.push(Arc::new(Vec::new()));
            }
            out.push(Arc::new(row));
        }
    }
    out
}
