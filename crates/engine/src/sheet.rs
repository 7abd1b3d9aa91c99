//! The sheet entity and its copy-on-write mutation operations.
//!
//! A `Sheet` is never mutated in place. Every operation takes `&self` and
//! returns a new snapshot whose row sequence shares untouched rows with the
//! original through `Arc`. That makes "new sheet, shared unchanged rows" a
//! structural guarantee rather than a convention.
//!
//! Two editing paths exist on purpose:
//! - `edit_cell` / `edit_row` run field validation and coerce values;
//! - `batch_edit_cells` applies raw values best-effort, skipping bad
//!   coordinates with a warning. Bulk callers (CSV import, accepted AI
//!   drafts) have already shaped their data and need all-or-most semantics,
//!   not per-cell rejection.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::field::{Field, ValidationError};

/// One data row: field title -> cell value. Absent keys read as empty.
pub type Row = FxHashMap<String, CellValue>;

/// An imported image: filename plus its location on disk.
pub type ImageEntry = (String, PathBuf);

/// Index or schema failure on a sheet operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// Row index outside `[0, len)`.
    RowIndex { index: usize, len: usize },
    /// One of a move's endpoints is outside `[0, len)`.
    RowRange { from: usize, to: usize, len: usize },
    /// Field title not present in the sheet's schema.
    UnknownField(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::RowIndex { index, len } => {
                write!(f, "Invalid row index: {} (sheet has {} rows)", index, len)
            }
            SheetError::RowRange { from, to, len } => {
                write!(f, "Invalid row indices: from={}, to={} (sheet has {} rows)", from, to, len)
            }
            SheetError::UnknownField(title) => write!(f, "Field '{}' not found", title),
        }
    }
}

impl std::error::Error for SheetError {}

/// Failure of the validated single-cell edit path.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    Sheet(SheetError),
    Invalid(ValidationError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::Sheet(e) => e.fmt(f),
            EditError::Invalid(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EditError {}

impl From<SheetError> for EditError {
    fn from(e: SheetError) -> Self {
        EditError::Sheet(e)
    }
}

/// Failure of the validated whole-row edit path.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEditError {
    Sheet(SheetError),
    /// Per-field error messages; contains exactly the failing titles.
    Invalid(BTreeMap<String, String>),
}

impl fmt::Display for RowEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowEditError::Sheet(e) => e.fmt(f),
            RowEditError::Invalid(errors) => {
                write!(f, "{} field(s) failed validation", errors.len())
            }
        }
    }
}

impl std::error::Error for RowEditError {}

/// One entry of a bulk edit.
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub row: usize,
    pub field: String,
    pub value: CellValue,
}

/// An intake sheet: ordered fields, rows keyed by field title, and the image
/// manifest the sheet was created from.
///
/// `images[i]` corresponds to `rows[i]` at creation time only. Row
/// reordering and deletion do not re-synchronize the manifest; consumers
/// that need the pairing must key on the `file` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub fields: Vec<Field>,
    pub rows: Vec<Arc<Row>>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

impl Sheet {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, rows: Vec::new(), images: Vec::new() }
    }

    pub fn field(&self, title: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.title == title)
    }

    fn require_field(&self, title: &str) -> Result<&Field, SheetError> {
        self.field(title).ok_or_else(|| SheetError::UnknownField(title.to_string()))
    }

    fn require_row(&self, index: usize) -> Result<(), SheetError> {
        if index >= self.rows.len() {
            return Err(SheetError::RowIndex { index, len: self.rows.len() });
        }
        Ok(())
    }

    /// Value of one cell; absent keys read as empty.
    pub fn value(&self, row: usize, field: &str) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(field))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /// Project the sheet into grid rows in field order, for range operations
    /// and rendering.
    pub fn grid(&self) -> Vec<Arc<Vec<CellValue>>> {
        self.rows
            .iter()
            .map(|row| {
                Arc::new(
                    self.fields
                        .iter()
                        .map(|f| row.get(&f.title).cloned().unwrap_or(CellValue::Empty))
                        .collect(),
                )
            })
            .collect()
    }

    /// Validated single-cell edit.
    ///
    /// Returns a new sheet with only the touched row copied; the receiver is
    /// untouched on any failure.
    pub fn edit_cell(&self, row: usize, field: &str, value: CellValue) -> Result<Sheet, EditError> {
        self.require_row(row)?;
        let field_def = self.require_field(field)?;

        let coerced = field_def.validate(&value).map_err(EditError::Invalid)?;

        let mut next = self.clone();
        let mut new_row: Row = (*next.rows[row]).clone();
        new_row.insert(field.to_string(), coerced);
        next.rows[row] = Arc::new(new_row);
        Ok(next)
    }

    /// Validated whole-row edit.
    ///
    /// Every field of the sheet is validated against `row_data`, not just the
    /// keys present; the update is all-or-nothing and the error map names
    /// exactly the failing field titles.
    pub fn edit_row(&self, row: usize, row_data: &Row) -> Result<Sheet, RowEditError> {
        self.require_row(row).map_err(RowEditError::Sheet)?;

        let mut errors: BTreeMap<String, String> = BTreeMap::new();
        let mut coerced: Vec<(String, CellValue)> = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = row_data.get(&field.title).cloned().unwrap_or(CellValue::Empty);
            match field.validate(&value) {
                Ok(v) => coerced.push((field.title.clone(), v)),
                Err(e) => {
                    errors.insert(field.title.clone(), e.to_string());
                }
            }
        }

        if !errors.is_empty() {
            return Err(RowEditError::Invalid(errors));
        }

        let mut next = self.clone();
        let mut new_row: Row = (*next.rows[row]).clone();
        for (title, value) in coerced {
            new_row.insert(title, value);
        }
        next.rows[row] = Arc::new(new_row);
        Ok(next)
    }

    /// Append or insert a row. Every field defaults to the empty string,
    /// overridden by matching keys of `row_data`. No validation is performed.
    pub fn add_row(&self, row_data: &Row, insert_index: Option<usize>) -> Sheet {
        let mut new_row = Row::default();
        for field in &self.fields {
            let value = row_data
                .get(&field.title)
                .cloned()
                .unwrap_or_else(|| CellValue::Text(String::new()));
            new_row.insert(field.title.clone(), value);
        }

        let mut next = self.clone();
        match insert_index {
            Some(i) if i <= next.rows.len() => next.rows.insert(i, Arc::new(new_row)),
            _ => next.rows.push(Arc::new(new_row)),
        }
        next
    }

    pub fn delete_row(&self, index: usize) -> Result<Sheet, SheetError> {
        self.require_row(index)?;
        let mut next = self.clone();
        next.rows.remove(index);
        Ok(next)
    }

    /// Move a row, preserving the order of all others. `from == to` is a
    /// no-op snapshot sharing every row.
    pub fn move_row(&self, from: usize, to: usize) -> Result<Sheet, SheetError> {
        if from >= self.rows.len() || to >= self.rows.len() {
            return Err(SheetError::RowRange { from, to, len: self.rows.len() });
        }
        if from == to {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        let row = next.rows.remove(from);
        next.rows.insert(to, row);
        Ok(next)
    }

    /// Best-effort bulk edit with no validation or coercion.
    ///
    /// Edits naming a nonexistent row or field are skipped with a warning;
    /// everything else applies. This is the trusted-source path, distinct by
    /// contract from [`Sheet::edit_cell`].
    pub fn batch_edit_cells(&self, edits: &[CellEdit]) -> Sheet {
        let mut next = self.clone();
        let mut touched: Vec<Option<Row>> = vec![None; next.rows.len()];

        for edit in edits {
            if edit.row >= next.rows.len() {
                eprintln!("Invalid row index: {}, skipping edit", edit.row);
                continue;
            }
            if self.field(&edit.field).is_none() {
                eprintln!("Field '{}' not found, skipping edit", edit.field);
                continue;
            }
            let row = touched[edit.row].get_or_insert_with(|| (*next.rows[edit.row]).clone());
            row.insert(edit.field.clone(), edit.value.clone());
        }

        for (i, row) in touched.into_iter().enumerate() {
            if let Some(row) = row {
                next.rows[i] = Arc::new(row);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn sample_sheet() -> Sheet {
        let fields = vec![
            Field::new("file"),
            Field::new("title"),
            Field::new("field_coordinates"),
        ];
        let mut sheet = Sheet::new(fields);
        for i in 0..3 {
            let mut row = Row::default();
            row.insert("file".into(), CellValue::Text(format!("img_{i}.tif")));
            row.insert("title".into(), CellValue::Text(format!("Item {i}")));
            sheet.rows.push(Arc::new(row));
        }
        sheet
    }

    #[test]
    fn test_edit_cell_coerces_coordinates() {
        let sheet = sample_sheet();
        assert_eq!(sheet.field("field_coordinates").unwrap().kind, FieldKind::Coordinate);

        let next = sheet.edit_cell(0, "field_coordinates", "45.123".into()).unwrap();
        assert_eq!(next.value(0, "field_coordinates"), CellValue::Number(45.123));
        // original untouched
        assert_eq!(sheet.value(0, "field_coordinates"), CellValue::Empty);
    }

    #[test]
    fn test_edit_cell_rejects_bad_coordinate() {
        let sheet = sample_sheet();
        let err = sheet.edit_cell(0, "field_coordinates", "not-a-number".into()).unwrap_err();
        assert_eq!(err, EditError::Invalid(ValidationError::NonNumericCoordinate));
    }

    #[test]
    fn test_edit_cell_bounds_and_schema() {
        let sheet = sample_sheet();
        assert_eq!(
            sheet.edit_cell(99, "title", "x".into()),
            Err(EditError::Sheet(SheetError::RowIndex { index: 99, len: 3 }))
        );
        assert_eq!(
            sheet.edit_cell(0, "nope", "x".into()),
            Err(EditError::Sheet(SheetError::UnknownField("nope".into())))
        );
    }

    #[test]
    fn test_edit_cell_shares_untouched_rows() {
        let sheet = sample_sheet();
        let next = sheet.edit_cell(1, "title", "Renamed".into()).unwrap();
        assert!(Arc::ptr_eq(&sheet.rows[0], &next.rows[0]));
        assert!(!Arc::ptr_eq(&sheet.rows[1], &next.rows[1]));
        assert!(Arc::ptr_eq(&sheet.rows[2], &next.rows[2]));
    }

    #[test]
    fn test_edit_row_atomicity() {
        let sheet = sample_sheet();
        let mut data = Row::default();
        data.insert("title".into(), CellValue::Text("New".into()));
        data.insert("field_coordinates".into(), CellValue::Text("garbage".into()));
        data.insert("file".into(), CellValue::Text("bad/name".into()));

        let err = sheet.edit_row(0, &data).unwrap_err();
        match err {
            RowEditError::Invalid(errors) => {
                let titles: Vec<&str> = errors.keys().map(|s| s.as_str()).collect();
                assert_eq!(titles, vec!["field_coordinates", "file"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        // nothing applied
        assert_eq!(sheet.value(0, "title"), CellValue::Text("Item 0".into()));
    }

    #[test]
    fn test_edit_row_validates_every_field() {
        // row_data omits "file"; the existing row has a valid filename, but
        // validation still runs over the Empty default, which passes.
        let sheet = sample_sheet();
        let mut data = Row::default();
        data.insert("title".into(), CellValue::Text("Only title".into()));

        let next = sheet.edit_row(0, &data).unwrap();
        assert_eq!(next.value(0, "title"), CellValue::Text("Only title".into()));
        // unspecified fields coerce to empty string via validation
        assert_eq!(next.value(0, "file"), CellValue::Text(String::new()));
    }

    #[test]
    fn test_add_row_defaults_and_insert() {
        let sheet = sample_sheet();
        let mut data = Row::default();
        data.insert("title".into(), CellValue::Text("Inserted".into()));
        data.insert("unknown".into(), CellValue::Text("dropped".into()));

        let next = sheet.add_row(&data, Some(1));
        assert_eq!(next.rows.len(), 4);
        assert_eq!(next.value(1, "title"), CellValue::Text("Inserted".into()));
        assert_eq!(next.value(1, "file"), CellValue::Text(String::new()));
        assert_eq!(next.value(1, "unknown"), CellValue::Empty);

        // out-of-range insert index appends
        let appended = sheet.add_row(&Row::default(), Some(99));
        assert_eq!(appended.value(3, "file"), CellValue::Text(String::new()));
    }

    #[test]
    fn test_delete_row() {
        let sheet = sample_sheet();
        let next = sheet.delete_row(1).unwrap();
        assert_eq!(next.rows.len(), 2);
        assert_eq!(next.value(1, "title"), CellValue::Text("Item 2".into()));
        assert!(sheet.delete_row(3).is_err());
    }

    #[test]
    fn test_move_row() {
        let sheet = sample_sheet();
        let next = sheet.move_row(0, 2).unwrap();
        assert_eq!(next.value(0, "title"), CellValue::Text("Item 1".into()));
        assert_eq!(next.value(2, "title"), CellValue::Text("Item 0".into()));

        assert_eq!(
            sheet.move_row(0, 9),
            Err(SheetError::RowRange { from: 0, to: 9, len: 3 })
        );
    }

    #[test]
    fn test_move_row_same_index_shares_all_rows() {
        let sheet = sample_sheet();
        let next = sheet.move_row(2, 2).unwrap();
        for (a, b) in sheet.rows.iter().zip(next.rows.iter()) {
            assert!(Arc::ptr_eq(a, b));
        }
    }

    #[test]
    fn test_batch_edit_skips_bad_edits() {
        let sheet = sample_sheet();
        let edits = vec![
            CellEdit { row: 0, field: "title".into(), value: "A".into() },
            CellEdit { row: 1, field: "no_such_field".into(), value: "B".into() },
            CellEdit { row: 99, field: "title".into(), value: "C".into() },
            CellEdit { row: 2, field: "title".into(), value: "D".into() },
        ];
        let next = sheet.batch_edit_cells(&edits);
        assert_eq!(next.value(0, "title"), CellValue::Text("A".into()));
        assert_eq!(next.value(1, "title"), CellValue::Text("Item 1".into()));
        assert_eq!(next.value(2, "title"), CellValue::Text("D".into()));
    }

    #[test]
    fn test_batch_edit_bypasses_validation() {
        let sheet = sample_sheet();
        let edits = vec![CellEdit {
            row: 0,
            field: "field_coordinates".into(),
            value: "not numeric".into(),
        }];
        let next = sheet.batch_edit_cells(&edits);
        assert_eq!(next.value(0, "field_coordinates"), CellValue::Text("not numeric".into()));
    }

    #[test]
    fn test_sheet_equality_tracks_content() {
        let sheet = sample_sheet();
        assert_eq!(sheet, sheet.clone());

        let edited = sheet.edit_cell(0, "title", "Changed".into()).unwrap();
        assert_ne!(sheet, edited);
        // failed ops compare against the expected error
        assert_eq!(
            sheet.edit_cell(99, "title", "x".into()),
            Err(EditError::Sheet(SheetError::RowIndex { index: 99, len: 3 }))
        );
    }

    #[test]
    fn test_grid_projection_feeds_range_ops() {
        use crate::address::Address;
        use crate::range::{clear, Range};

        let sheet = sample_sheet();
        let data = sheet.grid();
        assert_eq!(data[0][1], CellValue::Text("Item 0".into()));

        let title_col = Range::normalize(Address::new(1, 0), Address::new(1, 2));
        let cleared = clear(&data, &title_col);
        assert_eq!(cleared[0][0], CellValue::Text("img_0.tif".into()));
        assert!(cleared.iter().all(|row| row[1] == CellValue::Empty));
    }

    #[test]
    fn test_absent_keys_read_empty() {
        let sheet = sample_sheet();
        assert_eq!(sheet.value(0, "field_coordinates"), CellValue::Empty);
    }
}
