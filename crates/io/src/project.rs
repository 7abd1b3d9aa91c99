// Project lifecycle: default archival schema, template generation from an
// image directory, CSV import/export, and a session object that funnels every
// sheet mutation through debounced persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use accession_ai::AiResults;
use accession_engine::cell::CellValue;
use accession_engine::field::Field;
use accession_engine::sheet::{
    CellEdit, EditError, Row, RowEditError, Sheet, SheetError,
};

use crate::autosave::Autosave;
use crate::csv::{self, CsvOptions};
use crate::store::{ProjectStore, StoreError};

const IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "webp", "tif", "tiff", "bmp"];

#[derive(Debug)]
pub enum ProjectError {
    Store(StoreError),
    /// Filesystem error while scanning images
    Io(String),
    /// No project in the store
    NoProject,
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::Store(e) => write!(f, "{}", e),
            ProjectError::Io(msg) => write!(f, "I/O error: {}", msg),
            ProjectError::NoProject => write!(f, "No project found; create one first"),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<StoreError> for ProjectError {
    fn from(e: StoreError) -> Self {
        ProjectError::Store(e)
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest filename first, the archival intake convention.
    #[default]
    Descending,
    Ascending,
}

/// The default archival field set for a new project.
pub fn default_fields() -> Vec<Field> {
    vec![
        Field::new("file").with_instructions("Source image filename. Do not edit."),
        Field::new("file_extension")
            .with_instructions("Lowercase extension of the source file."),
        Field::new("accessIdentifier").with_instructions(
            "Unique access identifier, usually the filename without its extension.",
        ),
        Field::new("fileTitle")
            .with_instructions("Short working title for the digitized file."),
        Field::new("title").with_instructions(
            "Descriptive title. Use brackets for supplied titles, e.g. [Portrait of a woman].",
        ),
        Field::new("field_description")
            .with_instructions("One or two sentences describing the depicted scene."),
        Field::new("field_subject")
            .with_instructions("Topical subject terms, separated by semicolons."),
        Field::new("field_linked_agent")
            .with_instructions("Creator or contributor, as 'relator:Name' when known."),
        Field::new("field_resource_type")
            .with_instructions("Resource type term, e.g. still image."),
        Field::new("field_rights").with_instructions("Rights statement or license URI."),
        Field::new("field_geographic_subject")
            .with_instructions("Place names depicted or associated, separated by semicolons."),
        Field::new("field_coordinates")
            .with_instructions("Decimal coordinate for the primary place, if known."),
    ]
}

/// Scan a directory for image files, sorted by filename.
pub fn list_images(dir: &Path, order: SortOrder) -> Result<Vec<(String, PathBuf)>, ProjectError> {
    let mut images: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            images.push((name.to_string(), path.clone()));
        }
    }
    images.sort_by(|a, b| match order {
        SortOrder::Ascending => a.0.cmp(&b.0),
        SortOrder::Descending => b.0.cmp(&a.0),
    });
    Ok(images)
}

/// Seed value for a field on a fresh template row.
///
/// The filename-derived columns are computed; everything else comes from the
/// cached model draft for that image, when one exists.
fn seed_value(field: &Field, filename: &str, ai: Option<&accession_ai::ImageResponse>) -> CellValue {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    match field.title.as_str() {
        "file" => CellValue::Text(filename.to_string()),
        "file_extension" => {
            let ext = Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();
            CellValue::Text(ext)
        }
        "accessIdentifier" => CellValue::Text(stem.to_string()),
        "field_resource_type" => {
            let drafted = ai.and_then(|r| r.metadata.value_for("field_resource_type"));
            CellValue::Text(drafted.unwrap_or("still image").to_string())
        }
        title => match ai.and_then(|r| r.metadata.value_for(title)) {
            Some(v) => CellValue::Text(v.to_string()),
            None => CellValue::Text(String::new()),
        },
    }
}

/// Build a fresh sheet with one row per image, seeded from any cached model
/// drafts.
pub fn generate_template(
    images: &[(String, PathBuf)],
    fields: Vec<Field>,
    ai_results: Option<&AiResults>,
) -> Sheet {
    let mut sheet = Sheet::new(fields);
    for (filename, path) in images {
        let ai = ai_results.and_then(|r| r.get(filename));
        let mut row_data = Row::default();
        for field in &sheet.fields {
            row_data.insert(field.title.clone(), seed_value(field, filename, ai));
        }
        sheet = sheet.add_row(&row_data, None);
        sheet.images.push((filename.clone(), path.clone()));
    }
    sheet
}

/// Build a sheet from CSV text: first row becomes the field titles, data rows
/// become sheet rows. No validation is applied to imported values.
pub fn sheet_from_csv(text: &str) -> Sheet {
    let opts = CsvOptions::import().with_delimiter(csv::sniff_delimiter(text));
    let rows = csv::parse(text, &opts);
    let Some((headers, data)) = rows.split_first() else {
        return Sheet::new(Vec::new());
    };

    let fields: Vec<Field> = headers.iter().map(|h| Field::new(h)).collect();
    let mut sheet = Sheet::new(fields);
    for record in data {
        let mut row_data = Row::default();
        for (i, field) in sheet.fields.iter().enumerate() {
            let value = record.get(i).cloned().unwrap_or_default();
            row_data.insert(field.title.clone(), CellValue::Text(value));
        }
        sheet = sheet.add_row(&row_data, None);
    }
    sheet
}

/// Export a sheet as CSV, columns in field order, header row first.
pub fn sheet_to_csv(sheet: &Sheet) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(sheet.rows.len() + 1);
    rows.push(sheet.fields.iter().map(|f| f.title.clone()).collect());
    for i in 0..sheet.rows.len() {
        rows.push(
            sheet
                .fields
                .iter()
                .map(|f| sheet.value(i, &f.title).display())
                .collect(),
        );
    }
    csv::stringify(&rows, &CsvOptions::default())
}

/// A live editing session: the current sheet plus its store and autosaver.
///
/// Every mutation replaces `sheet` with a new snapshot and schedules a
/// debounced write of it.
pub struct Project {
    pub sheet: Sheet,
    store: Arc<ProjectStore>,
    autosave: Autosave,
}

impl Project {
    /// Create a new project from an image directory and persist it.
    pub fn create_from_images(
        store: Arc<ProjectStore>,
        name: &str,
        images_dir: &Path,
        order: SortOrder,
    ) -> Result<Self, ProjectError> {
        let images = list_images(images_dir, order)?;
        let ai_results = store.ai_results()?;
        let sheet = generate_template(&images, default_fields(), ai_results.as_ref());

        store.set_project_name(name)?;
        store.set_images_dir(images_dir)?;
        store.set_sheet(&sheet)?;

        let autosave = Autosave::new(Arc::clone(&store));
        Ok(Self { sheet, store, autosave })
    }

    /// Create a project around an already-built sheet (CSV import paths).
    pub fn create_from_sheet(
        store: Arc<ProjectStore>,
        name: &str,
        sheet: Sheet,
    ) -> Result<Self, ProjectError> {
        store.set_project_name(name)?;
        store.set_sheet(&sheet)?;
        let autosave = Autosave::new(Arc::clone(&store));
        Ok(Self { sheet, store, autosave })
    }

    /// Load the stored project.
    pub fn load(store: Arc<ProjectStore>) -> Result<Self, ProjectError> {
        let sheet = store.get_sheet()?.ok_or(ProjectError::NoProject)?;
        let autosave = Autosave::new(Arc::clone(&store));
        Ok(Self { sheet, store, autosave })
    }

    /// Replace the default debounce window (from the settings file).
    pub fn with_autosave_delay(mut self, delay: std::time::Duration) -> Self {
        self.autosave = Autosave::with_delay(Arc::clone(&self.store), delay);
        self
    }

    pub fn name(&self) -> Result<Option<String>, ProjectError> {
        Ok(self.store.project_name()?)
    }

    pub fn edit_cell(
        &mut self,
        row: usize,
        field: &str,
        value: CellValue,
    ) -> Result<(), EditError> {
        self.sheet = self.sheet.edit_cell(row, field, value)?;
        self.autosave.schedule(self.sheet.clone());
        Ok(())
    }

    pub fn edit_row(&mut self, row: usize, row_data: &Row) -> Result<(), RowEditError> {
        self.sheet = self.sheet.edit_row(row, row_data)?;
        self.autosave.schedule(self.sheet.clone());
        Ok(())
    }

    pub fn add_row(&mut self, row_data: &Row, insert_index: Option<usize>) {
        self.sheet = self.sheet.add_row(row_data, insert_index);
        self.autosave.schedule(self.sheet.clone());
    }

    pub fn delete_row(&mut self, index: usize) -> Result<(), SheetError> {
        self.sheet = self.sheet.delete_row(index)?;
        self.autosave.schedule(self.sheet.clone());
        Ok(())
    }

    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), SheetError> {
        self.sheet = self.sheet.move_row(from, to)?;
        self.autosave.schedule(self.sheet.clone());
        Ok(())
    }

    pub fn batch_edit_cells(&mut self, edits: &[CellEdit]) {
        self.sheet = self.sheet.batch_edit_cells(edits);
        self.autosave.schedule(self.sheet.clone());
    }

    /// Persist the current sheet immediately.
    pub fn save(&self) -> Result<(), ProjectError> {
        Ok(self.autosave.flush(&self.sheet)?)
    }

    pub fn export_csv(&self) -> String {
        sheet_to_csv(&self.sheet)
    }

    /// Drop the stored project. The in-memory sheet is left untouched so a
    /// caller can still export it.
    pub fn clear(&self) -> Result<(), ProjectError> {
        self.autosave.cancel();
        Ok(self.store.clear_project()?)
    }
}

/// Row-level validation report for a whole sheet, row index to field errors.
/// Useful before export.
pub fn validate_sheet(sheet: &Sheet) -> BTreeMap<usize, BTreeMap<String, String>> {
    let mut report = BTreeMap::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        let mut errors = BTreeMap::new();
        for field in &sheet.fields {
            let value = row.get(&field.title).cloned().unwrap_or(CellValue::Empty);
            if let Err(e) = field.validate(&value) {
                errors.insert(field.title.clone(), e.to_string());
            }
        }
        if !errors.is_empty() {
            report.insert(i, errors);
        }
    }
    report
}
