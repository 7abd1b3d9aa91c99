//! Field schema and cell validation.
//!
//! Each column of a sheet is a `Field`. The validator a field uses is
//! resolved once, when the field is constructed, from substring rules over
//! the lower-cased title (the convention catalog templates follow). After
//! that point dispatch is on the `FieldKind` enum, never on the title.
//!
//! Validation failures are data, not panics: callers get a
//! `ValidationError` and decide whether to surface it inline.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Validator assigned to a field at schema-definition time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Accept anything; coerce to the trimmed string form.
    #[default]
    PlainText,
    /// Full email pattern match.
    Email,
    /// Must parse as a well-formed URL.
    Url,
    /// Must parse as a finite number; coerces to the numeric type.
    Coordinate,
    /// Non-empty, no characters illegal in filenames.
    Filename,
}

impl FieldKind {
    /// Resolve the validator for a field title.
    ///
    /// Matches the title conventions of the default archival field set:
    /// `field_coordinates` gets Coordinate, `file` gets Filename, and so on.
    pub fn infer(title: &str) -> Self {
        let t = title.to_lowercase();
        if t.contains("email") {
            FieldKind::Email
        } else if t.contains("url") || t.contains("link") {
            FieldKind::Url
        } else if t.contains("coordinate") || t.contains("lat") || t.contains("lng") {
            FieldKind::Coordinate
        } else if t == "file" || t.contains("filename") {
            FieldKind::Filename
        } else {
            FieldKind::PlainText
        }
    }
}

/// Why a value was rejected for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidEmail,
    InvalidUrl,
    NonNumericCoordinate,
    EmptyFilename,
    IllegalFilenameCharacter,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail => write!(f, "Invalid email format"),
            ValidationError::InvalidUrl => write!(f, "Invalid URL format"),
            ValidationError::NonNumericCoordinate => write!(f, "Coordinates must be numeric"),
            ValidationError::EmptyFilename => write!(f, "File name cannot be empty"),
            ValidationError::IllegalFilenameCharacter => {
                write!(f, "File name contains invalid characters")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column title, unique within a sheet.
    pub title: String,
    /// Guidance shown to editors (and fed to the AI prompt upstream).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Validator, resolved from the title at construction.
    #[serde(default)]
    pub kind: FieldKind,
}

impl Field {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let kind = FieldKind::infer(&title);
        Self { title, instructions: None, kind }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Validate a candidate value, returning the coerced value to store.
    ///
    /// Empty input always passes and coerces to the empty string; everything
    /// else is checked against the field's kind on its trimmed string form.
    pub fn validate(&self, value: &CellValue) -> Result<CellValue, ValidationError> {
        if matches!(value, CellValue::Empty) {
            return Ok(CellValue::Text(String::new()));
        }

        let text = value.display();
        let trimmed = text.trim();

        match self.kind {
            FieldKind::Email => {
                if email_pattern().is_match(trimmed) {
                    Ok(CellValue::Text(trimmed.to_string()))
                } else {
                    Err(ValidationError::InvalidEmail)
                }
            }
            FieldKind::Url => match url::Url::parse(trimmed) {
                Ok(_) => Ok(CellValue::Text(trimmed.to_string())),
                Err(_) => Err(ValidationError::InvalidUrl),
            },
            FieldKind::Coordinate => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(CellValue::Number(n)),
                _ => Err(ValidationError::NonNumericCoordinate),
            },
            FieldKind::Filename => {
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyFilename);
                }
                if trimmed.chars().any(|c| matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')) {
                    return Err(ValidationError::IllegalFilenameCharacter);
                }
                Ok(CellValue::Text(trimmed.to_string()))
            }
            FieldKind::PlainText => Ok(CellValue::Text(trimmed.to_string())),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kinds() {
        assert_eq!(FieldKind::infer("contact_email"), FieldKind::Email);
        assert_eq!(FieldKind::infer("source_url"), FieldKind::Url);
        assert_eq!(FieldKind::infer("external link"), FieldKind::Url);
        assert_eq!(FieldKind::infer("field_coordinates"), FieldKind::Coordinate);
        assert_eq!(FieldKind::infer("latitude"), FieldKind::Coordinate);
        assert_eq!(FieldKind::infer("file"), FieldKind::Filename);
        assert_eq!(FieldKind::infer("original_filename"), FieldKind::Filename);
        assert_eq!(FieldKind::infer("title"), FieldKind::PlainText);
        // "file" only matches as a whole title, not as a substring
        assert_eq!(FieldKind::infer("file_extension"), FieldKind::PlainText);
    }

    #[test]
    fn test_email_validation() {
        let field = Field::new("owner_email");
        assert_eq!(
            field.validate(&"a@b.co".into()),
            Ok(CellValue::Text("a@b.co".into()))
        );
        assert_eq!(field.validate(&"not-an-email".into()), Err(ValidationError::InvalidEmail));
        assert_eq!(field.validate(&"a @b.co".into()), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_url_validation() {
        let field = Field::new("source_url");
        assert!(field.validate(&"https://example.org/a".into()).is_ok());
        assert_eq!(field.validate(&"notaurl".into()), Err(ValidationError::InvalidUrl));
    }

    #[test]
    fn test_coordinate_coercion() {
        let field = Field::new("field_coordinates");
        assert_eq!(field.validate(&"45.123".into()), Ok(CellValue::Number(45.123)));
        assert_eq!(field.validate(&" -7 ".into()), Ok(CellValue::Number(-7.0)));
        assert_eq!(
            field.validate(&"not-a-number".into()),
            Err(ValidationError::NonNumericCoordinate)
        );
        assert_eq!(
            field.validate(&"inf".into()),
            Err(ValidationError::NonNumericCoordinate)
        );
    }

    #[test]
    fn test_filename_validation() {
        let field = Field::new("file");
        assert!(field.validate(&"scan_001.tif".into()).is_ok());
        assert_eq!(field.validate(&"   ".into()), Err(ValidationError::EmptyFilename));
        assert_eq!(
            field.validate(&"bad/name.tif".into()),
            Err(ValidationError::IllegalFilenameCharacter)
        );
        assert_eq!(
            field.validate(&"que?.png".into()),
            Err(ValidationError::IllegalFilenameCharacter)
        );
    }

    #[test]
    fn test_empty_always_passes() {
        for title in ["owner_email", "source_url", "field_coordinates", "file", "title"] {
            let field = Field::new(title);
            assert_eq!(field.validate(&CellValue::Empty), Ok(CellValue::Text(String::new())));
        }
    }

    #[test]
    fn test_plain_text_trims() {
        let field = Field::new("field_description");
        assert_eq!(
            field.validate(&"  padded  ".into()),
            Ok(CellValue::Text("padded".into()))
        );
    }
}
