//! Cell addresses.
//!
//! An `Address` is a zero-based (column, row) coordinate with a canonical
//! A1-style text form: bijective base-26 column letters followed by the
//! 1-based row number.

use std::fmt;

/// Zero-based cell coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Column index (0-based)
    pub col: usize,
    /// Row index (0-based)
    pub row: usize,
}

/// Why a strict address parse failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    /// Input does not match `^[A-Z]+[0-9]+$`.
    Malformed(String),
    /// Row digits parsed to 0 (rows are 1-based in text form).
    RowZero(String),
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressParseError::Malformed(s) => write!(f, "Malformed cell address: {:?}", s),
            AddressParseError::RowZero(s) => write!(f, "Row number must be at least 1: {:?}", s),
        }
    }
}

impl std::error::Error for AddressParseError {}

impl Address {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Canonical text form, e.g. `(0, 0)` -> "A1", `(26, 11)` -> "AA12".
    pub fn to_a1(self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }

    /// Strict parse of an A1-style address.
    pub fn parse(text: &str) -> Result<Self, AddressParseError> {
        let letters_end = text.bytes().take_while(|b| b.is_ascii_uppercase()).count();
        let (letters, digits) = text.split_at(letters_end);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressParseError::Malformed(text.to_string()));
        }

        let col = letters_to_col(letters);
        let row_1based: usize = digits
            .parse()
            .map_err(|_| AddressParseError::Malformed(text.to_string()))?;
        if row_1based == 0 {
            return Err(AddressParseError::RowZero(text.to_string()));
        }

        Ok(Self { col, row: row_1based - 1 })
    }

    /// Lenient parse: malformed input maps to A1 instead of failing.
    ///
    /// This is the contract grid callers rely on for pasted or persisted
    /// selection text; use [`Address::parse`] when rejection is wanted.
    pub fn parse_lenient(text: &str) -> Self {
        Self::parse(text).unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

/// Convert 0-based column index to spreadsheet letter(s): 0=A, 25=Z, 26=AA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Inverse of [`col_to_letters`]. Expects ASCII uppercase input.
pub fn letters_to_col(letters: &str) -> usize {
    let mut col = 0usize;
    for b in letters.bytes() {
        col = col * 26 + (b - b'A' + 1) as usize;
    }
    col - 1
}
