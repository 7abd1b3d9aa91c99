// CSV codec: lenient single-pass scanner plus delimiter sniffing.
//
// The scanner never fails. Inside quotes a doubled quote is a literal quote,
// delimiters and newlines are ordinary characters, and an unterminated quote
// simply scans to end of input. That leniency is the contract: imports
// degrade to best-effort rows instead of rejecting a whole file.

use std::collections::HashMap;

/// Parsing/serialization options.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    /// Trim whitespace around every field.
    pub trim: bool,
    /// Drop rows whose fields are all empty.
    pub skip_empty_lines: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: ',', quote: '"', trim: false, skip_empty_lines: false }
    }
}

impl CsvOptions {
    /// Options used for spreadsheet imports: trimmed fields, no blank rows.
    pub fn import() -> Self {
        Self { trim: true, skip_empty_lines: true, ..Self::default() }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Parse delimited text into rows of fields. Never fails.
pub fn parse(text: &str, opts: &CsvOptions) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == opts.quote {
            if in_quotes && chars.peek() == Some(&opts.quote) {
                // escaped literal quote
                field.push(opts.quote);
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == opts.delimiter && !in_quotes {
            push_field(&mut row, field, opts);
            field = String::new();
        } else if (c == '\n' || c == '\r') && !in_quotes {
            push_field(&mut row, field, opts);
            field = String::new();
            push_row(&mut rows, row, opts);
            row = Vec::new();
            // \r\n is a single terminator
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
        } else {
            field.push(c);
        }
    }

    // trailing field/row without a final newline
    if !field.is_empty() || !row.is_empty() {
        push_field(&mut row, field, opts);
        push_row(&mut rows, row, opts);
    }

    rows
}

fn push_field(row: &mut Vec<String>, field: String, opts: &CsvOptions) {
    if opts.trim {
        row.push(field.trim().to_string());
    } else {
        row.push(field);
    }
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>, opts: &CsvOptions) {
    if !opts.skip_empty_lines || row.iter().any(|f| !f.is_empty()) {
        rows.push(row);
    }
}

/// Serialize rows back to delimited text.
///
/// A field is quoted iff it contains the delimiter, the quote character, or a
/// newline; internal quotes are doubled. Rows join with `\n`.
pub fn stringify(rows: &[Vec<String>], opts: &CsvOptions) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|f| quote_field(f, opts))
                .collect::<Vec<_>>()
                .join(&opts.delimiter.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_field(field: &str, opts: &CsvOptions) -> String {
    let needs_quoting = field.contains(opts.delimiter)
        || field.contains(opts.quote)
        || field.contains('\n')
        || field.contains('\r');
    if needs_quoting {
        let doubled = field.replace(opts.quote, &format!("{0}{0}", opts.quote));
        format!("{0}{1}{0}", opts.quote, doubled)
    } else {
        field.to_string()
    }
}

/// Parse with the first row as headers; each data row becomes a
/// header -> value map, with short rows leaving missing trailing columns
/// empty.
pub fn parse_to_objects(text: &str, opts: &CsvOptions) -> Vec<HashMap<String, String>> {
    let rows = parse(text, opts);
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };

    data.iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line
/// with a quote-aware reader. The delimiter producing the most consistent
/// field count (>1 field) wins; comma on no signal.
pub fn sniff_delimiter(text: &str) -> char {
    let candidates = ['\t', ';', ',', '|'];
    let sample_lines: Vec<&str> = text.lines().take(10).collect();

    if sample_lines.is_empty() {
        return ',';
    }

    let mut best = ',';
    let mut best_score = 0u64;

    for delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim as u8)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
