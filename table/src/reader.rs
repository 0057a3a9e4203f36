//! Line-oriented reader for header + rows text.
//!
//! The dialect: fields are separated by commas or tabs, double quotes toggle
//! a quoted state in which separators and `#` are literal, `#` outside
//! quotes starts a comment running to the end of the line, and whitespace
//! around fields is trimmed. Empty fields are dropped, so a line holding
//! only whitespace or a comment has no fields and is skipped.

use std::io::{BufRead, Lines};

use crate::error::{TableError, TableResult};

/// Splits one line into fields.
#[must_use]
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    // Bytes of `field` ending inside quotes, exempt from trimming.
    let mut protected = 0;
    let mut in_quotes = false;

    for chr in line.chars() {
        match chr {
            '"' => {
                in_quotes = !in_quotes;
                if !in_quotes {
                    protected = field.len();
                }
            }
            ',' | '\t' if !in_quotes => {
                finish_field(&mut field, protected, &mut fields);
                protected = 0;
            }
            '#' if !in_quotes => break,
            c if c.is_whitespace() && !in_quotes && field.is_empty() => {}
            c => field.push(c),
        }
    }
    finish_field(&mut field, protected, &mut fields);
    fields
}

fn finish_field(field: &mut String, protected: usize, fields: &mut Vec<String>) {
    let keep = protected.max(field.trim_end().len());
    if keep > 0 {
        fields.push(field[..keep].to_string());
    }
    field.clear();
}

/// Reads a header line and then one row at a time, giving access to fields
/// by column name.
///
/// Blank and comment lines are skipped everywhere. Every data line must have
/// as many fields as the header.
#[derive(Debug)]
pub struct RowReader<R> {
    lines: Lines<R>,
    header: Vec<String>,
    current: Vec<String>,
    line: usize,
}

impl<R: BufRead> RowReader<R> {
    /// Reads up to and including the header line.
    pub fn new(reader: R) -> TableResult<Self> {
        let mut lines = reader.lines();
        let mut line = 0;
        let header = loop {
            let Some(text) = lines.next() else {
                return Err(TableError::MissingHeader);
            };
            line += 1;
            let fields = split_fields(&text?);
            if !fields.is_empty() {
                break fields;
            }
        };
        Ok(Self {
            lines,
            header,
            current: Vec::new(),
            line,
        })
    }

    /// Returns the header fields.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.header
    }

    /// Returns the position of a column, matched case-insensitively.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// Returns the position of a column, matched exactly.
    #[must_use]
    pub fn column_index_exact(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    /// Fails with `MissingColumn` for the first name absent from the header.
    pub fn require_columns(&self, names: &[&str]) -> TableResult<()> {
        match names.iter().find(|name| self.column_index(name).is_none()) {
            Some(name) => Err(TableError::MissingColumn {
                column: (*name).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Advances to the next data line. Returns `false` at end of input.
    pub fn next_row(&mut self) -> TableResult<bool> {
        for text in self.lines.by_ref() {
            self.line += 1;
            let fields = split_fields(&text?);
            if fields.is_empty() {
                continue;
            }
            if fields.len() != self.header.len() {
                return Err(TableError::ColumnCountMismatch {
                    expected: self.header.len(),
                    actual: fields.len(),
                    line: self.line,
                });
            }
            self.current = fields;
            return Ok(true);
        }
        self.current.clear();
        Ok(false)
    }

    /// Returns the fields of the current row.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.current
    }

    /// Returns the 1-based number of the last line read.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the current row's field at a header position.
    pub fn field(&self, index: usize) -> TableResult<&str> {
        self.current
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| TableError::MissingColumn {
                column: index.to_string(),
            })
    }

    /// Returns the current row's field in the named column.
    pub fn get(&self, column: &str) -> TableResult<&str> {
        let index = self
            .column_index(column)
            .ok_or_else(|| TableError::MissingColumn {
                column: column.to_string(),
            })?;
        self.field(index)
    }

    /// Returns the current row's field in the named column as an integer
    /// (decimal or `0x` hexadecimal, optionally signed).
    pub fn get_integer(&self, column: &str) -> TableResult<i64> {
        let text = self.get(column)?;
        parse_i64(text).ok_or_else(|| TableError::InvalidNumber {
            line: self.line,
            column: column.to_string(),
            text: text.to_string(),
        })
    }
}

fn parse_i64(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, body) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(body, radix).ok()?;
    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn split_simple_and_tabs() {
        assert_eq!(split_fields("a,b\tc"), ["a", "b", "c"]);
        assert_eq!(split_fields(" a , b "), ["a", "b"]);
    }

    #[test]
    fn split_quoted_fields() {
        assert_eq!(split_fields("\"Id\",\"A\""), ["Id", "A"]);
        assert_eq!(split_fields("\"a,b\",c"), ["a,b", "c"]);
        assert_eq!(split_fields("id:\"layer\",x"), ["id:layer", "x"]);
        assert_eq!(split_fields("\"x # y\""), ["x # y"]);
        assert_eq!(split_fields("  \" a \" ,b"), [" a ", "b"]);
    }

    #[test]
    fn split_strips_comments() {
        assert_eq!(split_fields("a,b # trailing"), ["a", "b"]);
        assert!(split_fields("# whole line").is_empty());
        assert!(split_fields("   ").is_empty());
        assert!(split_fields("").is_empty());
    }

    #[test]
    fn split_drops_empty_fields() {
        assert_eq!(split_fields("a,,b,"), ["a", "b"]);
    }

    #[test]
    fn split_keeps_inner_spaces() {
        assert_eq!(split_fields("first run, x"), ["first run", "x"]);
    }

    #[test]
    fn reader_skips_leading_comments() {
        let text = "# comment\n\nFIRST_RUN,URL\n1,a.csv\n# between\n2,b.csv\n";
        let mut reader = RowReader::new(Cursor::new(text)).unwrap();
        assert_eq!(reader.columns(), ["FIRST_RUN", "URL"]);
        assert!(reader.next_row().unwrap());
        assert_eq!(reader.get_integer("first_run").unwrap(), 1);
        assert_eq!(reader.get("url").unwrap(), "a.csv");
        assert!(reader.next_row().unwrap());
        assert_eq!(reader.line(), 6);
        assert_eq!(reader.get("URL").unwrap(), "b.csv");
        assert!(!reader.next_row().unwrap());
    }

    #[test]
    fn reader_empty_input_has_no_header() {
        let err = RowReader::new(Cursor::new("# nothing\n\n")).unwrap_err();
        assert_eq!(err, TableError::MissingHeader);
    }

    #[test]
    fn reader_reports_short_line() {
        let mut reader = RowReader::new(Cursor::new("a,b\n1,2\n3\n")).unwrap();
        assert!(reader.next_row().unwrap());
        let err = reader.next_row().unwrap_err();
        assert_eq!(
            err,
            TableError::ColumnCountMismatch {
                expected: 2,
                actual: 1,
                line: 3
            }
        );
    }

    #[test]
    fn reader_require_columns() {
        let reader = RowReader::new(Cursor::new("first_run,url\n")).unwrap();
        reader.require_columns(&["FIRST_RUN", "URL"]).unwrap();
        let err = reader.require_columns(&["FIRST_RUN", "RUNTYPE"]).unwrap_err();
        assert_eq!(
            err,
            TableError::MissingColumn {
                column: "RUNTYPE".to_string()
            }
        );
    }

    #[test]
    fn reader_integer_errors() {
        let mut reader = RowReader::new(Cursor::new("a,b\nx,-1\n")).unwrap();
        reader.next_row().unwrap();
        assert_eq!(reader.get_integer("b").unwrap(), -1);
        assert!(matches!(
            reader.get_integer("a"),
            Err(TableError::InvalidNumber { line: 2, .. })
        ));
    }

    #[test]
    fn parse_i64_forms() {
        assert_eq!(parse_i64("0x10"), Some(16));
        assert_eq!(parse_i64("-0x10"), Some(-16));
        assert_eq!(parse_i64("12"), Some(12));
        assert_eq!(parse_i64("0x+1"), None);
        assert_eq!(parse_i64("+7"), Some(7));
        assert_eq!(parse_i64(""), None);
        assert_eq!(parse_i64("-"), None);
    }

    #[test]
    fn parse_i64_rejects_doubled_signs() {
        assert_eq!(parse_i64("--5"), None);
        assert_eq!(parse_i64("-+5"), None);
        assert_eq!(parse_i64("+-5"), None);
        assert_eq!(parse_i64("--9223372036854775808"), None);
        assert_eq!(parse_i64("-9223372036854775807"), Some(-i64::MAX));
        assert_eq!(parse_i64("9223372036854775808"), None);
    }

    #[test]
    fn reader_integer_rejects_doubled_sign() {
        let mut reader = RowReader::new(Cursor::new("a\n--5\n")).unwrap();
        reader.next_row().unwrap();
        assert!(matches!(
            reader.get_integer("a"),
            Err(TableError::InvalidNumber { line: 2, .. })
        ));
    }
}
