//! Minimal CSV rendering for the summary exports.

use std::fmt::Write as _;

/// An in-memory CSV document: one header line plus data rows, `\n`
/// terminated.
pub struct CsvDocument {
    buf: String,
    columns: usize,
}

impl CsvDocument {
    #[must_use]
    pub fn new(header: &[&str]) -> Self {
        let mut doc = Self {
            buf: String::new(),
            columns: header.len(),
        };
        doc.push_line(header.iter().copied());
        doc
    }

    /// Append a row. Rows shorter than the header are padded with empty
    /// fields; extra fields are kept.
    pub fn row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        if fields.len() < self.columns {
            fields.resize(self.columns, String::new());
        }
        self.push_line(fields.iter().map(String::as_str));
    }

    fn push_line<'a>(&mut self, fields: impl Iterator<Item = &'a str>) {
        let line = fields.map(escape).collect::<Vec<_>>().join(",");
        let _ = writeln!(self.buf, "{line}");
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Quote a field when it contains a separator, quote or line break.
#[must_use]
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Two-decimal rendering used for every average in the exports.
#[must_use]
pub fn fixed2(value: f64) -> String {
    format!("{value:.2}")
}
