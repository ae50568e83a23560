use std::path::Path;

use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Modify, Style, Width};

use crate::error::{MergeError, TableError};

/// Cell values read as missing, the default NA spellings of
/// the dataframe readers that produce the result tables
pub const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

/*
=====================
Column-named table
=====================
*/

/// Text table with named columns
///
/// Result tables are not required to share a schema, so
/// cells are held as text in header order and typed only
/// where a step needs a value (sample numbers, abundance).
/// Absent cells are empty strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }
    /// Parse a delimited table with a header line
    ///
    /// Records with fewer fields than the header are padded
    /// with empty cells, records with more fields fail the
    /// whole file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path.as_ref())?;

        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(TableError::MissingHeader);
        }

        let mut table = Table::new(unique_header(header.iter()));
        let width = table.columns.len();

        for result in reader.records() {
            let record = result?;
            if record.len() > width {
                return Err(TableError::RecordLength {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row: Vec<String> = record.iter().map(String::from).collect();
            row.resize(width, String::new());
            table.rows.push(row);
        }

        Ok(table)
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
    /// Cell values of a column in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
    /// Replace or append a column, values must match the row count
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }
    /// Concatenate another table below this one
    ///
    /// The column set becomes the union of both headers in order
    /// of first appearance, cells absent from either side are empty.
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|col| match self.column_index(col) {
                Some(idx) => idx,
                None => {
                    self.columns.push(col.clone());
                    for row in self.rows.iter_mut() {
                        row.push(String::new());
                    }
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for other_row in other.rows {
            let mut row = vec![String::new(); width];
            for (value, &idx) in other_row.into_iter().zip(&mapping) {
                row[idx] = value;
            }
            self.rows.push(row);
        }
    }
    /// Reorder rows by a key with a stable sort
    pub fn sort_rows_by_keys<K: Ord + Clone>(&mut self, keys: &[K]) {
        let mut keyed: Vec<(K, Vec<String>)> = keys
            .iter()
            .cloned()
            .zip(std::mem::take(&mut self.rows))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
    }
    /// Columns whose non-missing cells all hold finite numbers
    pub fn numeric_columns(&self) -> Vec<bool> {
        (0..self.columns.len())
            .map(|idx| {
                let mut values = self.rows.iter().map(|row| row[idx].as_str()).filter(|v| !is_missing(v)).peekable();
                values.peek().is_some()
                    && values.all(|v| v.parse::<f64>().map(f64::is_finite).unwrap_or(false))
            })
            .collect()
    }
    pub fn write_delimited<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<(), MergeError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_path(path.as_ref())?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(())
    }
    /// Console rendering with wrapped cells
    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }

        let mut table = builder.build();
        table
            .with(Modify::new(Columns::new(..)).with(Width::wrap(32).keep_words()))
            .with(Style::modern());

        table.to_string()
    }
    pub fn print_table(&self) {
        eprintln!("{}", self.render());
    }
}

/// Header names with duplicates suffixed by their repeat count
fn unique_header<'a>(fields: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for field in fields {
        let mut name = field.to_string();
        let mut n = 1;
        while columns.contains(&name) {
            name = format!("{}.{}", field, n);
            n += 1;
        }
        columns.push(name);
    }
    columns
}
