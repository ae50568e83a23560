use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    /// Represents the case where no input file contributed any rows
    #[error("no valid data found in input files")]
    EmptyInput,
    /// Represents a failure of the spreadsheet writer
    #[error("failed to write spreadsheet: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
    /// Represents a table with more columns than a worksheet can hold
    #[error("table has too many columns for a worksheet: {0}")]
    ColumnLimit(usize),
    /// Represents a table with more rows than a worksheet can hold
    #[error("table has too many rows for a worksheet: {0}")]
    RowLimit(usize),
    /// Represents a failure to read the list of input paths
    #[error("failed to read input list: {0}")]
    InputList(PathBuf),
    /// Represents all other cases of `csv::Error`.
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Errors raised while parsing a single result table,
/// these never abort a merge and are reported as skipped inputs
#[derive(Error, Debug)]
pub enum TableError {
    /// Indicates failure to open, read or parse a delimited record
    #[error("failed to parse record: {0}")]
    CsvRecord(#[from] csv::Error),
    /// Indicates a file without a header line
    #[error("no columns to parse from file")]
    MissingHeader,
    /// Indicates a record with more fields than the header
    #[error("expected {expected} fields in line {line}, saw {found}")]
    RecordLength { line: u64, expected: usize, found: usize },
}
