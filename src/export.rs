use std::path::{Path, PathBuf};

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};

use crate::error::MergeError;
use crate::table::{is_missing, Table};

const MAX_WORKSHEET_ROWS: usize = 1_048_576;
const MAX_WORKSHEET_COLUMNS: usize = 16_384;

/// Path of the delimited backup written when the spreadsheet fails
///
/// A trailing `.xlsx` extension is replaced by `_backup.csv`, any
/// other file name has `_backup.csv` appended.
pub fn backup_path(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let is_xlsx = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);

    let backup_name = match (is_xlsx, output.file_stem()) {
        (true, Some(stem)) => format!("{}_backup.csv", stem.to_string_lossy()),
        _ => format!("{}_backup.csv", file_name),
    };

    output.with_file_name(backup_name)
}

/// Write tables as named worksheets of a single workbook
///
/// Row indices are not written; the first worksheet row holds
/// the column names. Missing values are left blank and columns
/// holding only numbers are written as numeric cells.
pub fn write_workbook(output: &Path, sheets: &[(&str, &Table)]) -> Result<(), MergeError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (name, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        write_worksheet(worksheet, table, &header_format)?;
    }

    workbook.save(output)?;

    Ok(())
}

fn write_worksheet(worksheet: &mut Worksheet, table: &Table, header_format: &Format) -> Result<(), MergeError> {
    if table.columns.len() > MAX_WORKSHEET_COLUMNS {
        return Err(MergeError::ColumnLimit(table.columns.len()));
    }
    if table.len() + 1 > MAX_WORKSHEET_ROWS {
        return Err(MergeError::RowLimit(table.len()));
    }

    let numeric = table.numeric_columns();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as ColNum, name, header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as RowNum;
        for (col, value) in row.iter().enumerate() {
            if is_missing(value) {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) if numeric[col] => {
                    worksheet.write_number(row_num, col as ColNum, number)?;
                }
                _ => {
                    worksheet.write_string(row_num, col as ColNum, value)?;
                }
            }
        }
    }

    Ok(())
}

/// Write the backup table as comma-delimited text
pub fn write_backup(table: &Table, path: &Path, delimiter: u8) -> Result<(), MergeError> {
    table.write_delimited(path, delimiter)
}
