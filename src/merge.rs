use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::export::{backup_path, write_backup, write_workbook};
use crate::sample::{sample_numbers, sample_order};
use crate::table::{is_missing, Table};
use crate::terminal::MergeArgs;

/*
===================
Merge configuration
===================
*/

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Sample identifier column, orders and pivots the tables
    pub sample_column: String,
    /// Reference accession column, deduplicates and indexes the tables
    pub accession_column: String,
    /// Normalized abundance column, values of the abundance matrix
    pub abundance_column: String,
    /// Derived sample number column added to the long table
    pub sample_number_column: String,
    /// Taxonomy columns kept per accession, besides the accession itself
    pub taxonomy_columns: Vec<String>,
    pub merge_sheet: String,
    pub stack_sheet: String,
    pub input_delimiter: u8,
    pub backup_delimiter: u8,
}
impl MergeConfig {
    pub fn from_merge_args(args: &MergeArgs) -> Self {
        Self {
            sample_column: args.sample_column.clone(),
            accession_column: args.accession_column.clone(),
            abundance_column: args.abundance_column.clone(),
            ..Default::default()
        }
    }
    /// Candidate columns of the deduplicated taxonomy table
    pub fn taxonomy_candidates(&self) -> Vec<&str> {
        std::iter::once(self.accession_column.as_str())
            .chain(self.taxonomy_columns.iter().map(String::as_str))
            .collect()
    }
}
impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            sample_column: String::from("sample_ID"),
            accession_column: String::from("accession"),
            abundance_column: String::from("RPKMF"),
            sample_number_column: String::from("sample_num"),
            taxonomy_columns: [
                "sequence_name", "taxid", "kingdom", "phylum", "class",
                "order", "family", "genus", "species",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            merge_sheet: String::from("merge_table"),
            stack_sheet: String::from("stack_table"),
            input_delimiter: b'\t',
            backup_delimiter: b',',
        }
    }
}

/*
=======================
Step outcomes and report
=======================
*/

/// Merge steps that degrade instead of failing the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    SampleOrder,
    Taxonomy,
    AbundanceMatrix,
    SampleColumns,
    Spreadsheet,
}
impl fmt::Display for MergeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStep::SampleOrder => write!(f, "sample order"),
            MergeStep::Taxonomy => write!(f, "taxonomy table"),
            MergeStep::AbundanceMatrix => write!(f, "abundance matrix"),
            MergeStep::SampleColumns => write!(f, "sample column order"),
            MergeStep::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// Input table that contributed no rows
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub reason: String,
}

/// Step that was skipped or fell back to reduced output
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub step: MergeStep,
    pub reason: String,
}
impl Degradation {
    pub fn new(step: MergeStep, reason: impl Into<String>) -> Self {
        Self { step, reason: reason.into() }
    }
    fn missing_column(step: MergeStep, column: &str) -> Self {
        Self::new(step, format!("column '{}' not found", column))
    }
}
impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.reason)
    }
}

/// Where the merged output was written
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Spreadsheet(PathBuf),
    Backup { path: PathBuf, reason: String },
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub export: Export,
    /// Number of input tables given to the merge
    pub inputs: usize,
    pub skipped: Vec<SkippedInput>,
    pub degraded: Vec<Degradation>,
    pub merge_table: Table,
    pub stack_table: Table,
}
impl MergeReport {
    /// Rows in the sorted long table
    pub fn rows(&self) -> usize {
        self.stack_table.len()
    }
    pub fn is_degraded(&self, step: MergeStep) -> bool {
        self.degraded.iter().any(|d| d.step == step)
    }
}

/*
================
Abundance matrix
================
*/

/// Accession by sample matrix of abundance values
///
/// Accessions are in lexical order, samples in sample number
/// order unless the column order fell back to lexical order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbundanceMatrix {
    pub samples: Vec<String>,
    pub abundance: IndexMap<String, Vec<f64>>,
}
impl AbundanceMatrix {
    pub fn get(&self, accession: &str, sample: &str) -> Option<f64> {
        let idx = self.samples.iter().position(|s| s == sample)?;
        self.abundance.get(accession).map(|values| values[idx])
    }
}

/*
=============
Result merger
=============
*/

#[derive(Debug, Clone, Default)]
pub struct ResultMerger {
    pub config: MergeConfig,
}

impl ResultMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }
    /// Merge result tables into the two-sheet output
    ///
    /// Only an input set without any rows, or a failure to write the
    /// backup table after the spreadsheet failed, is an error; all other
    /// failures are collected in the report.
    pub fn run(&self, inputs: &[PathBuf], output: &Path) -> Result<MergeReport, MergeError> {
        let (mut stack_table, skipped) = self.load(inputs)?;

        let mut degraded = Vec::new();

        if let Err(degradation) = self.derive_sample_order(&mut stack_table) {
            log::warn!("Could not sort by sample number: {}", degradation.reason);
            degraded.push(degradation);
        }

        let merge_table = match self.deduplicate_taxonomy(&stack_table) {
            Ok(taxonomy) => match self.build_wide_matrix(&stack_table) {
                Ok((matrix, column_order)) => {
                    if let Some(degradation) = column_order {
                        log::warn!("Could not order sample columns: {}", degradation.reason);
                        degraded.push(degradation);
                    }
                    self.join(&taxonomy, Some(&matrix))
                }
                Err(degradation) => {
                    log::warn!("Could not create wide format table: {}", degradation.reason);
                    degraded.push(degradation);
                    taxonomy
                }
            },
            Err(degradation) => {
                log::warn!("Could not create taxonomy table: {}", degradation.reason);
                degraded.push(degradation);
                stack_table.clone()
            }
        };

        let export = self.export(&merge_table, &stack_table, output)?;

        match &export {
            Export::Spreadsheet(path) => {
                log::info!("Results saved to: {}", path.display());
                log::info!("Total samples processed: {}", inputs.len());
                log::info!("Total rows in combined data: {}", stack_table.len());
            }
            Export::Backup { path, reason } => {
                degraded.push(Degradation::new(MergeStep::Spreadsheet, reason.clone()));
                log::info!("Saved backup table to: {}", path.display());
            }
        }

        Ok(MergeReport {
            export,
            inputs: inputs.len(),
            skipped,
            degraded,
            merge_table,
            stack_table,
        })
    }
    /// Read and concatenate result tables in input order
    ///
    /// Tables that fail to parse are skipped with a warning.
    pub fn load(&self, inputs: &[PathBuf]) -> Result<(Table, Vec<SkippedInput>), MergeError> {
        let mut stack_table: Option<Table> = None;
        let mut skipped = Vec::new();

        for (i, path) in inputs.iter().enumerate() {
            log::info!("Processing file {}/{}: {}", i + 1, inputs.len(), path.display());

            match Table::from_path(path, self.config.input_delimiter) {
                Ok(table) => match stack_table.as_mut() {
                    None => stack_table = Some(table),
                    Some(stack) => stack.append(table),
                },
                Err(err) => {
                    log::warn!("Could not process {}: {}", path.display(), err);
                    skipped.push(SkippedInput {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        match stack_table {
            Some(table) if !table.is_empty() => Ok((table, skipped)),
            _ => {
                log::warn!("No valid data found in input files");
                Err(MergeError::EmptyInput)
            }
        }
    }
    /// Add the sample number column and sort rows by it
    ///
    /// The sort is stable, rows of the same sample number keep
    /// their load order. Without a sample column the table is
    /// left untouched.
    pub fn derive_sample_order(&self, stack_table: &mut Table) -> Result<(), Degradation> {
        let sample_ids = stack_table
            .column_values(&self.config.sample_column)
            .ok_or_else(|| Degradation::missing_column(MergeStep::SampleOrder, &self.config.sample_column))?;

        let keys = sample_numbers(&sample_ids);

        stack_table.set_column(
            &self.config.sample_number_column,
            keys.iter().map(|k| k.to_string()).collect(),
        );
        stack_table.sort_rows_by_keys(&keys);

        Ok(())
    }
    /// First-seen taxonomy columns for each distinct accession
    pub fn deduplicate_taxonomy(&self, stack_table: &Table) -> Result<Table, Degradation> {
        let accession_idx = stack_table
            .column_index(&self.config.accession_column)
            .ok_or_else(|| Degradation::missing_column(MergeStep::Taxonomy, &self.config.accession_column))?;

        let selected: Vec<(usize, &str)> = self
            .config
            .taxonomy_candidates()
            .into_iter()
            .filter_map(|col| stack_table.column_index(col).map(|idx| (idx, col)))
            .collect();

        let mut taxonomy = Table::new(selected.iter().map(|(_, col)| col.to_string()).collect());
        let mut seen: HashSet<&str> = HashSet::new();

        for row in &stack_table.rows {
            if seen.insert(row[accession_idx].as_str()) {
                taxonomy
                    .rows
                    .push(selected.iter().map(|(idx, _)| row[*idx].clone()).collect());
            }
        }

        Ok(taxonomy)
    }
    /// Pivot abundance values into an accession by sample matrix
    ///
    /// Missing accession and sample combinations are zero, repeated
    /// combinations are averaged and missing abundance cells ignored.
    /// If the samples in the matrix differ from the ordered sample
    /// set, the columns stay in lexical order and the fallback is
    /// returned alongside the matrix.
    pub fn build_wide_matrix(
        &self,
        stack_table: &Table,
    ) -> Result<(AbundanceMatrix, Option<Degradation>), Degradation> {
        let column = |name: &str| {
            stack_table
                .column_index(name)
                .ok_or_else(|| Degradation::missing_column(MergeStep::AbundanceMatrix, name))
        };
        let accession_idx = column(self.config.accession_column.as_str())?;
        let sample_idx = column(self.config.sample_column.as_str())?;
        let abundance_idx = column(self.config.abundance_column.as_str())?;

        let sample_ids: Vec<&str> = stack_table.rows.iter().map(|row| row[sample_idx].as_str()).collect();
        let ordered_samples = sample_order(&sample_ids);

        let mut cells: BTreeMap<&str, BTreeMap<&str, (f64, usize)>> = BTreeMap::new();
        let mut native_samples: BTreeSet<&str> = BTreeSet::new();

        for row in &stack_table.rows {
            let (accession, sample, value) = (
                row[accession_idx].as_str(),
                row[sample_idx].as_str(),
                row[abundance_idx].as_str(),
            );
            if is_missing(accession) || is_missing(sample) || is_missing(value) {
                continue;
            }
            let value: f64 = value.parse().map_err(|_| {
                Degradation::new(
                    MergeStep::AbundanceMatrix,
                    format!(
                        "non-numeric value '{}' in column '{}' for accession '{}' in sample '{}'",
                        value, self.config.abundance_column, accession, sample
                    ),
                )
            })?;
            if value.is_nan() {
                continue;
            }

            let cell = cells.entry(accession).or_default().entry(sample).or_insert((0.0, 0));
            cell.0 += value;
            cell.1 += 1;
            native_samples.insert(sample);
        }

        let matches_order = ordered_samples.len() == native_samples.len()
            && ordered_samples.iter().all(|s| native_samples.contains(s.as_str()));

        let (samples, column_order) = if matches_order {
            (ordered_samples, None)
        } else {
            let missing = ordered_samples
                .iter()
                .filter(|s| !native_samples.contains(s.as_str()))
                .join(", ");
            (
                native_samples.iter().map(|s| s.to_string()).collect(),
                Some(Degradation::new(
                    MergeStep::SampleColumns,
                    format!("samples without abundance values: {}", missing),
                )),
            )
        };

        let abundance = cells
            .into_iter()
            .map(|(accession, by_sample)| {
                let values = samples
                    .iter()
                    .map(|sample| match by_sample.get(sample.as_str()) {
                        Some((sum, n)) => sum / *n as f64,
                        None => 0.0,
                    })
                    .collect();
                (accession.to_string(), values)
            })
            .collect();

        Ok((AbundanceMatrix { samples, abundance }, column_order))
    }
    /// Left join of the taxonomy table with the abundance matrix
    ///
    /// Every taxonomy row is kept in order; accessions absent from
    /// the matrix have empty abundance cells.
    pub fn join(&self, taxonomy: &Table, matrix: Option<&AbundanceMatrix>) -> Table {
        let matrix = match matrix {
            Some(matrix) => matrix,
            None => return taxonomy.clone(),
        };
        let accession_idx = match taxonomy.column_index(&self.config.accession_column) {
            Some(idx) => idx,
            None => return taxonomy.clone(),
        };

        let mut columns = taxonomy.columns.clone();
        columns.extend(matrix.samples.iter().cloned());

        let mut merge_table = Table::new(columns);
        for row in &taxonomy.rows {
            let mut merged = row.clone();
            match matrix.abundance.get(&row[accession_idx]) {
                Some(values) => merged.extend(values.iter().map(|v| v.to_string())),
                None => merged.extend(std::iter::repeat(String::new()).take(matrix.samples.len())),
            }
            merge_table.rows.push(merged);
        }

        merge_table
    }
    /// Write the merged and long tables as worksheets
    ///
    /// On failure of the spreadsheet the long table is written
    /// as delimited backup; failure of the backup is an error.
    pub fn export(&self, merge_table: &Table, stack_table: &Table, output: &Path) -> Result<Export, MergeError> {
        let sheets = [
            (self.config.merge_sheet.as_str(), merge_table),
            (self.config.stack_sheet.as_str(), stack_table),
        ];

        match write_workbook(output, &sheets) {
            Ok(()) => Ok(Export::Spreadsheet(output.to_path_buf())),
            Err(err) => {
                log::error!("Error saving spreadsheet {}: {}", output.display(), err);

                let path = backup_path(output);
                write_backup(stack_table, &path, self.config.backup_delimiter)?;

                Ok(Export::Backup { path, reason: err.to_string() })
            }
        }
    }
}
