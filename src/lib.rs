//! Virmerge: batch reports from per-sample viral abundance tables
//!
//! Result tables of a sequencing batch are concatenated into a long
//! table ordered by sample number, reduced to one taxonomy record per
//! reference accession and pivoted into an accession by sample
//! abundance matrix. Both tables are written as worksheets of a single
//! spreadsheet, with a delimited backup of the long table if the
//! spreadsheet cannot be written.

pub mod error;
pub mod export;
pub mod merge;
pub mod sample;
pub mod table;
pub mod terminal;
pub mod utils;

pub use merge::{MergeConfig, MergeReport, ResultMerger};
