use anyhow::Result;
use clap::Parser;

use virmerge::merge::{MergeConfig, ResultMerger};
use virmerge::terminal::{App, Commands};
use virmerge::utils::{init_logger, read_input_list};

/// Virmerge application
///
/// Run the application from arguments provided
/// by the command line interface
#[cfg(not(tarpaulin_include))]
fn main() -> Result<()> {
    let cli = App::parse();

    init_logger(cli.log_level);

    match &cli.command {
        Commands::Merge(args) => {
            let mut inputs = args.input.clone();
            if let Some(list) = &args.input_list {
                inputs.extend(read_input_list(list)?);
            }

            let merger = ResultMerger::new(MergeConfig::from_merge_args(args));
            let report = merger.run(&inputs, &args.output)?;

            if !report.skipped.is_empty() {
                log::warn!("Skipped {} of {} input files", report.skipped.len(), report.inputs);
            }
            for degradation in &report.degraded {
                log::warn!("Reduced output ({})", degradation);
            }

            if args.table {
                report.merge_table.print_table();
            }
        }
    }

    Ok(())
}
