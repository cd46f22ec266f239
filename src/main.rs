use anyhow::Result;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mftgrab::acquire::{self, AcquisitionReport, MftPlan};
use mftgrab::cli::{Cli, Commands, ProgressReporter, extract_options};
use mftgrab::devices::resolve_volume_path;
use mftgrab::types::{Completeness, format_bytes};
use mftgrab::{AcquireError, AcquireOptions};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), err);
            let code = err
                .downcast_ref::<AcquireError>()
                .map(AcquireError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn init_tracing(verbose: bool, debug: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Extract {
            volume,
            output,
            directory,
            chunk_size,
            mmap,
            overwrite,
            json,
        } => {
            let options = extract_options(&volume, output, directory, chunk_size, mmap, overwrite);
            run_extract(&options, json)
        }
        Commands::Info { volume, mmap, json } => {
            let options = AcquireOptions::new(resolve_volume_path(&volume), "").with_mmap(mmap);
            run_info(&options, json)
        }
    }
}

fn run_extract(options: &AcquireOptions, json: bool) -> Result<()> {
    let progress = (!json).then(|| ProgressReporter::for_extraction(0));
    let callback = |done: u64, total: u64| {
        if let Some(bar) = &progress {
            bar.update(done, total);
        }
    };

    let report = match acquire::acquire(options, Some(&callback)) {
        Ok(report) => report,
        Err(err) => {
            if let Some(bar) = &progress {
                bar.abandon();
            }
            return Err(err.into());
        }
    };

    if let Some(bar) = &progress {
        bar.finish("done!");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn run_info(options: &AcquireOptions, json: bool) -> Result<()> {
    let mut volume = acquire::open_volume(options)?;
    let plan = acquire::inspect(&mut *volume)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &MftPlan) {
    let boot = &plan.layout.boot;
    println!();
    println!("{}", style("Boot sector").cyan().bold());
    println!("Bytes per sector:    {}", boot.bytes_per_sector);
    println!("Sectors per cluster: {}", boot.sectors_per_cluster);
    println!("$MFT start cluster:  {}", boot.mft_start_cluster);
    println!("$MFT byte offset:    {:#x}", boot.mft_offset());
    println!("File record size:    {} bytes", boot.record_size);

    println!();
    println!("{}", style("$MFT self-record").cyan().bold());
    println!(
        "Logical size:        {} ({})",
        plan.layout.logical_size(),
        format_bytes(plan.layout.logical_size())
    );
    println!("Allocated size:      {}", plan.layout.allocated_size());
    println!("Fixup sectors:       {}", plan.layout.fixup_sectors);
    println!("Run-list:            {}", plan.layout.run_list_hex);

    println!();
    println!(
        "{:<6} {:>14} {:>14} {:>16}",
        style("RUN").bold(),
        style("RELATIVE").bold(),
        style("LCN").bold(),
        style("BYTES").bold()
    );
    println!("{}", "-".repeat(53));
    for (i, extent) in plan.layout.extents.iter().enumerate() {
        println!(
            "{:<6} {:>+14} {:>14} {:>16}",
            i, extent.relative_cluster_offset, extent.lcn, extent.length_bytes
        );
    }

    println!();
    println!("{}", style("Planned ranges").cyan().bold());
    for range in &plan.ranges {
        println!("  {}", range);
    }
    println!(
        "Total: {} of {} logical bytes",
        plan.planned_bytes(),
        plan.layout.logical_size()
    );
}

fn print_report(report: &AcquisitionReport) {
    println!();
    match report.completeness {
        Completeness::Complete => println!(
            "Extracted {} bytes, equivalent to logical size of $MFT",
            style(report.summary.bytes_extracted).green()
        ),
        Completeness::Partial { shortfall } => println!(
            "Extracted {} bytes, less than logical size of $MFT ({} bytes, {} short)",
            style(report.summary.bytes_extracted).yellow(),
            report.summary.logical_size,
            shortfall
        ),
    }
    println!("SHA-256: {}", report.summary.sha256);
    println!(
        "{} {} stored in {}",
        style("$MFT from").green().bold(),
        report.device.display(),
        report.output.display()
    );
}
