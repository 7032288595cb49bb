use clap::Parser;
use std::path::PathBuf;

use fdm_demux::pipeline;
use fdm_demux::report::LogReporter;

/// Separate two voice channels from a frequency-division multiplexed recording
/// (8 kHz and 16 kHz carriers)
#[derive(Parser, Debug)]
#[command(name = "fdm-demux")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input WAV file holding the FDM composite (channel 0 is used)
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// Output directory for voice1.wav and voice2.wav
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Append the local time to output file names
    #[arg(long)]
    timestamp: bool,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(&args.output_dir)?;

    log::info!("Processing file: {}", args.input_file.display());
    let summary = pipeline::process_file(
        &args.input_file,
        &args.output_dir,
        args.timestamp,
        &mut LogReporter,
    )?;

    println!("Sampling rate: {} Hz", summary.sample_rate);
    println!("Signal length: {} samples", summary.samples);
    println!("Duration: {:.2} seconds", summary.duration_secs);
    let names: Vec<String> = summary
        .outputs
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    println!("Voice signals saved as {}", names.join(" and "));

    Ok(())
}
