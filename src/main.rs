use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, Args};

use simplelog::{info, warn, error, LevelFilter, TerminalMode, ColorChoice, Config, TermLogger};

use iws_rs::convert::{self, duration, ConvertOptions, Method};
use iws_rs::constants::DEFAULT_MAX_SEGMENT_LENGTH;
use iws_rs::postprocess::{self, Layout, OutputKind, ProcessOptions};

const BANNER: [&str; 6] = [
  r" ___ __        __ ____        ____  ____  ",
  r"|_ _|\ \      / // ___|      |  _ \/ ___| ",
  r" | |  \ \ /\ / / \___ \ _____| |_) \___ \ ",
  r" | |   \ V  V /   ___) |_____|  _ < ___) |",
  r"|___|   \_/\_/   |____/      |_| \_\____/ ",
  r"                                          "
];

#[derive(Parser, Debug)]
#[command(
  version = "0.1.0",
  about = "Converts pressure-dependent EPANET networks into intermittent water supply models"
)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
  /// Print debug output
  #[arg(short, long, global = true)]
  verbose: bool,
  /// Suppress all output except for errors
  #[arg(short, long, global = true)]
  quiet: bool,
}

#[derive(Args, Debug)]
struct PressureArgs {
  /// Minimum pressure below which consumers receive nothing (m)
  #[arg(long, default_value_t = 0.0)]
  hmin: f64,
  /// Desired pressure at which consumers receive their full demand (m)
  #[arg(long, default_value_t = 10.0)]
  hdes: f64,
  /// Maximum conduit length in SWMM conversions (m)
  #[arg(long = "max-length", default_value_t = DEFAULT_MAX_SEGMENT_LENGTH)]
  max_length: f64,
}

impl PressureArgs {
  fn options(&self) -> ConvertOptions {
    ConvertOptions { hmin: self.hmin, hdes: self.hdes, max_segment_length: self.max_length }
  }
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Convert a PDA network with one method
  Convert {
    /// CV-Tank, CV-Res, FCV-EM, FCV-Res, PSV-Tank, Outlet-Outfall or Outlet-Storage
    method: Method,
    /// Input file (EPANET .inp format)
    input_file: PathBuf,
    #[command(flatten)]
    pressure: PressureArgs,
  },
  /// Convert a PDA network with all seven methods
  ConvertAll {
    /// Input file (EPANET .inp format)
    input_file: PathBuf,
    #[command(flatten)]
    pressure: PressureArgs,
  },
  /// Rescale a network's demands to a new supply duration
  Duration {
    /// Input file (EPANET .inp format)
    input_file: PathBuf,
    hours: u32,
    minutes: u32,
  },
  /// Compute satisfaction or pressure statistics from simulation results
  Process {
    /// PDA or the conversion method the model was produced with
    layout: Layout,
    /// The simulated model (.inp)
    network: PathBuf,
    /// Simulation results (.json or .msgpack/.mpk)
    results: PathBuf,
    /// S for satisfaction ratio, P for pressure
    #[arg(short, long, default_value = "S")]
    output: OutputKind,
    #[arg(long, default_value_t = 10)]
    low: u32,
    #[arg(long, default_value_t = 90)]
    high: u32,
    /// Do not write CSV files
    #[arg(long)]
    no_save: bool,
  },
}

fn main() -> Result<(), String> {
  let cli = Cli::parse();

  let log_level = if cli.quiet {
    LevelFilter::Error
  } else if cli.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };

  TermLogger::init(
    log_level,
    Config::default(),
    TerminalMode::Mixed,
    ColorChoice::Auto,
  ).map_err(|e| format!("Failed to initialize logger: {}", e))?;

  if !cli.quiet {
    println!("{}", BANNER.join("\n"));
  }

  let start_time = Instant::now();
  let result = match cli.command {
    Commands::Convert { method, input_file, pressure } => {
      info!("Selected file: {}", input_file.display());
      convert::convert(&input_file, method, &pressure.options())
        .map(|conversion| {
          if let Some(table) = conversion.demand_table {
            info!("Demands written to {}", table.display());
          }
        })
        .map_err(|e| e.to_string())
    }
    Commands::ConvertAll { input_file, pressure } => convert_all(&input_file, &pressure.options()),
    Commands::Duration { input_file, hours, minutes } => {
      duration::change_duration(&input_file, hours, minutes)
        .map(|_| ())
        .map_err(|e| e.to_string())
    }
    Commands::Process { layout, network, results, output, low, high, no_save } => {
      let options = ProcessOptions { output, low_percentile: low, high_percentile: high, save: !no_save };
      postprocess::process(layout, &network, &results, &options)
        .map(|processed| {
          if let Some(last) = processed.series.times.len().checked_sub(1) {
            info!(
              "{} consumers at {} s: mean {:.2}, median {:.2}, {}th {:.2}, {}th {:.2}",
              processed.series.consumers.len(), processed.series.times[last],
              processed.statistics.mean[last], processed.statistics.median[last],
              low, processed.statistics.low[last], high, processed.statistics.high[last]
            );
          }
        })
        .map_err(|e| e.to_string())
    }
  };

  match &result {
    Ok(()) => info!("Finished in {:?}", start_time.elapsed()),
    Err(e) => error!("{}", e),
  }
  result
}

/// Run every method, reporting each failure without stopping the others
fn convert_all(input_file: &Path, options: &ConvertOptions) -> Result<(), String> {
  let mut failed = 0;
  for (method, result) in convert::convert_all(input_file, options) {
    match result {
      Ok(conversion) => info!("{:>15}: {}", method.label(), conversion.output.display()),
      Err(e) => {
        warn!("{:>15}: {}", method.label(), e);
        failed += 1;
      }
    }
  }
  if failed > 0 {
    Err(format!("{} of {} conversions failed", failed, Method::ALL.len()))
  } else {
    Ok(())
  }
}
