use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use twsec::config::Settings;
use twsec::pipeline::{build_calendar, refresh_year};
use twsec::source::JsonFileSource;
use twsec::store::JsonDirStore;

#[derive(Parser)]
#[command(name = "twsec")]
#[command(about = "Taiwan stock exchange trading calendar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a year and replace it in the output directory
    Build {
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
        year: i32,

        /// Holiday-schedule JSON as published by the exchange
        #[arg(long)]
        input: PathBuf,

        /// Overrides TWSEC_OUTPUT_DIR
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also print every day of the year
        #[arg(long, default_value_t = false)]
        print: bool,
    },

    /// Print the labelled days and the trading-day total without storing
    Show {
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=9999))]
        year: i32,

        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("loading TWSEC_* settings")?;

    match cli.cmd {
        Commands::Build {
            year,
            input,
            output,
            print,
        } => {
            let source = JsonFileSource::new(&input);
            let dir = output.unwrap_or_else(|| settings.output_dir.clone());
            let store = JsonDirStore::new(&dir);
            let summary = refresh_year(&source, &store, year, &settings)
                .with_context(|| format!("refreshing {year} from {}", input.display()))?;
            println!(
                "year={} total_trading_days={} -> {}",
                summary.year,
                summary.total_trading_days,
                store.path_for(year).display()
            );
            if print {
                let stored = store
                    .load_year(year)?
                    .with_context(|| format!("{} vanished after write", store.path_for(year).display()))?;
                for d in &stored.days {
                    println!("{}\t{}\t{}", d.date, d.trading_day_index, d.annotation);
                }
            }
        }
        Commands::Show { year, input } => {
            let source = JsonFileSource::new(&input);
            let cal = build_calendar(&source, year, &settings)
                .with_context(|| format!("building {year} from {}", input.display()))?;
            for d in cal.special_days() {
                let status = if d.is_trading_day() {
                    format!("#{}", d.trading_day_index)
                } else {
                    "closed".to_string()
                };
                println!("{}\t{:>6}\t{}", d.date, status, d.annotation);
            }
            println!("total trading days in {}: {}", year, cal.summary().total_trading_days);
        }
    }
    Ok(())
}
