//! Selene command-line tool.
//!
//! Thin wrapper around the selene-store library that:
//! 1. Parses command-line arguments and environment
//! 2. Initializes logging
//! 3. Loads the optional JSON configuration
//! 4. Runs one subcommand
//!
//! ```text
//! selene build moon.csv moon.bin
//! selene info moon.bin
//! selene lookup moon.bin 1060 --interpolate
//! selene next-event moon.bin 0 1
//! selene convert --unix 1700000000
//! ```

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use selene_formats::{EphemerisBuilder, read_table};
use selene_store::{
    EphemerisStore, Event, PagedFileStore, RecordSource, ResidentStore, StoreConfig,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SECONDS_PER_DAY: u32 = 86_400;

/// Build and query Selene ephemeris files
#[derive(Debug, Parser)]
#[command(name = "selene", about = "Build and query Selene ephemeris files", version)]
struct Cli {
    /// JSON store configuration
    #[arg(long, global = true, env = "SELENE_CONFIG")]
    config: Option<PathBuf>,

    /// Records scanned on each side of a missed direct offset
    #[arg(long, global = true, env = "SELENE_SEARCH_RADIUS")]
    search_radius: Option<u32>,

    /// Ignore the sparse index even when the file carries one
    #[arg(long, global = true, env = "SELENE_NO_INDEX")]
    ignore_index: bool,

    /// Seconds added on top of the epoch offset when translating wall-clock time
    #[arg(long, global = true, env = "SELENE_EPOCH_CORRECTION", allow_hyphen_values = true)]
    epoch_correction: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a generator table into a binary ephemeris file
    Build {
        /// Comma-separated input table
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Omit the trailing sparse index
        #[arg(long)]
        no_index: bool,
        /// Override the time step estimated from the first two records
        #[arg(long)]
        time_step: Option<u32>,
    },

    /// Print the header of an ephemeris file
    Info {
        /// Ephemeris file
        file: PathBuf,
    },

    /// Look up the record at a store timestamp
    Lookup {
        /// Ephemeris file
        file: PathBuf,
        /// Store timestamp (seconds since the store epoch)
        timestamp: u32,
        /// Interpolate between samples when no exact record exists
        #[arg(long)]
        interpolate: bool,
        /// Read records on demand instead of loading the whole file
        #[arg(long)]
        paged: bool,
    },

    /// Find the next record carrying an event code
    NextEvent {
        /// Ephemeris file
        file: PathBuf,
        /// Store timestamp to search from
        from: u32,
        /// Event or distance-event code
        code: u8,
        /// Read records on demand instead of loading the whole file
        #[arg(long)]
        paged: bool,
    },

    /// Translate between Unix time and store timestamps
    #[command(group(ArgGroup::new("direction").required(true)))]
    Convert {
        /// Unix seconds to translate into a store timestamp
        #[arg(long, group = "direction", allow_hyphen_values = true)]
        unix: Option<i64>,
        /// Store timestamp to translate into Unix time
        #[arg(long, group = "direction")]
        epoch: Option<u32>,
    },
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => StoreConfig::default(),
        };

        if let Some(radius) = self.search_radius {
            config = config.with_search_radius(radius);
        }
        if self.ignore_index {
            config = config.with_index(false);
        }
        if let Some(seconds) = self.epoch_correction {
            let epoch = config.epoch.with_correction(seconds);
            config = config.with_epoch(epoch);
            config.epoch.warn_if_corrected();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.store_config()?;

    match cli.command {
        Command::Build {
            input,
            output,
            no_index,
            time_step,
        } => build(&input, &output, !no_index, time_step, &config),
        Command::Info { file } => {
            let store = PagedFileStore::open_with_config(&file, &config)
                .with_context(|| format!("opening {}", file.display()))?;
            print_info(&store, &config);
            Ok(())
        }
        Command::Lookup {
            file,
            timestamp,
            interpolate,
            paged,
        } => {
            if paged {
                let mut store = PagedFileStore::open_with_config(&file, &config)
                    .with_context(|| format!("opening {}", file.display()))?;
                lookup(&mut store, timestamp, interpolate, &config)
            } else {
                let mut store = ResidentStore::open_with_config(&file, &config)
                    .with_context(|| format!("opening {}", file.display()))?;
                lookup(&mut store, timestamp, interpolate, &config)
            }
        }
        Command::NextEvent {
            file,
            from,
            code,
            paged,
        } => {
            if paged {
                let mut store = PagedFileStore::open_with_config(&file, &config)
                    .with_context(|| format!("opening {}", file.display()))?;
                next_event(&mut store, from, code)
            } else {
                let mut store = ResidentStore::open_with_config(&file, &config)
                    .with_context(|| format!("opening {}", file.display()))?;
                next_event(&mut store, from, code)
            }
        }
        Command::Convert { unix, epoch } => {
            if let Some(unix) = unix {
                match config.epoch.from_unix(unix) {
                    Some(store_time) => println!("{store_time}"),
                    None => anyhow::bail!("Unix time {unix} is outside the store timestamp range"),
                }
            } else if let Some(store_time) = epoch {
                let unix = config.epoch.to_unix(store_time);
                match config.epoch.to_datetime(store_time) {
                    Some(time) => println!("{unix} ({})", time.to_rfc3339()),
                    None => println!("{unix}"),
                }
            }
            Ok(())
        }
    }
}

fn build(
    input: &Path,
    output: &Path,
    with_index: bool,
    time_step: Option<u32>,
    config: &StoreConfig,
) -> Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let table = read_table(BufReader::new(file))
        .with_context(|| format!("reading {}", input.display()))?;
    if table.skipped > 0 {
        warn!("Skipped {} unreadable rows", table.skipped);
    }
    info!("Parsed {} records from {}", table.records.len(), input.display());

    let mut builder = EphemerisBuilder::new()
        .with_index(with_index)
        .extend(table.records);
    if let Some(seconds) = time_step {
        builder = builder.time_step(seconds);
    }
    let stats = builder
        .build_file(output)
        .with_context(|| format!("building {}", output.display()))?;

    println!("Records:     {}", stats.record_count);
    println!("Index:       {} entries", stats.index_count);
    println!("Time step:   {}s", stats.time_step);
    println!("Range:       {} .. {}", stats.start_timestamp, stats.end_timestamp);
    println!("Bytes:       {}", stats.bytes_written);

    // Read the file back the way a device would
    let mut store = ResidentStore::open_with_config(output, config)
        .with_context(|| format!("reopening {}", output.display()))?;
    let start = store.start_time()?;
    let end = store.end_time()?;
    let probes = [
        ("start", start),
        ("+1 day", start.saturating_add(SECONDS_PER_DAY).min(end)),
        ("middle", start + end.saturating_sub(start) / 2),
        ("end", end),
    ];
    for (label, timestamp) in probes {
        match store.interpolate(timestamp)? {
            Some(record) => println!("{label:>8}: {record}"),
            None => println!("{label:>8}: no data at {timestamp}"),
        }
    }
    Ok(())
}

fn print_info<S: RecordSource>(store: &EphemerisStore<S>, config: &StoreConfig) {
    let Ok(header) = store.header() else {
        return;
    };
    let has_index = store.has_index().unwrap_or(false);

    println!("Magic:       0x{:08X}", header.magic);
    println!("Version:     {}", header.version);
    println!("Records:     {}", header.record_count);
    println!("Record size: {} bytes", header.record_size);
    println!("Time step:   {}s", header.time_step_seconds);
    println!("Index:       {}", if has_index { "present" } else { "absent" });
    for (label, timestamp) in [
        ("Start:", header.start_timestamp),
        ("End:", header.end_timestamp),
    ] {
        match config.epoch.to_datetime(timestamp) {
            Some(time) => println!("{label:<12} {timestamp} ({})", time.to_rfc3339()),
            None => println!("{label:<12} {timestamp}"),
        }
    }
}

fn lookup<S: RecordSource>(
    store: &mut EphemerisStore<S>,
    timestamp: u32,
    interpolate: bool,
    config: &StoreConfig,
) -> Result<()> {
    let record = if interpolate {
        store.interpolate(timestamp)?
    } else {
        store.find_exact(timestamp)?
    };

    match record {
        Some(record) => {
            println!("{record}");
            if let Some(time) = config.epoch.to_datetime(record.timestamp) {
                println!("UTC: {}", time.to_rfc3339());
            }
        }
        None => println!("No record at {timestamp}"),
    }
    Ok(())
}

fn next_event<S: RecordSource>(store: &mut EphemerisStore<S>, from: u32, code: u8) -> Result<()> {
    match store.next_event(from, code)? {
        Some(record) => println!("{record}"),
        None => println!(
            "No {} event at or after {from}",
            Event::from_code(code).map_or("matching", Event::name)
        ),
    }
    Ok(())
}
