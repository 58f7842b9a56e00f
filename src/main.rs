use std::fs::File;
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use iptracker::{replay, ReplayStats, TopKTracker, DEFAULT_CAPACITY};

/// Count requests per client address in an access log and print the busiest ones
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Access log to read; stdin when omitted
    file: Option<PathBuf>,

    /// Number of addresses to rank
    #[arg(short = 'k', long, default_value_t = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))]
    capacity: NonZeroUsize,

    /// Whitespace-separated field holding the address (0-based)
    #[arg(short, long, default_value_t = 0)]
    field: usize,

    /// Print at most this many ranked addresses
    #[arg(short, long)]
    limit: Option<usize>,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let tracker = TopKTracker::with_capacity(args.capacity);

    let stats = match &args.file {
        Some(path) => {
            let file = File::open(path)?;
            // Empty files cannot be mapped
            if file.metadata()?.len() == 0 {
                ReplayStats::default()
            } else {
                // SAFETY: the log is only read, and only while `file` stays open
                let mmap = unsafe { Mmap::map(&file)? };
                replay(&mmap, args.field, &tracker)
            }
        }
        None => {
            let mut input = Vec::new();
            io::stdin().lock().read_to_end(&mut input)?;
            replay(&input, args.field, &tracker)
        }
    };

    if stats.skipped > 0 {
        eprintln!("skipped {} lines without an address", stats.skipped);
    }

    let limit = args.limit.unwrap_or(usize::MAX);
    for entry in tracker.top().into_iter().take(limit) {
        println!("{} {}", entry.key, entry.count);
    }

    Ok(())
}
