use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "photobooth",
    version,
    about = "Halloween photobooth - turns each new photo into a video, exactly once",
    after_help = "All commands operate on the current directory: photos are read from ./input, \
                  videos land in ./output, and processing history lives in \
                  .photobooth/processed-files.json. Set RUST_LOG=debug for verbose logs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the working folders and a default .photobooth/config.toml
    Init,

    /// Watch the input folder and process new photos until interrupted.
    ///
    /// Checks immediately, then every `poll_interval_secs`. Ctrl-C lets the
    /// photo currently in the pipeline finish before exiting.
    Watch {
        /// Override the poll interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single poll tick and print what happened
    Tick,

    /// List photos the next tick would process
    Pending,

    /// Show watcher and ledger status
    Status,

    /// List published videos (or the screensaver loop)
    Videos {
        /// List the screensaver folder instead of output
        #[arg(long)]
        screensaver: bool,
    },

    /// Dump the processing ledger
    Records {
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Clear all processing history so every photo is treated as new
    Reset,

    /// Drop ledger entries older than N days
    Prune {
        /// Age threshold in days (default: watcher.prune_days)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Delete a video from output or screensaver
    Delete {
        /// Video file name
        name: String,
    },
}
