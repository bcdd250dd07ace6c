//! CLI argument parsing
//!
//! Mirrors the external CLI surface: one of a fixed set of mutually
//! exclusive operations, plus a shared set of modifier flags that apply
//! regardless of which operation was chosen.

use clap::{Parser, Subcommand};
use rflasher_flash::programmer_names_short;
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "rflasher")]
#[command(author, version, about = "Flash chip programmer", long_about = None)]
pub struct Cli {
    /// Chip name to use, resolving probe ambiguity (--chip <name>)
    #[arg(long, global = true)]
    pub chip: Option<String>,

    /// Programmer to use: `name` or `name:key=value,...`
    #[arg(long, global = true, help = programmer_help())]
    pub programmer: Option<String>,

    /// Path to chip database directory (contains .ron files)
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// Text layout file (`start:end name` per line)
    #[arg(long, global = true)]
    pub layout: Option<PathBuf>,

    /// Region to include, `name` or `name:file` (repeatable)
    #[arg(long = "image", global = true)]
    pub images: Vec<String>,

    /// Proceed despite risk warnings
    #[arg(long, global = true)]
    pub force: bool,

    /// Skip verification after writing
    #[arg(long, global = true)]
    pub noverify: bool,

    /// Verify the whole chip rather than only the written regions
    #[arg(long, global = true)]
    pub noverify_all: bool,

    /// Use a faster, less thorough verify strategy
    #[arg(long, global = true)]
    pub fast_verify: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Redirect log output to this file instead of stderr
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Read current contents and diff against this file before writing
    #[arg(long, global = true)]
    pub diff: Option<PathBuf>,

    /// Skip reading current contents before writing
    #[arg(long, global = true)]
    pub do_not_diff: bool,

    /// Skip FMAP discovery on the device
    #[arg(long, global = true)]
    pub ignore_fmap: bool,

    /// Skip acquiring the process-wide lock (diagnostic use only)
    #[arg(long, global = true)]
    pub ignore_lock: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read flash contents to a file ("-" for stdout)
    Read {
        /// Output file
        file: PathBuf,
    },

    /// Write a file's contents to flash ("-" for stdin)
    Write {
        /// Input file
        file: PathBuf,
    },

    /// Verify flash contents against a file ("-" for stdin)
    Verify {
        /// Input file to verify against
        file: PathBuf,
    },

    /// Erase the whole chip, or the included regions
    Erase,

    /// List every supported programmer and chip vendor
    ListSupported,

    /// Read the chip and write each included region to its own file
    Extract,

    /// Print the detected chip's vendor and name
    FlashName,

    /// Print the detected chip's size in bytes
    FlashSize,

    /// Show the current write-protect range and mode
    WpStatus,

    /// List the write-protect ranges this chip can express
    WpList,

    /// Set the write-protect range to `<start> <length>` (hex or decimal)
    WpRange {
        /// Start address
        start: String,
        /// Length in bytes
        length: String,
    },

    /// Set the write-protect range to a named layout region
    WpRegion {
        /// Region name
        name: String,
    },

    /// Enable write protection
    WpEnable {
        /// Protection mode: hardware (default), power-cycle, or permanent
        mode: Option<String>,
    },

    /// Disable write protection
    WpDisable,
}
