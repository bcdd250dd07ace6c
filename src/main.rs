//! rflasher - A modern flash chip programmer
//!
//! A Rust port of flashprog for reading, writing, and erasing flash chips.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rflasher_core::chip::ChipDatabase;
use rflasher_flash::{Session, SessionError, SessionResult};
use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.filter_level(level);

    if let Some(path) = &cli.output {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!(
                    "Error: Environment: cannot open log file {}: {}",
                    path.display(),
                    e
                );
                std::process::exit(1);
            }
        }
    }

    builder.init();
}

fn run(cli: &Cli) -> SessionResult<()> {
    let db = load_chip_database(cli.chip_db.as_deref())?;
    log::info!("Loaded {} chip definitions", db.len());

    if matches!(cli.command, Commands::ListSupported) {
        commands::cmd_list_supported(&db);
        return Ok(());
    }

    let programmer = cli
        .programmer
        .as_deref()
        .ok_or_else(|| SessionError::argument("missing --programmer"))?;

    let mut session = Session::open(programmer, &db, cli.ignore_lock)?;
    session.verbosity = cli.verbose;
    session.force = cli.force;

    if let Some(name) = &cli.chip {
        if let Some(info) = session.handle.chip_info() {
            if !info.name.eq_ignore_ascii_case(name) {
                log::warn!(
                    "--chip {} given but probed chip is {}; proceeding with the probed chip",
                    name,
                    info.name
                );
            }
        }
    }

    if let Some(layout_path) = &cli.layout {
        session.load_layout_file(layout_path)?;
    }
    session.discover_fmap(cli.ignore_fmap)?;

    for image in &cli.images {
        session.add_include(image)?;
    }
    session.validate_includes()?;

    match &cli.command {
        Commands::Read { file } => commands::cmd_read(&mut session, file),
        Commands::Write { file } => {
            commands::cmd_write(&mut session, file, cli.do_not_diff, cli.noverify)
        }
        Commands::Verify { file } => commands::cmd_verify(&mut session, file),
        Commands::Erase => commands::cmd_erase(&mut session),
        Commands::Extract => commands::cmd_extract(&mut session),
        Commands::FlashName => commands::cmd_flash_name(&session),
        Commands::FlashSize => commands::cmd_flash_size(&session),
        Commands::WpStatus => commands::cmd_wp_status(&mut session.handle).map_err(SessionError::from),
        Commands::WpList => commands::cmd_wp_list(&mut session.handle).map_err(SessionError::from),
        Commands::WpRange { start, length } => {
            let spec = format!("{},{}", start, length);
            commands::cmd_range(&mut session.handle, &spec, false).map_err(SessionError::from)
        }
        Commands::WpRegion { name } => {
            let layout = session
                .layout
                .clone()
                .ok_or_else(|| SessionError::not_found("no layout loaded"))?;
            commands::cmd_region(&mut session.handle, &layout, name, false)
                .map_err(SessionError::from)
        }
        Commands::WpEnable { mode } => match mode.as_deref() {
            None | Some("hardware") => {
                commands::cmd_enable(&mut session.handle, false).map_err(SessionError::from)
            }
            Some(other) => Err(SessionError::argument(format!(
                "unsupported write-protect mode '{}'",
                other
            ))),
        },
        Commands::WpDisable => commands::cmd_disable(&mut session.handle, false).map_err(SessionError::from),
        Commands::ListSupported => unreachable!("handled above"),
    }
}

/// Load the chip database from the specified path or default locations
fn load_chip_database(path: Option<&Path>) -> SessionResult<ChipDatabase> {
    let mut db = ChipDatabase::builtin();

    if let Some(path) = path {
        if path.is_dir() {
            db.load_dir(path)
                .map_err(|e| SessionError::environment(e.to_string()))?;
        } else if path.is_file() {
            db.load_file(path)
                .map_err(|e| SessionError::environment(e.to_string()))?;
        } else {
            return Err(SessionError::argument(format!(
                "chip database path not found: {}",
                path.display()
            )));
        }
    } else {
        let default_paths = [
            PathBuf::from("chips/vendors"),
            PathBuf::from("/usr/share/rflasher/chips"),
            PathBuf::from("/usr/local/share/rflasher/chips"),
        ];

        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => log::debug!("Loaded {} chips from {}", count, dir.display()),
                    Err(e) => log::warn!("Failed to load chips from {}: {}", dir.display(), e),
                }
            }
        }
    }

    Ok(db)
}
