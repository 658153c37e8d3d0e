mod alarm;
mod session;
mod sound;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::alarm::model::{Settings, parse_hhmm, try_load_settings};
use crate::alarm::scheduler::AlarmScheduler;
use crate::session::SessionWatcher;

#[derive(Parser, Debug)]
#[command(
    name = "daystarter",
    version,
    about = "Daily alarm scheduler with snooze and pause-on-lock"
)]
struct Cli {
    /// Settings file holding the alarm list, ringtone, and pause-on-lock
    /// flag. A legacy bare-list file is accepted and normalized.
    #[arg(long, default_value = "alarms_v3.json")]
    settings: PathBuf,

    /// Validate the settings file and report capabilities, then exit
    /// without starting the GUI.
    #[arg(long)]
    diagnostics: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.diagnostics {
        run_diagnostics(&cli.settings);
        return Ok(());
    }

    simple_file_logger::init_logger!("daystarter")
        .map_err(|err| anyhow::anyhow!("could not initialize logger: {err:?}"))?;

    let settings = alarm::model::load_settings(&cli.settings);
    let scheduler = AlarmScheduler::new(settings.alarms.clone());
    ui::app::run_gui(scheduler, settings, cli.settings)
}

fn run_diagnostics(path: &Path) {
    println!("Settings file: {}", path.display());
    let settings = match try_load_settings(path) {
        Ok(settings) => {
            println!("Settings loaded.");
            settings
        }
        Err(err) => {
            println!("{err}; using built-in defaults.");
            Settings::default()
        }
    };

    println!("Alarms configured: {}", settings.alarms.len());
    for (index, entry) in settings.alarms.iter().enumerate() {
        let state = if entry.enabled { "on " } else { "off" };
        let time_note = if entry.time.trim().is_empty() {
            "no time set".to_string()
        } else {
            match parse_hhmm(&entry.time) {
                Ok((hour, minute)) => format!("{hour:02}:{minute:02}"),
                Err(err) => format!("{err}"),
            }
        };
        println!(
            "  {}. [{state}] {}: {time_note}",
            index + 1,
            entry.display_label(index)
        );
    }

    if settings.default_ringtone.is_empty() {
        println!("Ringtone: generated tone (default)");
    } else {
        println!("Ringtone: {}", settings.default_ringtone);
    }
    println!(
        "Pause on lock: {} (lock detection {})",
        if settings.pause_on_lock { "on" } else { "off" },
        if SessionWatcher::is_supported() {
            "available"
        } else {
            "unavailable on this platform"
        }
    );
}
