mod cli;
mod commands;
mod error;
mod logging;

use std::io::BufRead;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::{bounded, select, unbounded};
use padbus::{load_config, Bus, Client, Config, Error};

use crate::cli::{Cli, Command};
use crate::commands::{parse_command, PlayCommand, HELP};
use crate::error::AppError;

const DEFAULT_CONFIG: &str = "padbus.yaml";

fn main() -> ExitCode {
    let cli = Cli::parse();
    if logging::setup(cli.verbose, cli.no_color).is_err() {
        return ExitCode::FAILURE;
    }

    let result = open_bus(cli.config.as_deref()).and_then(|bus| match cli.command {
        Command::Check { plug } => check(bus, plug),
        Command::Play => play(bus),
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Bus(Error::NotSupported)) => {
            log::error!("bus driver is not available on this host, use `bus: mock` in the config");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config, AppError> {
    if let Some(path) = path {
        return Ok(load_config(path)?);
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        log::debug!("using {DEFAULT_CONFIG}");
        return Ok(load_config(default)?);
    }
    Ok(Config::default())
}

fn open_bus(path: Option<&Path>) -> Result<Arc<dyn Bus>, AppError> {
    let config = load(path)?;
    log::debug!("opening {:?} bus", config.bus);
    Ok(config.open_bus()?)
}

fn connect(bus: Arc<dyn Bus>) -> Result<Client, AppError> {
    let mut client = Client::alloc(bus);
    client.connect()?;
    log::info!("connected to the bus");
    Ok(client)
}

fn check(bus: Arc<dyn Bus>, plug: bool) -> Result<(), AppError> {
    let mut client = connect(bus)?;
    if plug {
        let pad = client.plug_in()?;
        log::info!("pad {:?} plugged in. Press Enter to unplug.", pad.target().raw());
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        pad.unplug()?;
        log::info!("pad unplugged");
    }
    client.disconnect();
    Ok(())
}

fn play(bus: Arc<dyn Bus>) -> Result<(), AppError> {
    // Handle Ctrl+C to exit cleanly
    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    let client = connect(bus)?;
    let mut pad = client.plug_in()?;
    log::info!("pad {:?} plugged in. Commands:\n{HELP}", pad.target().raw());

    // Stdin blocks, so it is read on its own thread and bridged to crossbeam.
    let (line_tx, line_rx) = unbounded::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        select! {
            recv(stop_rx) -> _ => {
                break;
            }
            recv(line_rx) -> msg => {
                let Ok(line) = msg else {
                    // Stdin closed.
                    break;
                };
                match parse_command(&line) {
                    Ok(PlayCommand::Exit) => break,
                    Ok(PlayCommand::Output) => match pad.next_output() {
                        Some(output) => {
                            log::info!("{output}");
                        }
                        None => {
                            log::info!("no output");
                        }
                    },
                    Ok(PlayCommand::Input(input)) => {
                        if let Err(e) = pad.put_input(input) {
                            log::error!("failed to update pad: {e}");
                        }
                    }
                    Err(e) => {
                        log::warn!("{e}");
                    }
                }
            }
        }
    }

    pad.unplug()?;
    log::info!("pad unplugged");
    Ok(())
}
