use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use resolver::{Request, Resolver};

mod cli;
mod config;
mod error;
mod pattern;
mod resolver;
mod shell;

#[macro_use]
extern crate log;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // stdout carries the result only, so logs go to stderr and stay quiet by default
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_env("MCD_LOG") // e.g. MCD_LOG=debug
        .format_timestamp_secs()
        .init();

    match Cli::parse().into_command() {
        Command::Init(kind) => {
            print!("{}", shell::init_script(kind));
            Ok(ExitCode::SUCCESS)
        },

        Command::Resolve { pattern, index } => {
            let request = Request {
                pattern,
                index,
                working_dir: std::env::current_dir()?,
            };

            let config = Config::load();

            match Resolver::new(&config).resolve(&request) {
                Ok(path) => {
                    emit(&path)?;
                    Ok(ExitCode::SUCCESS)
                },
                Err(e) => {
                    error!("{e}");
                    Ok(ExitCode::FAILURE)
                },
            }
        },
    }
}

/// Writes the resolved path and nothing else to stdout.
fn emit(path: &Path) -> io::Result<()> {
    let mut out = io::stdout().lock();

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        out.write_all(
            path.as_os_str()
                .as_bytes(),
        )?;
    }

    #[cfg(not(unix))]
    write!(out, "{}", path.display())?;

    out.write_all(b"\n")?;
    out.flush()
}
