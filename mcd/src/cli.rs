use clap::Parser;

use crate::shell::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "mcd",
    version,
    about = "Resolve a fuzzy directory pattern to an absolute path"
)]
pub struct Cli {
    /// Directory pattern, e.g. `..`, `../ch`, `proj` or `/usr/loc`
    #[arg(required_unless_present = "init", allow_hyphen_values = true)]
    pattern: Option<String>,

    /// Which match to take when several directories qualify (0-based)
    #[arg(default_value_t = 0)]
    index: usize,

    /// Print the shell function that wraps mcd, then exit
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    init: Option<Shell>,
}

pub enum Command {
    Resolve { pattern: String, index: usize },
    Init(Shell),
}

impl Cli {
    pub fn into_command(self) -> Command {
        match self.init {
            Some(shell) => Command::Init(shell),
            None => Command::Resolve {
                pattern: self
                    .pattern
                    .unwrap_or_default(),
                index: self.index,
            },
        }
    }
}
