use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::navigation::NavMode;
use crate::timer::ClockMode;

#[derive(Parser, Debug)]
#[command(name = "termdrill", version, about = "Timed practice sessions in the terminal")]
pub struct Cli {
    /// Deck to practice (file name without .md)
    #[arg(required_unless_present = "list")]
    pub deck: Option<String>,

    /// Directory holding deck files [default: <data dir>/decks]
    #[arg(long, value_name = "dir")]
    pub decks: Option<PathBuf>,

    /// Start in focused or continuous mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override the deck's time limit, in seconds (0 means unlimited)
    #[arg(long, value_name = "secs", conflicts_with = "unlimited")]
    pub time_limit: Option<u64>,

    /// Run without a countdown
    #[arg(long)]
    pub unlimited: bool,

    /// List available decks and exit
    #[arg(long)]
    pub list: bool,

    /// Config file [default: <config dir>/config.yaml]
    #[arg(long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Write the log here instead of <data dir>/termdrill.log
    #[arg(long, value_name = "path")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Clock requested on the command line, if any. A zero limit is
    /// unlimited, the same as in deck frontmatter.
    pub fn clock_override(&self) -> Option<ClockMode> {
        if self.unlimited {
            return Some(ClockMode::Unlimited);
        }
        self.time_limit.map(|secs| ClockMode::from_limit(Some(secs)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Focused,
    Continuous,
}

impl From<ModeArg> for NavMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Focused => NavMode::Focused,
            ModeArg::Continuous => NavMode::Continuous,
        }
    }
}
