use clap::{Args, ValueEnum};
use snoozer_core::{CancelMode, RecordKey};

use crate::common::open_engine;

#[derive(Args)]
pub struct CancelArgs {
    /// Snooze key, as shown by `list` (snooze-<origin>-<due>)
    pub key: String,
    /// What to do with the record (series modes apply to recurring only)
    #[arg(long, value_enum, default_value = "remove-only")]
    pub mode: ModeArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Back out without touching anything
    Cancel,
    /// Drop the record; the tab stays closed
    RemoveOnly,
    /// Drop the record and reopen its tab now
    RemoveAndOpen,
    /// Drop the record and its whole series, reopening the tab
    RemoveAllAndOpen,
    /// Drop the record and its whole series; tab stays closed
    RemoveSeriesOnly,
    /// Reopen this occurrence, keep the series scheduled
    RemoveSingleAndOpen,
}

impl From<ModeArg> for CancelMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cancel => CancelMode::Cancel,
            ModeArg::RemoveOnly => CancelMode::RemoveOnly,
            ModeArg::RemoveAndOpen => CancelMode::RemoveAndOpen,
            ModeArg::RemoveAllAndOpen => CancelMode::RemoveAllAndOpen,
            ModeArg::RemoveSeriesOnly => CancelMode::RemoveSeriesOnly,
            ModeArg::RemoveSingleAndOpen => CancelMode::RemoveSingleAndOpen,
        }
    }
}

pub fn run(args: CancelArgs) -> Result<(), Box<dyn std::error::Error>> {
    let key: RecordKey = args.key.parse()?;
    let engine = open_engine()?;
    let outcome = engine.cancel(&key, args.mode.into())?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
