use clap::Args;
use snoozer_core::clock::{self, TimeOfDay};
use snoozer_core::{presets, TabRef};

use crate::common::open_engine;

#[derive(Args)]
pub struct SnoozeArgs {
    /// URL of the tab to snooze
    pub url: String,
    /// Tab title to show in listings
    #[arg(long, default_value = "")]
    pub title: String,
    /// Originating tab id, if the caller has one
    #[arg(long)]
    pub tab_id: Option<i64>,
    /// Defer by this many hours (fractional allowed)
    #[arg(long, conflicts_with_all = ["preset", "at"])]
    pub hours: Option<f64>,
    /// Use a quick option by id (see `snoozer-cli presets`)
    #[arg(long, conflicts_with = "at")]
    pub preset: Option<String>,
    /// Defer until the next occurrence of this wall-clock time (HH:mm)
    #[arg(long)]
    pub at: Option<String>,
}

pub fn run(args: SnoozeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let hours = if let Some(hours) = args.hours {
        hours
    } else if let Some(id) = &args.preset {
        presets::find_option(clock::now_local(), id)
            .ok_or_else(|| format!("unknown preset '{id}' (try `snoozer-cli presets`)"))?
            .hours
    } else if let Some(at) = &args.at {
        let target: TimeOfDay = at.parse()?;
        clock::hours_until(clock::now_local(), target, 0)
    } else {
        return Err("one of --hours, --preset, or --at is required".into());
    };

    let engine = open_engine()?;
    let tab = TabRef {
        id: args.tab_id,
        url: args.url,
        title: args.title,
    };
    let record = engine.create_one_shot(&tab, hours)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
