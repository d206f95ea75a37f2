use clap::Args;
use snoozer_core::TabRef;

use crate::common::open_engine;

#[derive(Args)]
pub struct RecurringArgs {
    /// URL of the tab to reopen each cycle
    pub url: String,
    /// Tab title to show in listings
    #[arg(long, default_value = "")]
    pub title: String,
    /// Originating tab id, if the caller has one
    #[arg(long)]
    pub tab_id: Option<i64>,
    /// Wall-clock time to reopen at (HH:mm)
    #[arg(long, default_value = "09:00")]
    pub time: String,
    /// Weekdays to fire on, 0 = Sunday .. 6 = Saturday (e.g. --days 1,3,5)
    #[arg(long, value_delimiter = ',', required = true)]
    pub days: Vec<u8>,
}

pub fn run(args: RecurringArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let tab = TabRef {
        id: args.tab_id,
        url: args.url,
        title: args.title,
    };
    let record = engine.create_recurring(&tab, &args.time, &args.days)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
