use chrono::{Local, TimeZone};
use clap::Args;
use snoozer_core::{RecurringConfig, SnoozeRecord};

use crate::common::open_engine;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Args)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let list = engine.list()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("One-time ({})", list.one_shot.len());
    for record in &list.one_shot {
        print_record(record);
    }
    println!("Recurring ({})", list.recurring.len());
    for record in &list.recurring {
        print_record(record);
        if let Some(config) = list
            .configs
            .iter()
            .find(|c| Some(c.id.as_str()) == record.recurring_id.as_deref())
        {
            println!("      every {} at {}", day_names(config), config.time);
        }
    }
    Ok(())
}

fn print_record(record: &SnoozeRecord) {
    let display = if record.title.is_empty() {
        &record.url
    } else {
        &record.title
    };
    println!("  {}  {}  {}", record.key, format_due(record.due_at_ms), display);
}

fn format_due(due_at_ms: i64) -> String {
    match Local.timestamp_millis_opt(due_at_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => format!("@{due_at_ms}"),
    }
}

fn day_names(config: &RecurringConfig) -> String {
    config
        .days
        .days()
        .iter()
        .map(|&d| DAY_NAMES[d as usize])
        .collect::<Vec<_>>()
        .join(",")
}
