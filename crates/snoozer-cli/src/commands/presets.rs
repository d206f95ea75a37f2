use clap::Args;
use snoozer_core::clock;
use snoozer_core::presets::smart_options;

#[derive(Args)]
pub struct PresetsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PresetsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = smart_options(clock::now_local());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }
    for option in options {
        println!("  {:<14} {:<16} {:>7.2}h", option.id, option.label, option.hours);
    }
    Ok(())
}
