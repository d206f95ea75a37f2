use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "snoozer-cli", version, about = "Snoozer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snooze a tab once
    Snooze(commands::snooze::SnoozeArgs),
    /// Set up a weekly recurring snooze
    Recurring(commands::recurring::RecurringArgs),
    /// List pending snoozes
    List(commands::list::ListArgs),
    /// Cancel an existing snooze
    Cancel(commands::cancel::CancelArgs),
    /// Show the quick snooze options valid right now
    Presets(commands::presets::PresetsArgs),
    /// Run the delivery daemon
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Snooze(args) => commands::snooze::run(args),
        Commands::Recurring(args) => commands::recurring::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Cancel(args) => commands::cancel::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "snoozer-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
