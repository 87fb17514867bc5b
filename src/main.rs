mod cli;
mod db;
mod dedup;
mod error;
mod fmt;
mod grouper;
mod importer;
mod merger;
mod models;
mod normalize;
mod notifications;
mod settings;
mod stats;
mod store;

use clap::Parser;

use cli::payments::NewPayment;
use cli::{Cli, Commands, ModelsCommands, PaymentsCommands};

fn main() {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, agency } => cli::init::run(data_dir, agency),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Restore { file } => cli::restore::run(&file),
        Commands::Export { output } => cli::export::run(output),
        Commands::Models { command } => match command {
            ModelsCommands::List { duplicates } => cli::models::list(duplicates),
        },
        Commands::Payments { command } => match command {
            PaymentsCommands::List { model, month } => {
                cli::payments::list(model.as_deref(), month.as_deref())
            }
            PaymentsCommands::Add {
                model,
                amount,
                date,
                month,
                method,
                status,
                notes,
                force,
            } => cli::payments::add(NewPayment {
                model: &model,
                amount,
                date: date.as_deref(),
                month: month.as_deref(),
                method: &method,
                status: &status,
                notes,
                force,
            }),
            PaymentsCommands::Delete { id } => cli::payments::delete(&id),
        },
        Commands::Import {
            file,
            dry_run,
            force,
        } => cli::import::run(&file, dry_run, force),
        Commands::Merge { dry_run } => cli::merge::run(dry_run),
        Commands::Stats { month, model } => cli::stats::run(month.as_deref(), model.as_deref()),
        Commands::Notifications {
            mark_read,
            all_read,
        } => cli::notifications::run(&mark_read, all_read),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
