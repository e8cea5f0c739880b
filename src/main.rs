use clap::Parser;
use fuel_tracker::args::{Args, Command, SyncDirection};
use fuel_tracker::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with {} error: {e}", e.error_type());
            ExitCode::FAILURE
        }
    }
}

async fn load(home: &std::path::Path) -> Result<Config> {
    Config::load(home).await
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().fuel_home().path();

    // This allows for running the program without touching the remote API. When
    // FUEL_TRACKER_IN_TEST_MODE is set and non-empty, the mode will be Mode::Test, otherwise it
    // will be Mode::Live.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),
        Command::Add(add_args) => commands::add(load(home).await?, mode, add_args.clone())
            .await?
            .print(),
        Command::Update(update_args) => {
            commands::update(load(home).await?, mode, update_args.clone())
                .await?
                .print()
        }
        Command::Delete(id_args) => commands::delete(load(home).await?, mode, id_args.clone())
            .await?
            .print(),
        Command::Duplicate(id_args) => {
            commands::duplicate(load(home).await?, mode, id_args.clone())
                .await?
                .print()
        }
        Command::List => commands::list(load(home).await?, mode).await?.print(),
        Command::Stats => commands::stats(load(home).await?, mode).await?.print(),
        Command::Report(report_args) => {
            commands::report(load(home).await?, mode, report_args.clone())
                .await?
                .print()
        }
        Command::Import(import_args) => {
            commands::import(load(home).await?, mode, import_args.clone())
                .await?
                .print()
        }
        Command::Export(export_args) => {
            commands::export(load(home).await?, mode, export_args.clone())
                .await?
                .print()
        }
        Command::Voice(voice_args) => commands::voice(load(home).await?, mode, voice_args.clone())
            .await?
            .print(),
        Command::Mode(mode_args) => commands::set_mode(load(home).await?, mode, mode_args.clone())
            .await?
            .print(),
        Command::SignIn => commands::sign_in(load(home).await?, mode).await?.print(),
        Command::SignOut => commands::sign_out(load(home).await?, mode).await?.print(),
        Command::Sync(sync_args) => {
            let config = load(home).await?;
            match sync_args.direction() {
                SyncDirection::Up => commands::sync_up(config, mode).await?.print(),
                SyncDirection::Down => commands::sync_down(config, mode).await?.print(),
                SyncDirection::Cloud => commands::sync_cloud(config, mode).await?.print(),
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the log level for this package's crates only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
