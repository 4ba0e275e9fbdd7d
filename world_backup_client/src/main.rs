/**
 * World Backup Client - Main Entry Point
 *
 * Logs into a world, records and removes every placed object, and replays
 * the record to rebuild them. See `stages` for the available run modes.
 */
mod activity_log;
mod backup_file;
mod client;
mod config;
mod error;
mod offline_world;
mod pipeline;
mod prompt;
mod scanner;
mod stages;

use std::path::PathBuf;

use clap::Parser;

use crate::activity_log::ActivityLog;
use crate::backup_file::BackupFile;
use crate::client::Session;
use crate::config::{BackupConfig, FileConfig, Overrides};
use crate::error::BackupError;
use crate::offline_world::OfflineWorld;
use crate::prompt::TerminalPrompter;
use crate::stages::{plan_for, run_plan, RunContext, RunSummary};

#[derive(Parser)]
#[command(about = "Back up, clear and restore the objects placed in a world")]
struct Cli {
    /// Run mode: run, backup, restore or survey
    #[arg(default_value = "run")]
    mode: String,
    /// JSON config file (defaults to $WORLD_BACKUP_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
    /// World snapshot used by the offline adapter
    #[arg(long)]
    world_file: Option<PathBuf>,
    #[arg(long)]
    backup_file: Option<PathBuf>,
    #[arg(long, conflicts_with = "no_activity_log")]
    activity_log: Option<PathBuf>,
    #[arg(long)]
    no_activity_log: bool,
    #[arg(long)]
    citizen: Option<u32>,
    #[arg(long)]
    world: Option<String>,
}

fn run(cli: Cli) -> Result<RunSummary, BackupError> {
    let plan = plan_for(&cli.mode)?;

    let file = match cli.config.or_else(config::get_config_path) {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        citizen: cli.citizen,
        world: cli.world,
        backup_file: cli.backup_file,
        activity_log: cli.activity_log,
        no_activity_log: cli.no_activity_log,
        world_file: cli.world_file,
    };
    let config = BackupConfig::resolve(overrides, file, config::get_password(), &mut TerminalPrompter)?;
    log::debug!("Resolved configuration: {:?}", config);

    let store = OfflineWorld::load(&config.world_file).map_err(BackupError::Connect)?;
    let mut session = Session::new(store);
    let ctx = RunContext {
        credentials: config.credentials,
        world: config.world,
        backup: BackupFile::new(config.backup_file),
        activity: ActivityLog::new(config.activity_log),
    };
    let summary = run_plan(&mut session, plan, &ctx)?;
    if let Some(world) = session.world() {
        println!("Finished in world {}.", world);
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("{} stages completed.", summary.completed.len());
    if let Some(count) = summary.surveyed {
        println!("Surveyed {} objects.", count);
    }
    if let Some(b) = &summary.backup {
        println!("Backup: {} recorded, {} deleted, {} failed to delete.", b.recorded, b.deleted, b.delete_failed);
    }
    if let Some(r) = &summary.restore {
        println!("Restore: {} attempted, {} restored, {} failed to add.", r.attempted, r.restored, r.add_failed);
        if !r.corrupt.is_empty() {
            println!("Corrupt backup lines skipped: {:?}", r.corrupt);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            log::error!("Run failed: {:?}", e);
            println!("An error occurred: {}", e);
            std::process::exit(1);
        }
    }
}
