/**
 * Run Stages
 *
 * A run is an ordered list of named stages executed one after another.
 * The first stage to fail ends the run; nothing is retried.
 */
use phf::phf_map;
use world_backup_common::Coordinates;

use crate::activity_log::ActivityLog;
use crate::backup_file::BackupFile;
use crate::client::{Credentials, ObjectStore, Session};
use crate::config::ConfigError;
use crate::error::{BackupError, WorldError};
use crate::pipeline::{self, BackupReport, RestoreReport};
use crate::scanner::scan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    EnterWorld,
    MoveToOrigin,
    /// List objects without changing anything
    Survey,
    ScanDeleteRecord,
    Restore,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Login => "login",
            Stage::EnterWorld => "enter world",
            Stage::MoveToOrigin => "move to origin",
            Stage::Survey => "survey",
            Stage::ScanDeleteRecord => "scan, delete and record",
            Stage::Restore => "restore",
        };
        f.write_str(name)
    }
}

// Perfect-hash map from run mode to its stages
static PLANS: phf::Map<&'static str, &'static [Stage]> = phf_map! {
    "run" => &[Stage::Login, Stage::EnterWorld, Stage::MoveToOrigin, Stage::ScanDeleteRecord, Stage::Restore],
    "backup" => &[Stage::Login, Stage::EnterWorld, Stage::MoveToOrigin, Stage::ScanDeleteRecord],
    "restore" => &[Stage::Login, Stage::EnterWorld, Stage::MoveToOrigin, Stage::Restore],
    "survey" => &[Stage::Login, Stage::EnterWorld, Stage::MoveToOrigin, Stage::Survey],
};

/// Stages for a named run mode
pub fn plan_for(mode: &str) -> Result<&'static [Stage], ConfigError> {
    PLANS.get(mode).copied().ok_or_else(|| {
        let mut known: Vec<&str> = PLANS.keys().copied().collect();
        known.sort();
        ConfigError::UnknownMode { mode: mode.to_string(), known: known.join(", ") }
    })
}

/// Everything a stage needs besides the session
pub struct RunContext {
    pub credentials: Credentials,
    pub world: String,
    pub backup: BackupFile,
    pub activity: ActivityLog,
}

/// Outcome of the stages that ran
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<Stage>,
    pub surveyed: Option<usize>,
    pub backup: Option<BackupReport>,
    pub restore: Option<RestoreReport>,
}

fn failed(stage: Stage) -> impl FnOnce(WorldError) -> BackupError {
    move |source| BackupError::Stage { stage, source }
}

/// Execute a plan against a session, stopping at the first failure
pub fn run_plan<S: ObjectStore>(
    session: &mut Session<S>,
    plan: &[Stage],
    ctx: &RunContext,
) -> Result<RunSummary, BackupError> {
    let mut summary = RunSummary::default();
    for &stage in plan {
        log::info!("Stage: {}", stage);
        match stage {
            Stage::Login => session.login(&ctx.credentials).map_err(failed(stage))?,
            Stage::EnterWorld => session.enter_world(&ctx.world).map_err(failed(stage))?,
            Stage::MoveToOrigin => session.move_to(Coordinates::ORIGIN).map_err(failed(stage))?,
            Stage::Survey => {
                let store = session.require_world().map_err(failed(stage))?;
                let records = scan(store).map_err(failed(stage))?;
                summary.surveyed = Some(pipeline::survey(records)?);
            }
            Stage::ScanDeleteRecord => {
                let store = session.require_world().map_err(failed(stage))?;
                let records = scan(store).map_err(failed(stage))?;
                summary.backup = Some(pipeline::delete_and_record(store, records, &ctx.backup, &ctx.activity)?);
            }
            Stage::Restore => {
                let store = session.require_world().map_err(failed(stage))?;
                summary.restore = Some(pipeline::restore(store, &ctx.backup, &ctx.activity)?);
            }
        }
        summary.completed.push(stage);
    }
    Ok(summary)
}
