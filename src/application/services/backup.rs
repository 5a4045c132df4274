//! Backup task: one snapshot directory per changeset
//!
//! Changesets are processed oldest first. Each one is copied into
//! `<target>/C<id>/` and sealed with a marker file once complete, so a
//! re-run skips finished snapshots and redoes interrupted ones.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::application::services::copy;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, Session};
use crate::domain::{VersionRange, VersionSpec};
use crate::infrastructure::traits::HistoryQuery;
use crate::infrastructure::RemoteError;

/// Marker written into a snapshot directory after its last item.
pub const COMPLETE_MARKER: &str = ".tfsget-complete";

/// Back up every changeset of the project path within a range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupTask {
    pub range: VersionRange,
}

/// Outcome of a backup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupStats {
    pub backed_up: usize,
    pub skipped: usize,
}

/// Snapshot directory of one changeset.
pub fn snapshot_dir(target: &Path, changeset_id: u32) -> PathBuf {
    target.join(format!("C{}", changeset_id))
}

#[instrument(skip(session))]
pub fn run(session: &mut Session<'_>, task: &BackupTask) -> ApplicationResult<()> {
    let stats = backup(session, task)?;
    if !session.params.silent {
        writeln!(
            session.out,
            "Backed up {} changeset(s), skipped {}",
            stats.backed_up, stats.skipped
        )
        .with_context("write output")?;
    }
    Ok(())
}

/// Snapshot all changesets in range that have no completed snapshot yet.
pub fn backup(session: &mut Session<'_>, task: &BackupTask) -> ApplicationResult<BackupStats> {
    let target = session.params.target_path.clone();
    if session.params.verbose {
        writeln!(session.out, "Target Path:  {}", target.display()).with_context("write output")?;
    }

    let query = HistoryQuery {
        path: session.params.project_path.clone(),
        recursive: true,
        range: task.range.clone(),
        include_details: false,
    };
    let mut ids: Vec<u32> = session
        .vc
        .query_history(&query)?
        .into_iter()
        .map(|cs| cs.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    session.flush_warnings()?;
    debug!("backup: {} changesets in range", ids.len());

    let mut stats = BackupStats::default();
    for id in ids {
        let dir = snapshot_dir(&target, id);
        let marker = dir.join(COMPLETE_MARKER);
        if session.fs.exists(&marker) {
            session.progress(format_args!("Skipping: C{}", id))?;
            stats.skipped += 1;
            continue;
        }

        session.progress(format_args!("Backing up: C{}", id))?;
        session
            .fs
            .create_dir_all(&dir)
            .with_path_context("create directory", &dir)?;
        match copy::plan(session, &dir, &VersionSpec::Changeset(id)) {
            Ok(plan) => {
                // any failure while writing leaves the snapshot unsealed
                let snap = copy::write(session, plan)?;
                debug!("C{}: {} folders, {} files", id, snap.folders, snap.files);
            }
            // the project path did not exist at this changeset (deleted or not yet created)
            Err(ApplicationError::Remote(RemoteError::NotFound(message))) => {
                warn!("C{}: nothing to back up: {}", id, message);
                writeln!(session.err, "Exception: C{}: {}", id, message)
                    .with_context("write warnings")?;
            }
            Err(e) => return Err(e),
        }
        session
            .fs
            .write(&marker, &format!("{}\n", id))
            .with_path_context("write marker", &marker)?;
        stats.backed_up += 1;
    }

    info!(
        "backup done: {} backed up, {} skipped",
        stats.backed_up, stats.skipped
    );
    Ok(stats)
}
