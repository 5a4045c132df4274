//! Copy task: download a snapshot of a server tree into a local directory

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, Session};
use crate::domain::{local_item_path, Item, ItemKind, VersionSpec};

/// Copy the project tree at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub version: VersionSpec,
}

/// Counts of what a snapshot wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub folders: usize,
    pub files: usize,
    pub bytes: u64,
}

pub fn run(session: &mut Session<'_>, task: &CopyTask) -> ApplicationResult<()> {
    let target = session.params.target_path.clone();
    if session.params.verbose {
        writeln!(session.out, "Target Path:  {}", target.display()).with_context("write output")?;
    }
    let stats = snapshot(session, &target, &task.version)?;
    debug!(
        "copy done: {} folders, {} files, {} bytes",
        stats.folders, stats.files, stats.bytes
    );
    Ok(())
}

/// Items of the project tree at one version, each paired with its local path.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPlan {
    entries: Vec<(Item, PathBuf)>,
}

/// Write the project tree at `version` below `root`.
#[instrument(skip(session))]
pub fn snapshot(
    session: &mut Session<'_>,
    root: &Path,
    version: &VersionSpec,
) -> ApplicationResult<SnapshotStats> {
    let plan = plan(session, root, version)?;
    write(session, plan)
}

/// List the project tree at `version` and map every item below `root`.
///
/// Items of unknown kind abort here, before anything is written.
pub fn plan(
    session: &mut Session<'_>,
    root: &Path,
    version: &VersionSpec,
) -> ApplicationResult<SnapshotPlan> {
    let project = session.params.project_path.clone();
    let items = session.vc.list_items(&project, version)?;
    debug!("snapshot: {} items at {}", items.len(), version);

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        if item.kind == ItemKind::Any {
            return Err(ApplicationError::UnexpectedItemType(item.server_path));
        }
        let local = local_item_path(&project, &item, root)?;
        entries.push((item, local));
    }
    Ok(SnapshotPlan { entries })
}

/// Create the planned folders and download the planned files.
///
/// Folders are created idempotently, files are overwritten.
pub fn write(session: &mut Session<'_>, plan: SnapshotPlan) -> ApplicationResult<SnapshotStats> {
    let mut stats = SnapshotStats::default();
    for (item, local) in plan.entries {
        match item.kind {
            ItemKind::Folder => {
                session.progress(format_args!("Creating Directory: {}", local.display()))?;
                session
                    .fs
                    .create_dir_all(&local)
                    .with_path_context("create directory", &local)?;
                stats.folders += 1;
            }
            ItemKind::File => {
                session.progress(format_args!("Getting: '{}'", local.display()))?;
                stats.bytes += download_file(session, &item, &local)?;
                stats.files += 1;
            }
            ItemKind::Any => return Err(ApplicationError::UnexpectedItemType(item.server_path)),
        }
        session.flush_warnings()?;
    }
    Ok(stats)
}

fn download_file(session: &mut Session<'_>, item: &Item, local: &Path) -> ApplicationResult<u64> {
    let mut content = session.vc.download(item)?;
    session
        .fs
        .ensure_parent(local)
        .with_path_context("create parent directory", local)?;
    let mut file = session
        .fs
        .create_file(local)
        .with_path_context("create file", local)?;
    let written = io::copy(&mut content, &mut file).with_path_context("download", local)?;
    file.flush().with_path_context("write file", local)?;
    Ok(written)
}
