//! History task: query changesets for a path and render them

mod render;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt, Session};
use crate::domain::VersionRange;
use crate::infrastructure::traits::HistoryQuery;

pub use render::{HistoryFormat, HistoryRenderer, RenderOptions};

/// Render the history of the project path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTask {
    pub range: VersionRange,
    pub format: HistoryFormat,
    /// Md only: fall back to the comment when no work item is linked
    pub use_comments: bool,
    pub options: RenderOptions,
}

#[instrument(skip(session))]
pub fn run(session: &mut Session<'_>, task: &HistoryTask) -> ApplicationResult<()> {
    let renderer = HistoryRenderer::new(
        task.format,
        task.use_comments,
        session.params.silent,
        task.options.clone(),
    );
    let query = HistoryQuery {
        path: session.params.project_path.clone(),
        recursive: true,
        range: task.range.clone(),
        include_details: renderer.needs_details(),
    };

    let history = session.vc.query_history(&query)?;
    debug!("history: {} changesets", history.len());
    session.flush_warnings()?;

    renderer.header(session.out).with_context("write output")?;
    for (index, changeset) in history.iter().enumerate() {
        let changes = if renderer.needs_changes() {
            session.vc.changes_for_changeset(changeset.id)?
        } else {
            Vec::new()
        };
        renderer
            .entry(session.out, index, changeset, &changes)
            .with_context("write output")?;
        session.flush_warnings()?;
    }
    Ok(())
}
