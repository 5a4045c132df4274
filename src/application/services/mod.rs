//! Application services
//!
//! One module per verb. Each exposes a task value and a `run` step that the
//! pipeline calls with an authenticated session.

pub mod backup;
pub mod copy;
pub mod history;

pub use backup::{BackupStats, BackupTask};
pub use copy::{CopyTask, SnapshotPlan, SnapshotStats};
pub use history::{HistoryFormat, HistoryRenderer, HistoryTask, RenderOptions};
