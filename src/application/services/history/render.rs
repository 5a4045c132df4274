//! Text renderings of changeset history: brief, detailed, csv, md

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use itertools::Itertools;

use crate::domain::{Change, ChangeType, Changeset};

const RULE: &str =
    "-------------------------------------------------------------------------------";

/// Output format of the history task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryFormat {
    /// One table row per changeset
    #[default]
    Brief,
    /// Multi-line block per changeset with items, notes, policies, work items
    Detailed,
    /// One quoted record per changeset
    Csv,
    /// Changelog bullets from linked work items
    Md,
}

impl fmt::Display for HistoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Brief => "Brief",
            Self::Detailed => "Detailed",
            Self::Csv => "Csv",
            Self::Md => "Md",
        };
        f.write_str(name)
    }
}

/// Settings-driven rendering details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub csv_separator: String,
    pub utc_dates: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            csv_separator: ",".to_string(),
            utc_dates: false,
        }
    }
}

/// Renders changesets in one format.
#[derive(Debug, Clone)]
pub struct HistoryRenderer {
    format: HistoryFormat,
    use_comments: bool,
    silent: bool,
    options: RenderOptions,
}

/// Collapse a multi-line comment onto one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .join(" ")
}

/// Quote a CSV field, doubling embedded quotes.
pub fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

impl HistoryRenderer {
    pub fn new(
        format: HistoryFormat,
        use_comments: bool,
        silent: bool,
        options: RenderOptions,
    ) -> Self {
        Self {
            format,
            use_comments,
            silent,
            options,
        }
    }

    /// Whether rendering uses the per-changeset change list.
    pub fn needs_changes(&self) -> bool {
        matches!(
            self.format,
            HistoryFormat::Brief | HistoryFormat::Detailed | HistoryFormat::Csv
        )
    }

    /// Whether rendering uses notes, policy overrides and work items.
    pub fn needs_details(&self) -> bool {
        matches!(self.format, HistoryFormat::Detailed | HistoryFormat::Md)
    }

    fn format_date(&self, date: &DateTime<Utc>, pattern: &str) -> String {
        if self.options.utc_dates {
            date.format(pattern).to_string()
        } else {
            date.with_timezone(&Local).format(pattern).to_string()
        }
    }

    fn short_date(&self, date: &DateTime<Utc>) -> String {
        self.format_date(date, "%Y-%m-%d")
    }

    fn long_date(&self, date: &DateTime<Utc>) -> String {
        self.format_date(date, "%Y-%m-%d %H:%M:%S")
    }

    /// Header lines, suppressed when silent. Detailed has none.
    pub fn header(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.silent {
            return Ok(());
        }
        match self.format {
            HistoryFormat::Brief => {
                writeln!(
                    out,
                    "Changeset Change                     User              Date       Comment"
                )?;
                writeln!(
                    out,
                    "--------- -------------------------- ----------------- ---------- --------"
                )
            }
            HistoryFormat::Csv => {
                let sep = &self.options.csv_separator;
                writeln!(
                    out,
                    "Changeset{0}Change{0}User{0}\"User display name\"{0}\"Date/time\"{0}Comment",
                    sep
                )
            }
            HistoryFormat::Md => writeln!(out, "# Changelog"),
            HistoryFormat::Detailed => Ok(()),
        }
    }

    /// Render one changeset; `index` is its position in the output.
    pub fn entry(
        &self,
        out: &mut dyn Write,
        index: usize,
        changeset: &Changeset,
        changes: &[Change],
    ) -> io::Result<()> {
        match self.format {
            HistoryFormat::Brief => self.write_brief(out, changeset, changes),
            HistoryFormat::Detailed => self.write_detailed(out, index, changeset, changes),
            HistoryFormat::Csv => self.write_csv(out, changeset, changes),
            HistoryFormat::Md => self.write_md(out, changeset),
        }
    }

    fn write_brief(&self, out: &mut dyn Write, cs: &Changeset, changes: &[Change]) -> io::Result<()> {
        let kinds = ChangeType::aggregate(changes.iter().map(|c| c.change_type));
        writeln!(
            out,
            "{:<9} {:<26} {:<17} {:>10} {}",
            cs.id,
            kinds,
            cs.committer.display_name,
            self.short_date(&cs.created),
            single_line(cs.comment_text())
        )
    }

    fn write_detailed(
        &self,
        out: &mut dyn Write,
        index: usize,
        cs: &Changeset,
        changes: &[Change],
    ) -> io::Result<()> {
        if index > 0 {
            writeln!(out)?;
            writeln!(out, "{}", RULE)?;
        }
        writeln!(out, "Changeset: {}", cs.id)?;
        writeln!(out, "User: {} ({})", cs.owner.display_name, cs.owner.unique_name)?;
        writeln!(out, "Date: {}", self.long_date(&cs.created))?;
        writeln!(out)?;
        writeln!(out, "Comment:")?;
        for line in cs.comment_text().lines() {
            writeln!(out, "  {}", line)?;
        }

        if !changes.is_empty() {
            writeln!(out)?;
            writeln!(out, "Items:")?;
            for change in changes {
                writeln!(out, "  {:<26} {}", change.change_type, change.server_path)?;
            }
        }

        if !cs.checkin_notes.is_empty() {
            writeln!(out)?;
            writeln!(out, "Check-in Notes:")?;
            for note in &cs.checkin_notes {
                writeln!(out, "  {}:", note.name)?;
                writeln!(out, "    {}", note.value)?;
            }
        }

        if let Some(policy) = cs.overridden_policies() {
            writeln!(out)?;
            writeln!(out, "Policy Warnings:")?;
            writeln!(out, "  Override Reason:")?;
            writeln!(out, "    {}", policy.comment.as_deref().unwrap_or(""))?;
            writeln!(out, "  Messages:")?;
            for failure in &policy.failures {
                writeln!(out, "    {}", failure.message)?;
            }
        }

        if !cs.work_items.is_empty() {
            writeln!(out)?;
            writeln!(out, "Associated Work Items:")?;
            for wi in &cs.work_items {
                writeln!(out, "  {}: {}", wi.id, wi.title)?;
            }
        }
        Ok(())
    }

    fn write_csv(&self, out: &mut dyn Write, cs: &Changeset, changes: &[Change]) -> io::Result<()> {
        let kinds = ChangeType::aggregate(changes.iter().map(|c| c.change_type));
        let record = [
            cs.id.to_string(),
            csv_quote(&kinds.label()),
            csv_quote(&cs.committer.unique_name),
            csv_quote(&cs.committer.display_name),
            csv_quote(&self.long_date(&cs.created)),
            csv_quote(cs.comment_text()),
        ];
        writeln!(out, "{}", record.join(&self.options.csv_separator))
    }

    fn write_md(&self, out: &mut dyn Write, cs: &Changeset) -> io::Result<()> {
        if cs.work_items.is_empty() {
            let comment = single_line(cs.comment_text());
            if self.use_comments && !comment.is_empty() {
                writeln!(out, "* {}", comment)?;
            }
            return Ok(());
        }
        for wi in &cs.work_items {
            writeln!(out, "* **#{}** {}", wi.id, wi.title)?;
        }
        Ok(())
    }
}
