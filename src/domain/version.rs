//! Revision specifications: single versions and `start,end` ranges
//!
//! Syntax follows the server's own tokens:
//! - `T` latest (tip)
//! - `C123` or `123` changeset number
//! - `D2024-01-31` or `D01/31/2024` date

use std::fmt;

use chrono::NaiveDate;

use crate::domain::{DomainError, DomainResult};

/// A single point in the server's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Changeset(u32),
    Date(NaiveDate),
}

impl VersionSpec {
    /// Parse one version token.
    pub fn parse(spec: &str) -> DomainResult<Self> {
        let token = spec.trim();
        let invalid = |reason: &str| DomainError::InvalidVersionSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        if token.is_empty() {
            return Err(invalid("empty version"));
        }
        if token.eq_ignore_ascii_case("t") {
            return Ok(Self::Latest);
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return parse_changeset(token).ok_or_else(|| invalid("changeset number out of range"));
        }

        let mut chars = token.chars();
        let prefix = chars.next().map(|c| c.to_ascii_uppercase());
        let rest = chars.as_str();
        match prefix {
            Some('C') => parse_changeset(rest).ok_or_else(|| invalid("expected a changeset number")),
            Some('D') => parse_date(rest)
                .map(Self::Date)
                .ok_or_else(|| invalid("expected a date as yyyy-mm-dd or mm/dd/yyyy")),
            Some('L') => Err(invalid("label versions are not supported")),
            Some('W') => Err(invalid("workspace versions are not supported")),
            _ => Err(invalid("unknown version type")),
        }
    }

    /// Resolve the version for a tree snapshot: absent or blank means latest.
    pub fn resolve_single(spec: Option<&str>) -> DomainResult<Self> {
        match spec.map(str::trim) {
            None | Some("") => Ok(Self::Latest),
            Some(s) if s.contains(',') => Err(DomainError::InvalidVersionSpec {
                spec: s.to_string(),
                reason: "a single version is expected, not a range".to_string(),
            }),
            Some(s) => Self::parse(s),
        }
    }
}

fn parse_changeset(digits: &str) -> Option<VersionSpec> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().map(VersionSpec::Changeset)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "T"),
            Self::Changeset(id) => write!(f, "C{}", id),
            Self::Date(date) => write!(f, "D{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Optional start and end of a history query. Both absent means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub start: Option<VersionSpec>,
    pub end: Option<VersionSpec>,
}

impl VersionRange {
    /// Parse `start` or `start,end`. The string is split at the first comma only.
    pub fn parse(spec: Option<&str>) -> DomainResult<Self> {
        let spec = match spec.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(s) => s,
        };
        let optional = |s: &str| -> DomainResult<Option<VersionSpec>> {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                VersionSpec::parse(s).map(Some)
            }
        };
        match spec.split_once(',') {
            Some((start, end)) => Ok(Self {
                start: optional(start)?,
                end: optional(end)?,
            }),
            None => Ok(Self {
                start: Some(VersionSpec::parse(spec)?),
                end: None,
            }),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
