//! Change kinds of a changeset item as a bit-set

use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;

bitflags! {
    /// Kinds of change applied to an item. A changeset's overall change is the
    /// union of all its items' kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeType: u32 {
        const ADD = 1 << 0;
        const EDIT = 1 << 1;
        const ENCODING = 1 << 2;
        const RENAME = 1 << 3;
        const DELETE = 1 << 4;
        const UNDELETE = 1 << 5;
        const BRANCH = 1 << 6;
        const MERGE = 1 << 7;
        const LOCK = 1 << 8;
        const ROLLBACK = 1 << 9;
        const SOURCE_RENAME = 1 << 10;
        const TARGET_RENAME = 1 << 11;
        const PROPERTY = 1 << 12;
    }
}

/// (flag, display label, wire name) in bit order.
const NAMES: &[(ChangeType, &str, &str)] = &[
    (ChangeType::ADD, "Add", "add"),
    (ChangeType::EDIT, "Edit", "edit"),
    (ChangeType::ENCODING, "Encoding", "encoding"),
    (ChangeType::RENAME, "Rename", "rename"),
    (ChangeType::DELETE, "Delete", "delete"),
    (ChangeType::UNDELETE, "Undelete", "undelete"),
    (ChangeType::BRANCH, "Branch", "branch"),
    (ChangeType::MERGE, "Merge", "merge"),
    (ChangeType::LOCK, "Lock", "lock"),
    (ChangeType::ROLLBACK, "Rollback", "rollback"),
    (ChangeType::SOURCE_RENAME, "SourceRename", "sourceRename"),
    (ChangeType::TARGET_RENAME, "TargetRename", "targetRename"),
    (ChangeType::PROPERTY, "Property", "property"),
];

impl ChangeType {
    /// Union of all kinds; an empty iterator yields the empty set.
    pub fn aggregate<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ChangeType>,
    {
        kinds.into_iter().fold(Self::empty(), |acc, kind| acc | kind)
    }

    /// Parse the server's comma separated representation, e.g. `"edit, rename"`.
    ///
    /// Returns the recognized kinds together with any names that were not understood.
    pub fn from_wire(value: &str) -> (Self, Vec<String>) {
        let mut kinds = Self::empty();
        let mut unknown = Vec::new();
        for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if name.eq_ignore_ascii_case("none") {
                continue;
            }
            if name.eq_ignore_ascii_case("all") {
                kinds |= Self::all();
                continue;
            }
            match NAMES.iter().find(|(_, _, wire)| wire.eq_ignore_ascii_case(name)) {
                Some((flag, _, _)) => kinds |= *flag,
                None => unknown.push(name.to_string()),
            }
        }
        (kinds, unknown)
    }

    /// Symbolic label, member names joined with `, ` in bit order.
    pub fn label(&self) -> String {
        if self.is_empty() {
            return "None".to_string();
        }
        NAMES
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, label, _)| *label)
            .join(", ")
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers work in table layouts
        f.pad(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_edit_and_rename_when_aggregate_then_label_is_union() {
        let kinds = ChangeType::aggregate([ChangeType::EDIT, ChangeType::RENAME]);
        assert_eq!(kinds.label(), "Edit, Rename");
        assert_ne!(kinds.label(), "Edit");
    }

    #[test]
    fn given_no_changes_when_aggregate_then_none_label() {
        let kinds = ChangeType::aggregate(Vec::new());
        assert!(kinds.is_empty());
        assert_eq!(kinds.to_string(), "None");
    }

    #[test]
    fn label_follows_bit_order_not_input_order() {
        let kinds = ChangeType::aggregate([ChangeType::DELETE, ChangeType::ADD, ChangeType::EDIT]);
        assert_eq!(kinds.label(), "Add, Edit, Delete");
    }

    #[test]
    fn given_wire_value_when_parse_then_flags_set() {
        let (kinds, unknown) = ChangeType::from_wire("edit, sourceRename");
        assert_eq!(kinds, ChangeType::EDIT | ChangeType::SOURCE_RENAME);
        assert!(unknown.is_empty());
    }

    #[test]
    fn given_unknown_wire_name_when_parse_then_reported() {
        let (kinds, unknown) = ChangeType::from_wire("add, teleport");
        assert_eq!(kinds, ChangeType::ADD);
        assert_eq!(unknown, vec!["teleport".to_string()]);
    }

    #[test]
    fn display_respects_width() {
        let formatted = format!("[{:<8}]", ChangeType::ADD);
        assert_eq!(formatted, "[Add     ]");
    }
}
