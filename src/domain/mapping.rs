//! Mapping of server paths onto the local target directory
//!
//! The target directory becomes the root for everything below the project
//! folder: `$/Proj/Sub/docs/a.txt` copied from `$/Proj/Sub` into `out` lands
//! at `out/docs/a.txt`. Server paths compare case-insensitively.

use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DomainResult, Item, ItemKind};

/// Compute where a server item is written below `target`.
///
/// The project path itself maps to `target`.
pub fn local_path_for(project_path: &str, server_path: &str, target: &Path) -> DomainResult<PathBuf> {
    let project = normalize(project_path);
    if project.is_empty() {
        return Err(DomainError::InvalidServerPath(project_path.to_string()));
    }
    let item = normalize(server_path);

    let relative = if item.eq_ignore_ascii_case(&project) {
        ""
    } else {
        strip_prefix_ignore_case(&item, &project)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| DomainError::OutsideProject {
                project: project_path.to_string(),
                item: server_path.to_string(),
            })?
    };

    let mut local = target.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." {
            return Err(DomainError::InvalidServerPath(server_path.to_string()));
        }
        local.push(segment);
    }
    Ok(local)
}

/// Compute where an item is written below `target`.
///
/// A file that is itself the project path lands below `target` under its
/// own name instead of replacing the target directory.
pub fn local_item_path(project_path: &str, item: &Item, target: &Path) -> DomainResult<PathBuf> {
    let server_path = normalize(&item.server_path);
    if item.kind == ItemKind::File && server_path.eq_ignore_ascii_case(&normalize(project_path)) {
        return match server_path.rsplit('/').next() {
            Some(name) if !name.is_empty() && name != ".." && name != "." && name != "$" => {
                Ok(target.join(name))
            }
            _ => Err(DomainError::InvalidServerPath(item.server_path.clone())),
        };
    }
    local_path_for(project_path, &item.server_path, target)
}

fn normalize(path: &str) -> String {
    path.trim().replace('\\', "/").trim_end_matches('/').to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
