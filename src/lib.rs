//! tfsget: export TFS version control trees and changeset history
//!
//! Layers, innermost first:
//! - `domain`: version specs, credentials, changesets, path mapping
//! - `application`: the task pipeline and the copy, history and backup tasks
//! - `infrastructure`: REST client, filesystem, prompt, DI
//! - `cli`: argument parsing, dispatch, exit codes

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
