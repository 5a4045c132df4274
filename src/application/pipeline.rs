//! Task pipeline: connect, authenticate, process, release
//!
//! `Created → Authenticated → Processing → Done`. Authentication failure is
//! the only exit before processing. The connection is owned by `run` and
//! dropped on every exit path.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::services::{backup, copy, history};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, WarningQueue};
use crate::domain::Credential;
use crate::infrastructure::traits::{
    Connector, FileSystem, Notifier, Prompter, VersionControl,
};
use crate::infrastructure::RemoteError;

/// Connection parameters shared by all tasks. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub server_url: String,
    pub project_path: String,
    pub target_path: PathBuf,
    pub credential: Option<Credential>,
    pub verbose: bool,
    pub silent: bool,
}

/// Verb-specific processing step.
#[derive(Debug, Clone)]
pub enum Task {
    Copy(copy::CopyTask),
    History(history::HistoryTask),
    Backup(backup::BackupTask),
}

/// Lifecycle stage of a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Authenticated,
    Processing,
    Done,
}

/// Everything a task needs while processing.
pub struct Session<'a> {
    pub vc: &'a dyn VersionControl,
    pub fs: &'a dyn FileSystem,
    pub params: &'a ConnectionParams,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    warnings: &'a WarningQueue,
}

impl<'a> Session<'a> {
    pub fn new(
        vc: &'a dyn VersionControl,
        fs: &'a dyn FileSystem,
        params: &'a ConnectionParams,
        out: &'a mut dyn Write,
        err: &'a mut dyn Write,
        warnings: &'a WarningQueue,
    ) -> Self {
        Self {
            vc,
            fs,
            params,
            out,
            err,
            warnings,
        }
    }

    /// Print pending non-fatal errors to the error stream.
    pub fn flush_warnings(&mut self) -> ApplicationResult<()> {
        self.warnings
            .drain_into(self.err)
            .with_context("write warnings")?;
        Ok(())
    }

    /// Print a progress line unless silenced.
    pub fn progress(&mut self, line: std::fmt::Arguments<'_>) -> ApplicationResult<()> {
        if !self.params.silent {
            writeln!(self.out, "{}", line).with_context("write output")?;
        }
        Ok(())
    }
}

/// Runs tasks against a version control server.
pub struct TaskRunner {
    connector: Arc<dyn Connector>,
    fs: Arc<dyn FileSystem>,
    prompter: Arc<dyn Prompter>,
}

impl TaskRunner {
    pub fn new(
        connector: Arc<dyn Connector>,
        fs: Arc<dyn FileSystem>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            connector,
            fs,
            prompter,
        }
    }

    /// Execute one task to completion.
    #[instrument(skip_all, fields(url = %params.server_url, path = %params.project_path))]
    pub fn run(
        &self,
        params: &ConnectionParams,
        task: &Task,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ApplicationResult<Stage> {
        let mut stage = Stage::Created;
        debug!("stage: {:?}", stage);

        if params.verbose {
            writeln!(out, "Server Url:   {}", params.server_url).with_context("write output")?;
            writeln!(out, "Project Path: {}", params.project_path).with_context("write output")?;
        }

        let (notifier, warnings) = WarningQueue::channel();
        let vc = self.authenticate(params, notifier)?;
        stage = Stage::Authenticated;
        debug!("stage: {:?}", stage);

        let mut session = Session::new(vc.as_ref(), self.fs.as_ref(), params, out, err, &warnings);
        stage = Stage::Processing;
        debug!("stage: {:?}", stage);
        let result = match task {
            Task::Copy(t) => copy::run(&mut session, t),
            Task::History(t) => history::run(&mut session, t),
            Task::Backup(t) => backup::run(&mut session, t),
        };
        // report what the client queued even when processing failed
        let flushed = session.flush_warnings();
        match (result, flushed) {
            (Err(e), Err(flush_err)) => {
                warn!("dropping queued warnings: {}", flush_err);
                return Err(e);
            }
            (result, flushed) => {
                result?;
                flushed?;
            }
        }

        stage = Stage::Done;
        debug!("stage: {:?}", stage);
        Ok(stage)
    }

    /// Connect and authenticate, prompting once for a missing password.
    fn authenticate(
        &self,
        params: &ConnectionParams,
        notifier: Notifier,
    ) -> ApplicationResult<Box<dyn VersionControl>> {
        let url = &params.server_url;
        let credential = params.credential.as_ref();
        let vc = self.connector.connect(url, credential, notifier.clone())?;

        match vc.authenticate() {
            Ok(user) => {
                info!("authenticated as {}", user);
                Ok(vc)
            }
            Err(RemoteError::Unauthorized(message)) => match credential {
                Some(cred) if cred.may_prompt() => {
                    debug!("authentication rejected, prompting for password: {}", message);
                    drop(vc);
                    let password = self
                        .prompter
                        .prompt_password(&cred.user, url)
                        .map_err(|e| auth_failed(e.to_string()))?;
                    let cred = cred.with_password(password);
                    let vc = self.connector.connect(url, Some(&cred), notifier)?;
                    let user = vc.authenticate().map_err(|e| auth_failed(e.to_string()))?;
                    info!("authenticated as {}", user);
                    Ok(vc)
                }
                _ => Err(auth_failed(message)),
            },
            Err(e) => Err(auth_failed(e.to_string())),
        }
    }
}

fn auth_failed(message: String) -> ApplicationError {
    ApplicationError::AuthenticationFailed { message }
}
