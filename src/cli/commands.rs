//! Command dispatch: turn parsed arguments into a task run

use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{BackupTask, CopyTask, HistoryTask, RenderOptions};
use crate::application::{ConnectionParams, Task};
use crate::cli::args::{Cli, Commands, ConfigCommands, ConnectionArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Credential, VersionRange, VersionSpec};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Config { command } => execute_config(command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        _ => {
            let settings = Settings::load()?;
            let container = ServiceContainer::new(settings);
            let stdout = io::stdout();
            let stderr = io::stderr();
            execute_task(
                &cli.command,
                &container,
                &mut stdout.lock(),
                &mut stderr.lock(),
            )
        }
    }
}

/// Run a server verb with the container's collaborators.
#[instrument(skip_all)]
pub fn execute_task(
    command: &Commands,
    container: &ServiceContainer,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> CliResult<()> {
    let (conn, task) = build_task(command, &container.settings)?;
    let params = connection_params(conn)?;
    debug!("params: {:?}", params);

    let runner = container.task_runner();
    let stage = runner.run(&params, &task, out, err)?;
    debug!("finished at stage {:?}", stage);
    out.flush()
        .map_err(|e| InfraError::io("flush output", e))?;
    Ok(())
}

/// Parse version arguments into the verb's task. Fails before any connection is made.
pub fn build_task<'a>(
    command: &'a Commands,
    settings: &Settings,
) -> CliResult<(&'a ConnectionArgs, Task)> {
    match command {
        Commands::Copy { conn } => {
            let version = VersionSpec::resolve_single(conn.version.as_deref())?;
            Ok((conn, Task::Copy(CopyTask { version })))
        }
        Commands::History {
            conn,
            format,
            comments,
        } => {
            let range = VersionRange::parse(conn.version.as_deref())?;
            let options = RenderOptions {
                csv_separator: settings.csv_separator(),
                utc_dates: settings.history.utc_dates,
            };
            Ok((
                conn,
                Task::History(HistoryTask {
                    range,
                    format: (*format).into(),
                    use_comments: *comments,
                    options,
                }),
            ))
        }
        Commands::Backup { conn } => {
            let range = VersionRange::parse(conn.version.as_deref())?;
            Ok((conn, Task::Backup(BackupTask { range })))
        }
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::InvalidArgs(
            "not a server command".to_string(),
        )),
    }
}

/// Resolve shared arguments: expand the target path and the login.
pub fn connection_params(conn: &ConnectionArgs) -> CliResult<ConnectionParams> {
    let target = shellexpand::full(&conn.target_path)
        .map_err(|e| CliError::InvalidArgs(format!("target path: {}", e)))?;
    Ok(ConnectionParams {
        server_url: conn.server_url.clone(),
        project_path: conn.project_path.clone(),
        target_path: PathBuf::from(target.as_ref()),
        credential: conn.login.as_deref().and_then(Credential::parse_login),
        verbose: conn.verbose,
        silent: conn.silent,
    })
}

fn execute_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let marker = if path.exists() { "" } else { " (not found)" };
                    output::info(&format!("{}{}", path.display(), marker));
                }
                None => output::warning("cannot determine config directory"),
            }
            Ok(())
        }
        ConfigCommands::Init => {
            let path = global_config_path().ok_or_else(|| InfraError::Config {
                message: "cannot determine config directory".to_string(),
            })?;
            if path.exists() {
                return Err(InfraError::Config {
                    message: format!("config already exists: {}", path.display()),
                }
                .into());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("Created {}", path.display()));
            Ok(())
        }
    }
}
