//! Engine backed by operator-configured external commands.
//!
//! Exit-code conventions:
//! - compatibility: 0 ready, 1 needs conditioning, anything else is a failure
//! - conditioning / configuration: 0 success
//! - service: the exit code is the result code; signals are errors
//!
//! The service command's output goes to `service.log` in the data directory
//! rather than a pipe, so a command that leaves the service running in the
//! background still returns as soon as the command itself exits.
use super::{Engine, EngineContext, EngineError, StartupConfiguration};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

/// Environment variable exported to every engine command.
pub const DATA_DIR_ENV: &str = "MLAUNCH_DATA_DIR";

const COMPATIBLE_EXIT: i32 = 0;
const NEEDS_CONDITIONING_EXIT: i32 = 1;
const STDERR_DETAIL_LIMIT: usize = 500;
/// Receives the service command's stdout and stderr.
pub const SERVICE_LOG_NAME: &str = "service.log";

/// Parsed argv for each engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    pub compatibility: Vec<String>,
    pub conditioning: Option<Vec<String>>,
    pub configuration: Vec<String>,
    pub service: Vec<String>,
}

#[derive(Debug)]
struct Invocation {
    program: PathBuf,
    args: Vec<String>,
}

#[derive(Debug)]
struct Resolved {
    data_dir: PathBuf,
    compatibility: Invocation,
    conditioning: Option<Invocation>,
    configuration: Invocation,
    service: Invocation,
}

struct CommandOutput {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

pub struct ProcessEngine {
    commands: CommandSet,
    resolved: OnceLock<Resolved>,
}

impl ProcessEngine {
    pub fn new(commands: CommandSet) -> Self {
        Self {
            commands,
            resolved: OnceLock::new(),
        }
    }

    fn resolved(&self) -> Result<&Resolved, EngineError> {
        self.resolved.get().ok_or(EngineError::NotInitialized)
    }
}

impl Engine for ProcessEngine {
    fn initialize(&self, context: &EngineContext) -> Result<(), EngineError> {
        if self.resolved.get().is_some() {
            tracing::debug!("engine already initialized");
            return Ok(());
        }
        let resolved = resolve(&self.commands, &context.data_dir)?;
        tracing::info!(data_dir = %resolved.data_dir.display(), "engine initialized");
        // A concurrent initialize may have won; either value is equivalent.
        let _ = self.resolved.set(resolved);
        Ok(())
    }

    fn check_compatibility(&self) -> Result<bool, EngineError> {
        let resolved = self.resolved()?;
        let output = run(&resolved.compatibility, &resolved.data_dir, "compatibility")
            .map_err(EngineError::CompatibilityCheckFailed)?;
        match output.code {
            Some(COMPATIBLE_EXIT) => Ok(true),
            Some(NEEDS_CONDITIONING_EXIT) => Ok(false),
            _ => Err(EngineError::CompatibilityCheckFailed(failure_detail(
                &output,
            ))),
        }
    }

    fn apply_conditioning(&self) -> Result<(), EngineError> {
        let resolved = self.resolved()?;
        let Some(invocation) = resolved.conditioning.as_ref() else {
            tracing::debug!("no conditioning command configured");
            return Ok(());
        };
        let output = run(invocation, &resolved.data_dir, "conditioning")
            .map_err(EngineError::ConditioningFailed)?;
        if output.code != Some(0) {
            return Err(EngineError::ConditioningFailed(failure_detail(&output)));
        }
        Ok(())
    }

    fn load_configuration(&self) -> Result<StartupConfiguration, EngineError> {
        let resolved = self.resolved()?;
        let output = run(&resolved.configuration, &resolved.data_dir, "configuration")
            .map_err(EngineError::ConfigurationLoadFailed)?;
        if output.code != Some(0) {
            return Err(EngineError::ConfigurationLoadFailed(failure_detail(
                &output,
            )));
        }
        Ok(StartupConfiguration::new(output.stdout.trim()))
    }

    fn start_service(&self) -> Result<i32, EngineError> {
        let resolved = self.resolved()?;
        let log_path = resolved.data_dir.join(SERVICE_LOG_NAME);
        let code = run_logged(&resolved.service, &resolved.data_dir, &log_path, "service")
            .map_err(EngineError::ServiceStartFailed)?;
        code.ok_or_else(|| {
            EngineError::ServiceStartFailed(format!(
                "terminated by signal (output in {})",
                log_path.display()
            ))
        })
    }
}

fn resolve(commands: &CommandSet, data_dir: &Path) -> Result<Resolved, EngineError> {
    fs::create_dir_all(data_dir).map_err(|err| {
        EngineError::InitializationFailed(format!(
            "create data dir {}: {err}",
            data_dir.display()
        ))
    })?;
    let data_dir = data_dir.canonicalize().map_err(|err| {
        EngineError::InitializationFailed(format!(
            "resolve data dir {}: {err}",
            data_dir.display()
        ))
    })?;
    let compatibility = invocation(&commands.compatibility, &data_dir, "compatibility")?;
    let conditioning = commands
        .conditioning
        .as_ref()
        .map(|argv| invocation(argv, &data_dir, "conditioning"))
        .transpose()?;
    let configuration = invocation(&commands.configuration, &data_dir, "configuration")?;
    let service = invocation(&commands.service, &data_dir, "service")?;
    Ok(Resolved {
        data_dir,
        compatibility,
        conditioning,
        configuration,
        service,
    })
}

fn invocation(argv: &[String], data_dir: &Path, label: &str) -> Result<Invocation, EngineError> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        EngineError::InitializationFailed(format!("{label} command is empty"))
    })?;
    let search_path: Option<OsString> = std::env::var_os("PATH");
    let program = which::which_in(program, search_path, data_dir).map_err(|err| {
        EngineError::InitializationFailed(format!(
            "{label} command program {program:?} not found: {err}"
        ))
    })?;
    Ok(Invocation {
        program,
        args: args.to_vec(),
    })
}

fn command(invocation: &Invocation, data_dir: &Path) -> Command {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .current_dir(data_dir)
        .env(DATA_DIR_ENV, data_dir)
        .stdin(Stdio::null());
    command
}

fn run(invocation: &Invocation, data_dir: &Path, operation: &str) -> Result<CommandOutput, String> {
    let start = Instant::now();
    let output = command(invocation, data_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| format!("spawn {}: {err}", invocation.program.display()))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::info!(
        operation,
        exit_code = ?output.status.code(),
        elapsed_ms,
        "engine command complete"
    );

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run with stdout and stderr appended to `log_path`; returns the exit code.
///
/// Background children inherit the log file, not a pipe, so only the command
/// itself is waited for.
fn run_logged(
    invocation: &Invocation,
    data_dir: &Path,
    log_path: &Path,
    operation: &str,
) -> Result<Option<i32>, String> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|err| format!("open {}: {err}", log_path.display()))?;
    let log_err = log
        .try_clone()
        .map_err(|err| format!("open {}: {err}", log_path.display()))?;
    let start = Instant::now();
    let mut child = command(invocation, data_dir)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|err| format!("spawn {}: {err}", invocation.program.display()))?;
    let status = child
        .wait()
        .map_err(|err| format!("wait for {}: {err}", invocation.program.display()))?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::info!(
        operation,
        exit_code = ?status.code(),
        elapsed_ms,
        log = %log_path.display(),
        "engine command complete"
    );

    Ok(status.code())
}

fn failure_detail(output: &CommandOutput) -> String {
    let status = match output.code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        return status;
    }
    let mut detail = String::new();
    for ch in stderr.chars() {
        if detail.len() + ch.len_utf8() > STDERR_DETAIL_LIMIT {
            break;
        }
        detail.push(ch);
    }
    format!("{status}: {detail}")
}
