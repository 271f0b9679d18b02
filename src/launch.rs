//! Command implementations behind `init` and `run`.
use crate::bootstrap::driver::{Driver, DriverOptions, RunOutcome};
use crate::bootstrap::UiControlState;
use crate::cli::{InitArgs, RunArgs};
use crate::config::{self, LauncherConfig};
use crate::engine::{self, EngineContext};
use crate::report::{write_report, RunReport};
use crate::ui::{spawn_line_pump, AutoStart, KeyPump, Presenter, TextPresenter, TuiPresenter};
use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";
const LOG_FILE_NAME: &str = "mlaunch.log";
const AUTO_START_ATTEMPTS: u32 = 1;

/// Write the default config, refusing to clobber an existing one.
pub fn run_init(args: &InitArgs) -> Result<()> {
    let config_path = config_path(args.config.as_deref())?;
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    config::write_config(&config_path, &config::default_config())?;
    println!("wrote {}", config_path.display());
    Ok(())
}

/// Run the bootstrap. Succeeds only when the service reached `Running`.
pub fn run_launch(args: &RunArgs) -> Result<()> {
    let config_path = config_path(args.config.as_deref())?;
    let launcher = config::load_config(&config_path)?;
    config::validate_config(&launcher)
        .with_context(|| format!("validate {}", config_path.display()))?;
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config::resolve_data_dir(&launcher, &config_path));
    let interactive = !args.text && io::stdin().is_terminal() && io::stdout().is_terminal();
    init_logging(args.log_file.as_deref(), interactive, &data_dir)?;
    tracing::info!(
        config = %config_path.display(),
        data_dir = %data_dir.display(),
        interactive,
        "launcher starting"
    );

    let engine = engine::binding::shared(config::command_set(&launcher.engine)?);
    engine
        .initialize(&EngineContext {
            data_dir: data_dir.clone(),
        })
        .context("initialize media engine")?;

    let delay_ms = args.delay_ms.unwrap_or(launcher.startup_delay_ms);
    let mut driver = Driver::new(
        engine,
        DriverOptions {
            startup_delay: Duration::from_millis(delay_ms),
            linger_on_failure: interactive,
        },
    );
    let outcome = if interactive {
        run_tui(&mut driver, &launcher, args.auto_start)?
    } else {
        run_text(&mut driver, &launcher, args.auto_start)?
    };

    if let Some(path) = args.report.as_deref() {
        let report = RunReport::new(driver.journal(), &outcome, driver.stage());
        write_report(path, &report)?;
        tracing::info!(path = %path.display(), "run report written");
    }

    match outcome {
        RunOutcome::Dismissed => Ok(()),
        RunOutcome::Failed(reason) => Err(anyhow!("media center setup failed: {reason}")),
        RunOutcome::Quit(stage) => Err(anyhow!("launcher quit while {stage}")),
    }
}

fn run_tui(driver: &mut Driver, launcher: &LauncherConfig, auto_start: bool) -> Result<RunOutcome> {
    let handle = driver.handle();
    let tui = TuiPresenter::stdout(
        &launcher.action_label,
        UiControlState::for_stage(driver.stage()),
    )?;
    let _keys = KeyPump::spawn(handle.clone())?;
    let mut presenter: Box<dyn Presenter> = Box::new(tui);
    if auto_start {
        presenter = Box::new(AutoStart::new(presenter, handle, AUTO_START_ATTEMPTS, false));
    }
    driver.run(presenter.as_mut())
}

fn run_text(driver: &mut Driver, launcher: &LauncherConfig, auto_start: bool) -> Result<RunOutcome> {
    let handle = driver.handle();
    let text = TextPresenter::stdio(&launcher.action_label, !auto_start);
    let mut presenter: Box<dyn Presenter> = Box::new(text);
    if auto_start {
        // Nobody is reading input, so give up once the attempt is spent.
        presenter = Box::new(AutoStart::new(presenter, handle, AUTO_START_ATTEMPTS, true));
    } else {
        spawn_line_pump(handle)?;
    }
    driver.run(presenter.as_mut())
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config::default_config_path(),
    }
}

/// Logs go to `log_file`, else to the data dir while the TUI owns the
/// terminal, else to stderr.
fn init_logging(log_file: Option<&Path>, interactive: bool, data_dir: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let path = match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if interactive => Some(data_dir.join(LOG_FILE_NAME)),
        None => None,
    };
    let installed = match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("create log dir")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
    };
    installed.map_err(|err| anyhow!("install log subscriber: {err}"))
}
