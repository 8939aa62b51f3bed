use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const DEFAULT_FILTER: &str = "hoops_terminal=info,warn";
const LOG_FILE: &str = "hoops-terminal.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$HOOPS_LOG_DIR`, else `$XDG_STATE_HOME/hoops_terminal`, else `~/.local/state/hoops_terminal`.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return dir.clone();
    }
    let base = env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
        })
        .unwrap_or_else(env::temp_dir);
    base.join("hoops_terminal")
}

/// Daily-rolling file log for the TUI, which owns stdout. Keep the guard alive until exit.
pub fn init_file_logging(config: &Config) -> anyhow::Result<WorkerGuard> {
    let dir = log_dir(config);
    fs::create_dir_all(&dir).with_context(|| format!("create log dir {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(layer)
        .try_init()
        .context("install log subscriber")?;

    install_panic_hook();
    tracing::info!(dir = %dir.display(), api = %config.api_url, "logging initialized");
    Ok(guard)
}

/// Plain stderr logging for one-shot commands.
pub fn init_stderr_logging() {
    let layer = fmt::layer().with_writer(io::stderr).with_target(false);
    if tracing_subscriber::registry()
        .with(env_filter())
        .with(layer)
        .try_init()
        .is_err()
    {
        eprintln!("logging already initialized");
    }
}

fn install_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "panic");
        default_panic(info);
    }));
}
