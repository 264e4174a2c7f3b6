use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_FILE: Mutex<Option<std::fs::File>> = Mutex::new(None);

/// Initialize logging system
/// - Console logging is ONLY enabled when RUST_LOG is set
/// - File logging is enabled when SANDCALL_LOG_TO_FILE is set (per-run setup later)
pub fn init_logging() {
    let rust_log_present = env::var("RUST_LOG").is_ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if rust_log_present {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(env_filter).init();
    }
}

/// Setup file logging for a single run
/// Call this once the run ID is known
pub fn setup_run_file_logging(run_id: &str) -> anyhow::Result<()> {
    if env::var("SANDCALL_LOG_TO_FILE").is_err() {
        return Ok(());
    }

    let logs_dir = get_logs_dir()?;
    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir)?;
    }

    let log_file_path = logs_dir.join(format!("{}.log", run_id));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }

    log_info(&format!(
        "File logging enabled: {}",
        log_file_path.display()
    ));

    Ok(())
}

fn get_logs_dir() -> anyhow::Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home_dir.join(".sandcall").join("logs"))
}

fn write_to_file(level: &str, target: &str, msg: &str) {
    if let Ok(mut guard) = LOG_FILE.lock()
        && let Some(ref mut file) = *guard
    {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] [{}] [{}] {}", timestamp, level, target, msg);
        let _ = file.flush();
    }
}

pub fn log_error(msg: &str) {
    error!("{msg}");
    write_to_file("ERROR", "sandcall", msg);
}

pub fn log_warn(msg: &str) {
    warn!("{msg}");
    write_to_file("WARN", "sandcall", msg);
}

pub fn log_info(msg: &str) {
    info!("{msg}");
    write_to_file("INFO", "sandcall", msg);
}

pub fn log_debug(msg: &str) {
    debug!("{msg}");
    write_to_file("DEBUG", "sandcall", msg);
}

pub fn log_trace(msg: &str) {
    trace!("{msg}");
    write_to_file("TRACE", "sandcall", msg);
}

/// Record one dispatched tool call in the run log
pub fn log_tool_call(name: &str, arguments: &str, outcome: &str, failed: bool) {
    let msg = format!(
        "{} {}({}) -> {}",
        if failed { "failed" } else { "ok" },
        name,
        arguments,
        summarize_output(outcome)
    );
    if failed {
        warn!(target: "sandcall::tool", "{msg}");
    } else {
        info!(target: "sandcall::tool", "{msg}");
    }
    write_to_file("TOOL", "sandcall::tool", &msg);
}

/// Closing line of the run log: how many tool calls ran and how many failed
pub fn log_run_summary(calls: usize, failures: usize, usage: &str) {
    log_info(&format!(
        "Run finished: {} tool call(s), {} failed, tokens {}",
        calls, failures, usage
    ));
}

const SUMMARY_CHARS: usize = 120;

/// First line of a tool output, shortened for the log
fn summarize_output(output: &str) -> String {
    let total = output.chars().count();
    let first_line = output.lines().next().unwrap_or("");
    let mut summary: String = first_line.chars().take(SUMMARY_CHARS).collect();
    if summary.chars().count() < total {
        summary.push_str(&format!("... ({} chars)", total));
    }
    summary
}
