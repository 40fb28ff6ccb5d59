mod term;

pub use term::CrosstermTerminal;

use getopts::Options;
use ptpmon::{ConsoleConfig, StartAt};
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_idle_ms() -> u64 {
    ConsoleConfig::default().idle.as_millis() as u64
}

pub fn monitor_opts() -> Options {
    let mut opts = Options::new();
    opts.optflag("h", "help", "Show help");
    opts.optflag(
        "e",
        "from-end",
        "Only show records written from now on (by default the whole log is replayed first)",
    );
    opts.optopt(
        "i",
        "idle-ms",
        &format!(
            "Pause when the log has nothing new (default {})",
            default_idle_ms()
        ),
        "ms",
    );
    opts.optopt("l", "log-file", "Write diagnostics to this file", "path");
    opts
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// JSON Lines file written by the remote monitor.
    pub log_path: PathBuf,
    pub start: StartAt,
    pub console: ConsoleConfig,
    pub diagnostics: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    Help,
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Help => write!(f, "help requested"),
            CliError::Usage(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {}

pub fn usage(opts: &Options, program: &str) -> String {
    let brief = format!(
        "Usage: {program} [options] <remote-monitor.jsonl>\n\n\
         Live console for remote PTP nodes, fed by the remote monitor's JSON Lines log.\n\
         Keys: 0-9 show event, c clear events, space clear shown event, \
         esc close, ^L redraw, q quit."
    );
    opts.usage(&brief)
}

/// Parses the arguments that follow the program name.
pub fn parse_monitor_args(opts: &Options, args: &[String]) -> Result<MonitorConfig, CliError> {
    let matches = opts
        .parse(args)
        .map_err(|f| CliError::Usage(f.to_string()))?;
    if matches.opt_present("help") {
        return Err(CliError::Help);
    }

    let log_path = match matches.free.as_slice() {
        [path] => PathBuf::from(path),
        [] => {
            return Err(CliError::Usage(
                "a single argument must be supplied with the path to the JSON Lines remote monitoring log"
                    .to_string(),
            ))
        }
        _ => return Err(CliError::Usage("too many arguments".to_string())),
    };

    let idle_ms = matches
        .opt_str("idle-ms")
        .and_then(|ms| ms.parse::<u64>().ok())
        .unwrap_or_else(default_idle_ms)
        .max(1);

    let start = if matches.opt_present("from-end") {
        StartAt::End
    } else {
        StartAt::Beginning
    };

    Ok(MonitorConfig {
        log_path,
        start,
        console: ConsoleConfig {
            idle: Duration::from_millis(idle_ms),
        },
        diagnostics: matches.opt_str("log-file").map(PathBuf::from),
    })
}

/// Sends `log` output to `path`. The screen belongs to the console, so
/// there is no logging unless a file is given.
pub fn init_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
