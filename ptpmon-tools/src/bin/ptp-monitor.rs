// ptp-monitor
//
// Live console for remote PTP nodes, driven by the JSON Lines log that the
// remote monitor writes.
//
// Build: cargo run --release --bin ptp-monitor -- [options] <remote-monitor.jsonl>
// Quit:  q / Ctrl-C

use log::{error, info};
use ptpmon::{Console, LogTail};
use ptpmon_tools::{
    init_logging, monitor_opts, parse_monitor_args, usage, CliError, CrosstermTerminal,
};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "ptp-monitor".into());
    let opts = monitor_opts();

    let config = match parse_monitor_args(&opts, args.get(1..).unwrap_or(&[])) {
        Ok(config) => config,
        Err(CliError::Help) => {
            println!("{}", usage(&opts, &program));
            return ExitCode::SUCCESS;
        }
        Err(CliError::Usage(msg)) => {
            eprintln!("{}\n", msg);
            eprintln!("{}", usage(&opts, &program));
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &config.diagnostics {
        if let Err(e) = init_logging(path) {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let tail = match LogTail::open(&config.log_path, config.start) {
        Ok(tail) => tail,
        Err(e) => {
            eprintln!("Failed to open {}: {}", config.log_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "monitoring {} from offset {}",
        config.log_path.display(),
        tail.offset()
    );

    let tui = match CrosstermTerminal::setup() {
        Ok(tui) => tui,
        Err(e) => {
            eprintln!("Failed to set up terminal: {}", e);
            return ExitCode::FAILURE;
        }
    };
    CrosstermTerminal::install_panic_hook();

    // The console owns the terminal; it is restored when the console is dropped.
    let result = Console::new(tui, tail, config.console).and_then(|mut console| {
        let res = console.run();
        let stats = console.monitor().stats();
        info!(
            "read {} lines ({} malformed, {} integrity warnings), raised {} events",
            stats.lines, stats.malformed, stats.integrity_warnings, stats.triggers
        );
        res
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}: {}", program, e);
            ExitCode::FAILURE
        }
    }
}
