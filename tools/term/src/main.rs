//! `tsh`: the T-TERM shell on process stdio.
//!
//! Reads commands from standard input until end of input. Configuration comes
//! from `TSH_LOG`, `TSH_MAX_LINE` and `TSH_BURN_FACTOR`.

use std::process::ExitCode;

use tickos_term::host::{config_from_env, init_logging, StdConsole};
use tickos_term::Shell;

fn main() -> ExitCode {
    let (config, warnings) = config_from_env();
    for warning in &warnings {
        eprintln!("tsh: {}", warning);
    }
    if let Err(err) = init_logging(config.log_level) {
        eprintln!("tsh: logger unavailable: {}", err);
    }

    let mut shell = Shell::new(StdConsole::stdio(), config);
    match shell.run() {
        Ok(status) => {
            log::info!("tsh: finished with {:?}", status);
            // Only the low byte reaches the parent.
            ExitCode::from((status.code() & 0xff) as u8)
        }
        Err(err) => {
            log::error!("tsh: {}", err);
            ExitCode::FAILURE
        }
    }
}
