//! Hosted support: a console over process stdio, a stderr logger and
//! environment configuration.

use std::io::{self, BufRead, ErrorKind, Stderr, StdinLock, Stdout, Write};
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::console::{Console, ConsoleError};
use crate::session::ShellConfig;

/// Log level variable.
pub const ENV_LOG: &str = "TSH_LOG";

/// Input read size variable.
pub const ENV_MAX_LINE: &str = "TSH_MAX_LINE";

/// Burn task spin factor variable.
pub const ENV_BURN_FACTOR: &str = "TSH_BURN_FACTOR";

/// Console over arbitrary byte streams.
pub struct StdConsole<R, W, E> {
    input: R,
    out: W,
    err: E,
    start: Instant,
}

impl StdConsole<StdinLock<'static>, Stdout, Stderr> {
    /// Console over the process's standard streams.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout(), io::stderr())
    }
}

impl<R: BufRead, W: Write, E: Write> StdConsole<R, W, E> {
    pub fn new(input: R, out: W, err: E) -> Self {
        Self {
            input,
            out,
            err,
            start: Instant::now(),
        }
    }

    /// Takes the console apart.
    pub fn into_parts(self) -> (R, W, E) {
        (self.input, self.out, self.err)
    }
}

impl<R: BufRead, W: Write, E: Write> Console for StdConsole<R, W, E> {
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize, ConsoleError> {
        let max = limit.saturating_sub(1);
        let mut read = 0;

        while read < max {
            let available = match self.input.fill_buf() {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    log::error!("console: read failed: {}", err);
                    return Err(ConsoleError::Read);
                }
            };
            if available.is_empty() {
                break;
            }

            let room = (max - read).min(available.len());
            let (len, line_done) = match available[..room].iter().position(|&b| b == b'\n') {
                Some(newline) => (newline + 1, true),
                None => (room, false),
            };
            buf.extend_from_slice(&available[..len]);
            self.input.consume(len);
            read += len;

            if line_done {
                break;
            }
        }

        Ok(read)
    }

    fn write_out(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        write_flushed(&mut self.out, bytes)
    }

    fn write_err(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        write_flushed(&mut self.err, bytes)
    }

    fn uptime_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

fn write_flushed(stream: &mut dyn Write, bytes: &[u8]) -> Result<(), ConsoleError> {
    stream
        .write_all(bytes)
        .and_then(|()| stream.flush())
        .map_err(|err| {
            log::debug!("console: write failed: {}", err);
            ConsoleError::Write
        })
}

// =============================================================================
// Logging
// =============================================================================

/// Writes `[LEVEL target] message` lines to stderr.
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(
                io::stderr(),
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Installs [`StderrLogger`] as the global logger.
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(Box::leak(Box::new(StderrLogger::new(level))))?;
    log::set_max_level(level);
    Ok(())
}

// =============================================================================
// Configuration
// =============================================================================

/// Builds a configuration from the process environment.
pub fn config_from_env() -> (ShellConfig, Vec<String>) {
    config_from_vars(|name| std::env::var(name).ok())
}

/// Overlays variables from `get` on the default configuration.
///
/// Returns the configuration and one warning per ignored value.
pub fn config_from_vars<F>(get: F) -> (ShellConfig, Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ShellConfig::default();
    let mut warnings = Vec::new();

    if let Some(value) = get(ENV_LOG) {
        match value.trim().parse::<LevelFilter>() {
            Ok(level) => config.log_level = level,
            Err(_) => warnings.push(ignored(ENV_LOG, &value, "not a log level")),
        }
    }

    if let Some(value) = get(ENV_MAX_LINE) {
        match value.trim().parse::<usize>() {
            Ok(len) if len >= 2 => config.max_line_len = len,
            _ => warnings.push(ignored(ENV_MAX_LINE, &value, "expected an integer >= 2")),
        }
    }

    if let Some(value) = get(ENV_BURN_FACTOR) {
        match value.trim().parse::<u64>() {
            Ok(factor) => config.burn_factor = factor,
            Err(_) => warnings.push(ignored(ENV_BURN_FACTOR, &value, "expected an integer")),
        }
    }

    (config, warnings)
}

fn ignored(name: &str, value: &str, reason: &str) -> String {
    format!("ignoring {}={:?}: {}", name, value, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    type TestConsole = StdConsole<Cursor<Vec<u8>>, Vec<u8>, Vec<u8>>;

    fn console(input: &str) -> TestConsole {
        StdConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), Vec::new())
    }

    fn lines(console: &mut TestConsole, limit: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if console.read_line(&mut buf, limit).unwrap() == 0 {
                return lines;
            }
            lines.push(String::from_utf8(buf.clone()).unwrap());
        }
    }

    #[test]
    fn test_read_line_keeps_newline() {
        let mut console = console("echo a\n\nretcode");
        assert_eq!(lines(&mut console, 1024), ["echo a\n", "\n", "retcode"]);
    }

    #[test]
    fn test_read_line_splits_long_lines() {
        let mut console = console("abcdefg\nhi\n");
        assert_eq!(lines(&mut console, 4), ["abc", "def", "g\n", "hi\n"]);
    }

    #[test]
    fn test_read_line_across_small_buffers() {
        let input = io::BufReader::with_capacity(2, Cursor::new(b"echo hello\nx\n".to_vec()));
        let mut console = StdConsole::new(input, Vec::new(), Vec::new());
        let mut buf = Vec::new();
        assert_eq!(console.read_line(&mut buf, 1024).unwrap(), 11);
        assert_eq!(buf, b"echo hello\n");
    }

    #[test]
    fn test_writes_reach_streams() {
        let mut console = console("");
        console.print("out\n").unwrap();
        console.eprint("err\n").unwrap();
        let (_, out, err) = console.into_parts();
        assert_eq!(out, b"out\n");
        assert_eq!(err, b"err\n");
    }

    #[test]
    fn test_config_defaults_without_vars() {
        let (config, warnings) = config_from_vars(|_| None);
        assert!(warnings.is_empty());
        assert_eq!(config.max_line_len, 1024);
        assert_eq!(config.burn_factor, 100_000);
        assert_eq!(config.log_level, LevelFilter::Warn);
    }

    #[test]
    fn test_config_overlay() {
        let vars: HashMap<&str, &str> = [
            (ENV_LOG, "debug"),
            (ENV_MAX_LINE, "64"),
            (ENV_BURN_FACTOR, "10"),
        ]
        .into_iter()
        .collect();

        let (config, warnings) = config_from_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert!(warnings.is_empty());
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.max_line_len, 64);
        assert_eq!(config.burn_factor, 10);
    }

    #[test]
    fn test_config_bad_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            (ENV_LOG, "chatty"),
            (ENV_MAX_LINE, "1"),
            (ENV_BURN_FACTOR, "-3"),
        ]
        .into_iter()
        .collect();

        let (config, warnings) = config_from_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].starts_with("ignoring TSH_LOG=\"chatty\""));
        assert_eq!(config.max_line_len, 1024);
        assert_eq!(config.burn_factor, 100_000);
    }

    #[test]
    fn test_logger_filters_by_level() {
        let logger = StderrLogger::new(LevelFilter::Info);
        let debug = Metadata::builder().level(log::Level::Debug).build();
        let warn = Metadata::builder().level(log::Level::Warn).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&warn));
    }
}
