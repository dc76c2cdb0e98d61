//! Console abstraction.
//!
//! The shell talks to its operator through a [`Console`]: one line-oriented
//! input stream, a primary output stream and an error stream. The hosted
//! implementation lives in `host`; [`ScriptedConsole`] is an in-memory
//! console for scripted runs and tests.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use tickos_sched::TaskEnv;

/// Console errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// Reading input failed
    Read,
    /// Writing output failed
    Write,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Read => write!(f, "read failed"),
            ConsoleError::Write => write!(f, "write failed"),
        }
    }
}

/// Operator console.
pub trait Console {
    /// Reads one line into `buf`, `fgets`-style.
    ///
    /// At most `limit - 1` bytes are read; the newline is kept when it fits.
    /// The rest of a longer line is returned by the following reads.
    /// Returns the number of bytes read, 0 at end of input.
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize, ConsoleError>;

    /// Writes to the primary output stream.
    fn write_out(&mut self, bytes: &[u8]) -> Result<(), ConsoleError>;

    /// Writes to the error stream.
    fn write_err(&mut self, bytes: &[u8]) -> Result<(), ConsoleError>;

    /// Host milliseconds since the console was opened.
    fn uptime_ms(&self) -> u64 {
        0
    }

    /// Writes a string to the primary output stream.
    fn print(&mut self, s: &str) -> Result<(), ConsoleError> {
        self.write_out(s.as_bytes())
    }

    /// Writes a string to the error stream.
    fn eprint(&mut self, s: &str) -> Result<(), ConsoleError> {
        self.write_err(s.as_bytes())
    }
}

/// Lends a console to scheduler tasks for the duration of a run.
pub struct TaskConsole<'a> {
    console: &'a mut dyn Console,
}

impl<'a> TaskConsole<'a> {
    pub fn new(console: &'a mut dyn Console) -> Self {
        Self { console }
    }
}

impl TaskEnv for TaskConsole<'_> {
    fn print(&mut self, s: &str) -> fmt::Result {
        self.console.print(s).map_err(|_| fmt::Error)
    }

    fn uptime_ms(&self) -> u64 {
        self.console.uptime_ms()
    }
}

// =============================================================================
// Scripted Console
// =============================================================================

/// In-memory console fed from a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: Vec<u8>,
    pos: usize,
    out: Vec<u8>,
    err: Vec<u8>,
    fail_in: bool,
    fail_out: bool,
    clock_ms: u64,
}

impl ScriptedConsole {
    /// Creates a console whose input is `script`.
    pub fn new(script: &str) -> Self {
        Self {
            input: script.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    /// Appends more input.
    pub fn push_input(&mut self, script: &str) {
        self.input.extend_from_slice(script.as_bytes());
    }

    /// Everything written to the primary output so far.
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    /// Everything written to the error stream so far.
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }

    /// Discards captured output.
    pub fn clear_output(&mut self) {
        self.out.clear();
        self.err.clear();
    }

    /// Makes every input read fail.
    pub fn fail_read(&mut self, fail: bool) {
        self.fail_in = fail;
    }

    /// Makes every primary-output write fail.
    pub fn fail_stdout(&mut self, fail: bool) {
        self.fail_out = fail;
    }

    /// Moves the host clock forward.
    pub fn advance_clock(&mut self, ms: u64) {
        self.clock_ms += ms;
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize, ConsoleError> {
        if self.fail_in {
            return Err(ConsoleError::Read);
        }
        let rest = &self.input[self.pos..];
        let room = limit.saturating_sub(1).min(rest.len());
        let len = match rest[..room].iter().position(|&b| b == b'\n') {
            Some(newline) => newline + 1,
            None => room,
        };

        buf.extend_from_slice(&rest[..len]);
        self.pos += len;
        Ok(len)
    }

    fn write_out(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        if self.fail_out {
            return Err(ConsoleError::Write);
        }
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn write_err(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        self.err.extend_from_slice(bytes);
        Ok(())
    }

    fn uptime_ms(&self) -> u64 {
        self.clock_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(console: &mut ScriptedConsole, limit: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = console.read_line(&mut buf, limit).unwrap();
            if n == 0 {
                return lines;
            }
            lines.push(String::from_utf8(buf.clone()).unwrap());
        }
    }

    #[test]
    fn test_reads_line_by_line() {
        let mut console = ScriptedConsole::new("echo a\nretcode\nlast");
        assert_eq!(read_all(&mut console, 1024), ["echo a\n", "retcode\n", "last"]);
    }

    #[test]
    fn test_long_line_is_chunked() {
        let mut console = ScriptedConsole::new("abcdefgh\nxy\n");
        assert_eq!(read_all(&mut console, 4), ["abc", "def", "gh\n", "xy\n"]);
    }

    #[test]
    fn test_pushed_input_and_failing_reads() {
        let mut console = ScriptedConsole::new("a\n");
        assert_eq!(read_all(&mut console, 1024), ["a\n"]);

        console.push_input("b\n");
        console.fail_read(true);
        let mut buf = Vec::new();
        assert_eq!(console.read_line(&mut buf, 1024), Err(ConsoleError::Read));
        assert!(buf.is_empty());

        console.fail_read(false);
        assert_eq!(read_all(&mut console, 1024), ["b\n"]);
    }

    #[test]
    fn test_failing_stdout() {
        let mut console = ScriptedConsole::new("");
        console.print("ok\n").unwrap();
        console.fail_stdout(true);
        assert_eq!(console.print("lost\n"), Err(ConsoleError::Write));
        console.eprint("err\n").unwrap();
        assert_eq!(console.stdout(), "ok\n");
        assert_eq!(console.stderr(), "err\n");

        console.clear_output();
        assert_eq!(console.stdout(), "");
        assert_eq!(console.stderr(), "");
    }

    #[test]
    fn test_task_console_forwards() {
        let mut console = ScriptedConsole::new("");
        console.advance_clock(42);
        {
            let mut env = TaskConsole::new(&mut console);
            TaskEnv::print(&mut env, "from task\n").unwrap();
            assert_eq!(env.uptime_ms(), 42);
        }
        assert_eq!(console.stdout(), "from task\n");
    }
}
