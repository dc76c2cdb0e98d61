//! Shell loop and command dispatch.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::apps::Registry;
use crate::console::{Console, ConsoleError};
use crate::parse::{split_commands, split_tokens, SplitError};
use crate::session::{Session, ShellConfig};

/// Fatal shell failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellError {
    /// A line or command could not be split
    Split(SplitError),
    /// Reading input failed
    Input(ConsoleError),
    /// Reporting an unknown command failed
    Io(ConsoleError),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Split(err) => write!(f, "{}", err),
            ShellError::Input(err) => write!(f, "input: {}", err),
            ShellError::Io(err) => write!(f, "output: {}", err),
        }
    }
}

impl From<SplitError> for ShellError {
    fn from(err: SplitError) -> Self {
        ShellError::Split(err)
    }
}

/// How a shell run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Input ran out
    EndOfInput,
    /// A command asked to exit with this code
    Exited(i32),
}

impl ExitStatus {
    /// Process exit code for this status.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::EndOfInput => 0,
            ExitStatus::Exited(code) => *code,
        }
    }
}

/// The T-TERM shell.
pub struct Shell<C: Console> {
    session: Session,
    console: C,
}

impl<C: Console> Shell<C> {
    /// Creates a shell over the built-in applications.
    pub fn new(console: C, config: ShellConfig) -> Self {
        Self::with_registry(console, config, Registry::builtin())
    }

    /// Creates a shell over a custom application table.
    pub fn with_registry(console: C, config: ShellConfig, registry: Registry) -> Self {
        Self {
            session: Session::with_registry(config, registry),
            console,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Dispatches one tokenized command.
    ///
    /// A known command always succeeds; its result goes to the session's
    /// last return code. An unknown command is reported and leaves the code
    /// as it was.
    pub fn execute(&mut self, tokens: &[&str]) -> Result<(), ShellError> {
        let Some(&name) = tokens.first() else {
            return Ok(());
        };

        match self.session.registry().find(name) {
            Some(app) => {
                log::debug!("shell: {} ({} args)", name, tokens.len() - 1);
                let rc = app.run(tokens, &mut self.session, &mut self.console);
                self.session.set_last_return_code(rc);
                Ok(())
            }
            None => {
                log::debug!("shell: unknown command {:?}", name);
                let message = alloc::format!("Unknown command: {}\n", name);
                if let Err(err) = self.console.print(&message) {
                    let _ = self.console.eprint("Cannot print to stdout\n");
                    return Err(ShellError::Io(err));
                }
                Ok(())
            }
        }
    }

    /// Runs every command of one input line.
    ///
    /// Stops early once a command has requested exit.
    pub fn execute_line(&mut self, line: &str) -> Result<(), ShellError> {
        let commands = self.report(split_commands(line))?;

        for command in commands {
            let tokens = self.report(split_tokens(command))?;
            self.execute(&tokens)?;

            if self.session.exit_request().is_some() {
                break;
            }
        }
        Ok(())
    }

    /// Reads and executes lines until input ends or a command exits.
    pub fn run(&mut self) -> Result<ExitStatus, ShellError> {
        let limit = self.session.config.max_line_len;
        let mut buf = Vec::with_capacity(limit);

        loop {
            buf.clear();
            let read = self
                .console
                .read_line(&mut buf, limit)
                .map_err(ShellError::Input)?;
            if read == 0 {
                log::debug!("shell: end of input");
                return Ok(ExitStatus::EndOfInput);
            }

            let line = String::from_utf8_lossy(&buf);
            self.execute_line(&line)?;

            if let Some(code) = self.session.exit_request() {
                log::debug!("shell: exit {}", code);
                return Ok(ExitStatus::Exited(code));
            }
        }
    }

    fn report<'a>(
        &mut self,
        split: Result<Vec<&'a str>, SplitError>,
    ) -> Result<Vec<&'a str>, ShellError> {
        split.map_err(|err| {
            let _ = self.console.eprint(&alloc::format!("{}\n", err));
            ShellError::Split(err)
        })
    }
}
