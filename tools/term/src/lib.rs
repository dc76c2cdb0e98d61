//! # T-TERM: TickOS Command Shell
//!
//! T-TERM is the operator shell of the TickOS test harness. It reads command
//! lines, splits them into commands and tokens, and dispatches each command
//! to one of a fixed set of built-in applications.
//!
//! ## Pipeline
//!
//! ```text
//! Shell::run ─► split_commands ─► split_tokens ─► Shell::execute ─► App::run
//!                  (';' '\n')        (' ' '\t')      (registry)        │
//!                                                                      ▼
//!                                            ContextPool + Scheduler (app, sched)
//! ```
//!
//! ## Built-in Applications
//!
//! - `echo` - Print arguments
//! - `retcode` - Print the last return code
//! - `pooltest` - Exercise the demonstration slot pool
//! - `syscalltest` - Print through the syscall boundary
//! - `app` - Spawn a demonstration task
//! - `sched` - Run the scheduler for a number of ticks
//! - `seq` - Print line numbers through raw writes
//! - `exit` - Leave the shell
//! - `help` - Display help
//!
//! The library is `no_std` + `alloc`; the `std` feature adds the hosted
//! console, a stderr logger and the `tsh` binary.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod apps;
pub mod console;
pub mod context;
pub mod parse;
pub mod session;
pub mod shell;
pub mod syscall;

#[cfg(feature = "std")]
pub mod host;

pub use apps::{App, Registry};
pub use console::{Console, ConsoleError, ScriptedConsole};
pub use context::{AppContext, ContextLease, ContextPool, CONTEXT_SLOTS};
pub use parse::{split_commands, split_tokens, SplitError};
pub use session::{Session, ShellConfig, ERROR, OK};
pub use shell::{ExitStatus, Shell, ShellError};
pub use syscall::{SyscallGate, Syscalls};
