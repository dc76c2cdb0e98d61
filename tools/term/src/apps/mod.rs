//! Built-in applications and the registry that names them.

use crate::console::Console;
use crate::session::{Session, ERROR};

mod basic;
mod pool;
mod sys;
mod task;

pub use basic::{Echo, Exit, Help, Retcode};
pub use pool::PoolTest;
pub use sys::{Seq, SyscallTest};
pub use task::{BurnTask, Entry, Sched, SleepTask, Spawn};

/// A built-in application.
pub trait App {
    /// Name the dispatcher matches against token 0.
    fn name(&self) -> &'static str;

    /// Short description.
    fn description(&self) -> &'static str;

    /// Usage string.
    fn usage(&self) -> &'static str;

    /// Runs the application.
    ///
    /// `argv[0]` is the application name. The result becomes the session's
    /// last return code.
    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32;
}

/// Registry entry.
pub type AppRef = &'static (dyn App + Sync);

/// Built-in applications in lookup order.
pub static BUILTIN: &[AppRef] = &[
    &Echo,
    &Retcode,
    &PoolTest,
    &SyscallTest,
    &Spawn,
    &Sched,
    &Seq,
    &Exit,
    &Help,
];

/// Ordered, fixed table of applications.
#[derive(Clone, Copy)]
pub struct Registry {
    apps: &'static [AppRef],
}

impl Registry {
    /// Creates a registry over a fixed table.
    pub const fn new(apps: &'static [AppRef]) -> Self {
        Self { apps }
    }

    /// The built-in applications.
    pub const fn builtin() -> Self {
        Self::new(BUILTIN)
    }

    /// Finds the first application called `name`.
    pub fn find(&self, name: &str) -> Option<AppRef> {
        self.apps.iter().copied().find(|app| app.name() == name)
    }

    /// Iterates over all applications in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = AppRef> + '_ {
        self.apps.iter().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reports a usage error on the error stream.
pub(crate) fn usage_error(app: &dyn App, console: &mut dyn Console) -> i32 {
    let _ = console.eprint(&alloc::format!("{}: usage: {}\n", app.name(), app.usage()));
    ERROR
}

/// Parses the decimal integer argument at `index`.
pub(crate) fn int_arg(argv: &[&str], index: usize) -> Option<i64> {
    argv.get(index).and_then(|arg| arg.parse().ok())
}
