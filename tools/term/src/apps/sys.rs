//! Applications that go through the syscall boundary.

use super::{int_arg, usage_error, App};
use crate::console::Console;
use crate::session::{Session, OK};
use crate::syscall::{Syscalls, STDOUT};

/// Prints its argument through the syscall print primitive.
///
/// Returns the printed byte count without the trailing newline, or the
/// negative error of a failed write.
pub struct SyscallTest;

impl App for SyscallTest {
    fn name(&self) -> &'static str {
        "syscalltest"
    }

    fn description(&self) -> &'static str {
        "Print a word through the syscall boundary"
    }

    fn usage(&self) -> &'static str {
        "syscalltest <word>"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let Some(word) = argv.get(1) else {
            return usage_error(self, console);
        };

        let written = session
            .syscalls(console)
            .print_fmt(format_args!("{}\n", word));
        let result = if written < 0 { written } else { written - 1 };
        i32::try_from(result).unwrap_or(i32::MIN)
    }
}

/// Writes the numbers `1..=n`, one raw write per line.
pub struct Seq;

impl App for Seq {
    fn name(&self) -> &'static str {
        "seq"
    }

    fn description(&self) -> &'static str {
        "Print line numbers through raw writes"
    }

    fn usage(&self) -> &'static str {
        "seq <count>"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let Some(count) = int_arg(argv, 1) else {
            return usage_error(self, console);
        };

        let mut sys = session.syscalls(console);
        for i in 1..=count {
            let line = alloc::format!("{}\n", i);
            let written = sys.write(STDOUT, line.as_bytes());
            if written < 0 {
                return i32::try_from(written).unwrap_or(i32::MIN);
            }
        }
        OK
    }
}
