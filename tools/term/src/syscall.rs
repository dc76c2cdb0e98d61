//! Syscall boundary.
//!
//! The minimal kernel entry points applications use for raw output and for
//! termination. Results follow the kernel convention: a non-negative byte
//! count on success, a negated errno on failure.

use alloc::string::String;
use core::fmt::{self, Write};

use crate::console::Console;

/// Standard output descriptor.
pub const STDOUT: i32 = 1;

/// Standard error descriptor.
pub const STDERR: i32 = 2;

/// I/O error.
pub const EIO: isize = 5;

/// Bad file descriptor.
pub const EBADF: isize = 9;

/// Size of the formatting buffer behind [`Syscalls::print_fmt`].
pub const PRINT_BUF_LEN: usize = 128;

/// Kernel entry points.
pub trait Syscalls {
    /// Writes `buf` to descriptor `fd`.
    fn write(&mut self, fd: i32, buf: &[u8]) -> isize;

    /// Requests termination of the calling program with `code`.
    fn exit(&mut self, code: i32);

    /// Writes `buf` to standard output.
    fn print(&mut self, buf: &[u8]) -> isize {
        self.write(STDOUT, buf)
    }

    /// Formats into a [`PRINT_BUF_LEN`]-byte buffer and prints it.
    ///
    /// Output past `PRINT_BUF_LEN - 1` bytes is cut off.
    fn print_fmt(&mut self, args: fmt::Arguments<'_>) -> isize {
        let mut buf = String::new();
        if buf.write_fmt(args).is_err() {
            return -EIO;
        }
        let bytes = buf.as_bytes();
        self.print(&bytes[..bytes.len().min(PRINT_BUF_LEN - 1)])
    }
}

/// Syscall boundary backed by the shell console.
///
/// An exit request is recorded in the session; the shell loop acts on it
/// once the current command returns.
pub struct SyscallGate<'a> {
    console: &'a mut dyn Console,
    exit: &'a mut Option<i32>,
}

impl<'a> SyscallGate<'a> {
    pub fn new(console: &'a mut dyn Console, exit: &'a mut Option<i32>) -> Self {
        Self { console, exit }
    }
}

impl Syscalls for SyscallGate<'_> {
    fn write(&mut self, fd: i32, buf: &[u8]) -> isize {
        let written = match fd {
            STDOUT => self.console.write_out(buf),
            STDERR => self.console.write_err(buf),
            _ => return -EBADF,
        };
        match written {
            Ok(()) => isize::try_from(buf.len()).unwrap_or(isize::MAX),
            Err(_) => -EIO,
        }
    }

    fn exit(&mut self, code: i32) {
        log::debug!("syscall: exit({})", code);
        *self.exit = Some(code);
    }
}
