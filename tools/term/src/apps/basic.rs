//! Simple applications: echo, retcode, exit, help.

use alloc::string::String;

use super::{usage_error, App};
use crate::console::Console;
use crate::session::{Session, ERROR, OK};
use crate::syscall::Syscalls;

/// Echo command.
pub struct Echo;

impl App for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Print arguments"
    }

    fn usage(&self) -> &'static str {
        "echo [words...]"
    }

    fn run(&self, argv: &[&str], _session: &mut Session, console: &mut dyn Console) -> i32 {
        let words = argv.get(1..).unwrap_or_default();
        if !words.is_empty() {
            let mut line = words.join(" ");
            line.push('\n');
            let _ = console.print(&line);
        }
        i32::try_from(words.len()).unwrap_or(i32::MAX)
    }
}

/// Last-return-code query.
pub struct Retcode;

impl App for Retcode {
    fn name(&self) -> &'static str {
        "retcode"
    }

    fn description(&self) -> &'static str {
        "Print the return code of the previous command"
    }

    fn usage(&self) -> &'static str {
        "retcode"
    }

    fn run(&self, _argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let _ = console.print(&alloc::format!("{}\n", session.last_return_code()));
        OK
    }
}

/// Exit command.
pub struct Exit;

impl App for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn description(&self) -> &'static str {
        "Leave the shell"
    }

    fn usage(&self) -> &'static str {
        "exit [code]"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let code = match argv.get(1) {
            None => OK,
            Some(arg) => match arg.parse::<i32>() {
                Ok(code) => code,
                Err(_) => return usage_error(self, console),
            },
        };

        session.syscalls(console).exit(code);
        code
    }
}

/// Help command.
pub struct Help;

impl App for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Display help information"
    }

    fn usage(&self) -> &'static str {
        "help [command]"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let registry = session.registry();

        let Some(name) = argv.get(1) else {
            let mut text = String::from("Available commands:\n\n");
            for app in registry.iter() {
                text.push_str(&alloc::format!("{:<12}- {}\n", app.name(), app.description()));
            }
            let _ = console.print(&text);
            return OK;
        };

        match registry.find(name) {
            Some(app) => {
                let _ = console.print(&alloc::format!(
                    "{} - {}\n\nUsage: {}\n",
                    app.name(),
                    app.description(),
                    app.usage()
                ));
                OK
            }
            None => {
                let _ = console.print(&alloc::format!("No help available for '{}'\n", name));
                ERROR
            }
        }
    }
}
