//! Demonstration pool exercise.

use tickos_pool::SlotId;

use super::{int_arg, App};
use crate::console::Console;
use crate::session::{Session, OK};

/// Allocates and frees slots of the session's demonstration pool.
///
/// Outcomes are only printed; the result is always `OK`.
pub struct PoolTest;

impl App for PoolTest {
    fn name(&self) -> &'static str {
        "pooltest"
    }

    fn description(&self) -> &'static str {
        "Exercise the demonstration slot pool"
    }

    fn usage(&self) -> &'static str {
        "pooltest alloc | pooltest free <index>"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        match argv.get(1).copied() {
            Some("alloc") => {
                let index = match session.demo_pool.alloc() {
                    Ok(slot) => slot.index() as i64,
                    Err(_) => -1,
                };
                let _ = console.print(&alloc::format!("alloc {}\n", index));
            }
            Some("free") => {
                let Some(index) = int_arg(argv, 2) else {
                    let _ = console.eprint(&alloc::format!("pooltest: usage: {}\n", self.usage()));
                    return OK;
                };
                let _ = console.print(&alloc::format!("free {}\n", index));

                let freed = match usize::try_from(index) {
                    Ok(index) => session.demo_pool.free(SlotId::new(index)),
                    Err(_) => {
                        let _ = console
                            .eprint(&alloc::format!("pooltest: slot {} out of range\n", index));
                        return OK;
                    }
                };
                if let Err(err) = freed {
                    let _ = console.eprint(&alloc::format!("pooltest: {}\n", err));
                }
            }
            other => {
                let _ = console.eprint(&alloc::format!(
                    "Unknown argument for pooltest: {}\n",
                    other.unwrap_or("")
                ));
            }
        }

        OK
    }
}
