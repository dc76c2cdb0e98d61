//! Task spawning and scheduler control.
//!
//! `app` binds one of two demonstration bodies to a leased task context and
//! hands it to the scheduler; `sched` lends the console to the scheduler and
//! runs it for a tick budget.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use spin::Once;
use tickos_sched::{Step, Task, TaskCx, TaskEnv};

use super::{int_arg, usage_error, App};
use crate::console::{Console, TaskConsole};
use crate::context::ContextLease;
use crate::session::{Session, ERROR, OK};

/// Demonstration task bodies, by selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Spins forever, reporting every time it is scheduled
    Burn,
    /// Reports and sleeps a fixed number of times, then exits
    Sleep,
}

impl Entry {
    /// Maps the 1-based selector of `app` to a body.
    pub fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            1 => Some(Entry::Burn),
            2 => Some(Entry::Sleep),
            _ => None,
        }
    }
}

fn status_line(
    tag: &str,
    ctx: &ContextLease,
    cx: &TaskCx,
    env: &dyn TaskEnv,
    epoch: &Once<u64>,
) -> String {
    let now_ms = env.uptime_ms();
    let start = *epoch.call_once(|| now_ms);

    alloc::format!(
        "{:>16} id {} cnt {} time {} reftime {} ctx {}\n",
        tag,
        ctx.number(),
        ctx.cnt(),
        cx.now(),
        now_ms.saturating_sub(start),
        ctx.slot()
    )
}

/// Busy-loop body.
pub struct BurnTask {
    ctx: ContextLease,
    factor: u64,
    epoch: Arc<Once<u64>>,
}

impl BurnTask {
    pub fn new(ctx: ContextLease, factor: u64, epoch: Arc<Once<u64>>) -> Self {
        Self { ctx, factor, epoch }
    }
}

impl Task for BurnTask {
    fn name(&self) -> &str {
        "burn"
    }

    fn step(&mut self, cx: &mut TaskCx, env: &mut dyn TaskEnv) -> Step {
        let line = status_line("burn", &self.ctx, cx, env, &self.epoch);
        let _ = env.print(&line);

        let rounds = self.factor.saturating_mul(self.ctx.cnt().max(0) as u64);
        for i in 0..rounds {
            core::hint::black_box(i);
        }
        Step::Continue
    }
}

/// Periodic sleeping body.
///
/// Runs `cnt % 1000` rounds; each reports and then sleeps for
/// `cnt - cnt % 1000` ticks.
pub struct SleepTask {
    ctx: ContextLease,
    rounds_left: i64,
    period: u64,
    epoch: Arc<Once<u64>>,
}

impl SleepTask {
    pub fn new(ctx: ContextLease, epoch: Arc<Once<u64>>) -> Self {
        let cnt = ctx.cnt();
        let rounds = cnt % 1000;

        Self {
            ctx,
            rounds_left: rounds.max(0),
            period: u64::try_from(cnt - rounds).unwrap_or(0),
            epoch,
        }
    }
}

impl Task for SleepTask {
    fn name(&self) -> &str {
        "sleep"
    }

    fn step(&mut self, cx: &mut TaskCx, env: &mut dyn TaskEnv) -> Step {
        if self.rounds_left == 0 {
            return Step::Exit;
        }

        let line = status_line("sleep", &self.ctx, cx, env, &self.epoch);
        let _ = env.print(&line);

        self.rounds_left -= 1;
        Step::Sleep(self.period)
    }
}

/// Spawn command.
pub struct Spawn;

impl App for Spawn {
    fn name(&self) -> &'static str {
        "app"
    }

    fn description(&self) -> &'static str {
        "Spawn a demonstration task (1 = burn, 2 = sleep)"
    }

    fn usage(&self) -> &'static str {
        "app <1|2> <count> <quota>"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let (Some(selector), Some(cnt), Some(quota)) =
            (int_arg(argv, 1), int_arg(argv, 2), int_arg(argv, 3))
        else {
            return usage_error(self, console);
        };

        let Some(entry) = Entry::from_selector(selector) else {
            let _ = console.eprint(&alloc::format!("app: unknown entry {}\n", selector));
            return ERROR;
        };

        let ctx = match session.contexts.lease(cnt) {
            Ok(ctx) => ctx,
            Err(err) => {
                let _ = console.eprint(&alloc::format!("app: cannot allocate context: {}\n", err));
                return ERROR;
            }
        };
        let slot = ctx.slot();

        let epoch = session.task_epoch.clone();
        let body: Box<dyn Task> = match entry {
            Entry::Burn => Box::new(BurnTask::new(ctx, session.config.burn_factor, epoch)),
            Entry::Sleep => Box::new(SleepTask::new(ctx, epoch)),
        };

        // A refused body is dropped here, which releases its context.
        match session.scheduler.new_task(body, quota) {
            Ok(id) => {
                log::debug!("app: task {} runs {:?} on context {}", id, entry, slot);
                OK
            }
            Err(err) => {
                let _ = console.eprint(&alloc::format!("app: {}\n", err));
                ERROR
            }
        }
    }
}

/// Scheduler run command.
pub struct Sched;

impl App for Sched {
    fn name(&self) -> &'static str {
        "sched"
    }

    fn description(&self) -> &'static str {
        "Run the scheduler for a number of ticks"
    }

    fn usage(&self) -> &'static str {
        "sched <ticks>"
    }

    fn run(&self, argv: &[&str], session: &mut Session, console: &mut dyn Console) -> i32 {
        let Some(budget) = int_arg(argv, 1).and_then(|t| u64::try_from(t).ok()) else {
            return usage_error(self, console);
        };

        let report = session.scheduler.run(budget, &mut TaskConsole::new(console));
        log::debug!(
            "sched: {} of {} ticks used, {} tasks left",
            report.ticks,
            budget,
            session.scheduler.task_count()
        );
        OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::context::CONTEXT_SLOTS;
    use crate::session::ShellConfig;
    use alloc::vec::Vec;
    use tickos_pool::SlotId;

    fn session() -> Session {
        Session::new(ShellConfig {
            burn_factor: 1,
            ..ShellConfig::default()
        })
    }

    fn exec(app: &dyn App, argv: &[&str], session: &mut Session) -> (i32, ScriptedConsole) {
        let mut console = ScriptedConsole::new("");
        let rc = app.run(argv, session, &mut console);
        (rc, console)
    }

    #[test]
    fn test_spawn_leases_context_and_creates_task() {
        let mut session = session();
        let (rc, _) = exec(&Spawn, &["app", "1", "5000", "3"], &mut session);
        assert_eq!(rc, OK);

        assert_eq!(session.contexts.in_use(), 1);
        assert_eq!(session.contexts.get(SlotId(0)).map(|c| c.cnt), Ok(5000));

        let tasks = session.scheduler.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].quota, 3);
    }

    #[test]
    fn test_sched_runs_budget() {
        let mut session = session();
        exec(&Spawn, &["app", "1", "5", "3"], &mut session);
        let (rc, console) = exec(&Sched, &["sched", "10"], &mut session);
        assert_eq!(rc, OK);
        assert_eq!(session.scheduler.current_time(), 10);

        let out = console.stdout();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "            burn id 1 cnt 5 time 0 reftime 0 ctx 0");
        assert!(lines[9].contains(" time 9 "));
    }

    #[test]
    fn test_burn_tasks_share_cpu_by_quota() {
        let mut session = session();
        exec(&Spawn, &["app", "1", "1", "2"], &mut session);
        exec(&Spawn, &["app", "1", "2", "1"], &mut session);
        let (_, console) = exec(&Sched, &["sched", "6"], &mut session);

        let ids: Vec<&str> = console
            .stdout()
            .lines()
            .map(|l| if l.contains(" id 1 ") { "1" } else { "2" })
            .collect();
        assert_eq!(ids, ["1", "1", "2", "1", "1", "2"]);
    }

    #[test]
    fn test_sleep_task_rounds_and_period() {
        let mut session = session();
        // 2 rounds, each sleeping 1000 ticks.
        exec(&Spawn, &["app", "2", "1002", "1"], &mut session);

        let (_, console) = exec(&Sched, &["sched", "3000"], &mut session);
        let out = console.stdout();
        let times: Vec<&str> = out
            .lines()
            .map(|l| l.split(" time ").nth(1).and_then(|r| r.split(' ').next()).unwrap())
            .collect();
        assert_eq!(times, ["0", "1001"]);
        assert!(out.lines().all(|l| l.trim_start().starts_with("sleep id 1 cnt 1002")));

        // The task exits once it wakes from its last sleep, ending the run.
        assert_eq!(session.scheduler.current_time(), 2003);
        assert_eq!(session.scheduler.task_count(), 0);
        assert_eq!(session.contexts.in_use(), 0);
    }

    #[test]
    fn test_sleep_task_without_rounds_exits_at_once() {
        let mut session = session();
        exec(&Spawn, &["app", "2", "5000", "3"], &mut session);
        let (_, console) = exec(&Sched, &["sched", "10"], &mut session);
        assert_eq!(console.stdout(), "");
        assert_eq!(session.scheduler.current_time(), 1);
        assert_eq!(session.contexts.in_use(), 0);
    }

    #[test]
    fn test_spawn_reports_exhaustion() {
        let mut session = session();
        for _ in 0..CONTEXT_SLOTS {
            assert_eq!(exec(&Spawn, &["app", "1", "1", "1"], &mut session).0, OK);
        }

        let (rc, console) = exec(&Spawn, &["app", "1", "1", "1"], &mut session);
        assert_eq!(rc, ERROR);
        assert_eq!(console.stderr(), "app: cannot allocate context: no free slot\n");
        assert_eq!(session.scheduler.task_count(), CONTEXT_SLOTS);
    }

    #[test]
    fn test_spawn_rejections_release_context() {
        let mut session = session();

        let (rc, console) = exec(&Spawn, &["app", "3", "1", "1"], &mut session);
        assert_eq!(rc, ERROR);
        assert_eq!(console.stderr(), "app: unknown entry 3\n");

        let (rc, console) = exec(&Spawn, &["app", "1", "1", "0"], &mut session);
        assert_eq!(rc, ERROR);
        assert_eq!(console.stderr(), "app: invalid quota 0\n");

        assert_eq!(session.contexts.in_use(), 0);
        assert_eq!(session.scheduler.task_count(), 0);
    }

    #[test]
    fn test_usage_errors() {
        let mut session = session();
        let (rc, console) = exec(&Spawn, &["app", "1", "2"], &mut session);
        assert_eq!(rc, ERROR);
        assert_eq!(console.stderr(), "app: usage: app <1|2> <count> <quota>\n");

        let (rc, console) = exec(&Sched, &["sched", "-1"], &mut session);
        assert_eq!(rc, ERROR);
        assert_eq!(console.stderr(), "sched: usage: sched <ticks>\n");
    }

    #[test]
    fn test_reftime_counts_from_first_status_line() {
        let mut session = session();
        exec(&Spawn, &["app", "1", "1", "1"], &mut session);

        let mut console = ScriptedConsole::new("");
        console.advance_clock(500);
        Sched.run(&["sched", "1"], &mut session, &mut console);
        console.advance_clock(250);
        Sched.run(&["sched", "1"], &mut session, &mut console);

        let out = console.stdout();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains(" reftime 0 "));
        assert!(lines[1].contains(" reftime 250 "));
    }
}
